//! Per-scope fan-out of encoded snapshot frames.
//!
//! Uses tokio broadcast channels: one send reaches every subscriber of the
//! scope. Each subscriber buffers up to `capacity` frames; a subscriber
//! that falls further behind skips ahead to newer frames, which is safe
//! because every frame carries the full scope.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use forum_core::Scope;

/// Statistics for monitoring room health.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    pub frames_sent: u64,
    /// Frames published while nobody was subscribed.
    pub frames_unobserved: u64,
    pub subscribers: usize,
}

/// Broadcast channel for a single scope.
pub struct ScopeRoom {
    sender: broadcast::Sender<Arc<Vec<u8>>>,
    capacity: usize,
    frames_sent: AtomicU64,
    frames_unobserved: AtomicU64,
}

impl ScopeRoom {
    /// `capacity` is the number of frames buffered per subscriber before
    /// it starts lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            capacity,
            frames_sent: AtomicU64::new(0),
            frames_unobserved: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Vec<u8>>> {
        self.sender.subscribe()
    }

    /// Publish a pre-encoded frame. Returns the number of subscribers
    /// that will see it.
    pub fn publish(&self, encoded: Arc<Vec<u8>>) -> usize {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(encoded) {
            Ok(count) => count,
            Err(_) => {
                self.frames_unobserved.fetch_add(1, Ordering::Relaxed);
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_unobserved: self.frames_unobserved.load(Ordering::Relaxed),
            subscribers: self.subscriber_count(),
        }
    }
}

/// Maps scopes to their rooms.
pub struct RoomManager {
    rooms: RwLock<HashMap<Scope, Arc<ScopeRoom>>>,
    default_capacity: usize,
}

impl RoomManager {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            default_capacity,
        }
    }

    /// Join the room for `scope`, creating it if needed.
    ///
    /// The receiver is taken while the map lock is held, so
    /// [`RoomManager::remove_if_idle`] never drops a room someone is joining.
    pub async fn subscribe(
        &self,
        scope: &Scope,
    ) -> (Arc<ScopeRoom>, broadcast::Receiver<Arc<Vec<u8>>>) {
        // Fast path: read lock
        {
            let rooms = self.rooms.read().await;
            if let Some(room) = rooms.get(scope) {
                return (room.clone(), room.subscribe());
            }
        }

        let mut rooms = self.rooms.write().await;
        let room = rooms
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(ScopeRoom::new(self.default_capacity)))
            .clone();
        let rx = room.subscribe();
        (room, rx)
    }

    /// Room for `scope` if one exists. Never creates.
    pub async fn get(&self, scope: &Scope) -> Option<Arc<ScopeRoom>> {
        self.rooms.read().await.get(scope).cloned()
    }

    /// Drop the room if nobody is subscribed.
    pub async fn remove_if_idle(&self, scope: &Scope) -> bool {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get(scope) {
            if room.subscriber_count() == 0 {
                rooms.remove(scope);
                return true;
            }
        }
        false
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn active_scopes(&self) -> Vec<Scope> {
        self.rooms.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_fans_out() {
        let room = ScopeRoom::new(16);
        let mut rx1 = room.subscribe();
        let mut rx2 = room.subscribe();

        let count = room.publish(Arc::new(vec![1, 2, 3]));
        assert_eq!(count, 2);

        assert_eq!(*rx1.recv().await.unwrap(), vec![1, 2, 3]);
        assert_eq!(*rx2.recv().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let room = ScopeRoom::new(16);
        assert_eq!(room.publish(Arc::new(vec![9])), 0);

        let stats = room.stats();
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.frames_unobserved, 1);
        assert_eq!(stats.subscribers, 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_ahead() {
        let room = ScopeRoom::new(2);
        let mut rx = room.subscribe();
        for i in 0..5u8 {
            room.publish(Arc::new(vec![i]));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        // After the lag notice only the newest frames remain.
        assert_eq!(*rx.recv().await.unwrap(), vec![3]);
        assert_eq!(*rx.recv().await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_room_manager_subscribe_reuses_room() {
        let manager = RoomManager::new(16);
        let (room1, _rx1) = manager.subscribe(&Scope::Questions).await;
        let (room2, _rx2) = manager.subscribe(&Scope::Questions).await;

        assert!(Arc::ptr_eq(&room1, &room2));
        assert_eq!(room1.subscriber_count(), 2);
        assert_eq!(manager.room_count().await, 1);
        assert!(manager.get(&Scope::answers("q1")).await.is_none());
    }

    #[tokio::test]
    async fn test_room_manager_scopes_isolated() {
        let manager = RoomManager::new(16);
        let (questions, _q_rx) = manager.subscribe(&Scope::Questions).await;
        let (_answers, mut rx) = manager.subscribe(&Scope::answers("q1")).await;

        questions.publish(Arc::new(vec![1]));
        assert!(rx.try_recv().is_err());

        let scopes = manager.active_scopes().await;
        assert_eq!(scopes.len(), 2);
        assert!(scopes.contains(&Scope::answers("q1")));
    }

    #[tokio::test]
    async fn test_room_manager_cleanup() {
        let manager = RoomManager::new(16);
        let scope = Scope::comments("q1", "a1");
        let (_room, rx) = manager.subscribe(&scope).await;

        assert!(!manager.remove_if_idle(&scope).await);
        drop(rx);
        assert!(manager.remove_if_idle(&scope).await);
        assert_eq!(manager.room_count().await, 0);
    }
}
