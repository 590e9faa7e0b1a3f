//! Client and in-memory backend configuration.

use std::time::Duration;

use forum_core::{ANSWER_PREVIEW_CHARS, COMMENT_PREVIEW_CHARS, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumConfig {
    /// Per-scope broadcast buffer (frames) in the in-memory backend
    pub broadcast_capacity: usize,
    /// Feed page size and "load more" increment
    pub page_size: usize,
    pub answer_preview_chars: usize,
    pub comment_preview_chars: usize,
    /// Delay before the in-memory backend pushes a snapshot after a write
    pub simulated_latency_ms: u64,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 256,
            page_size: DEFAULT_PAGE_SIZE,
            answer_preview_chars: ANSWER_PREVIEW_CHARS,
            comment_preview_chars: COMMENT_PREVIEW_CHARS,
            simulated_latency_ms: 0,
        }
    }
}

impl ForumConfig {
    /// Small buffers, no latency.
    pub fn for_testing() -> Self {
        Self {
            broadcast_capacity: 16,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency_ms = latency.as_millis() as u64;
        self
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}
