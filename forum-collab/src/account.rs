//! Account flows on top of the auth collaborator.

use forum_core::validation::{validate_credentials, validate_password_change};
use forum_core::{ForumError, User};

use crate::backend::{AuthProvider, IdentityProvider};
use crate::error::BackendError;

pub struct AccountController<A> {
    auth: A,
}

fn convert(action: &str, e: BackendError) -> ForumError {
    log::warn!("{action} failed: {e}");
    e.into()
}

impl<A: AuthProvider> AccountController<A> {
    pub fn new(auth: A) -> Self {
        Self { auth }
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// Register a new account. Registration does not leave the user
    /// signed in; they sign in afterwards.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, ForumError> {
        validate_credentials(email, password)?;
        let user = self
            .auth
            .sign_up(email, password)
            .await
            .map_err(|e| convert("Sign-up", e))?;
        self.auth
            .sign_out()
            .await
            .map_err(|e| convert("Sign-out after sign-up", e))?;
        log::info!("Registered {}", user.email);
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, ForumError> {
        validate_credentials(email, password)?;
        let user = self
            .auth
            .sign_in(email, password)
            .await
            .map_err(|e| convert("Sign-in", e))?;
        log::info!("Signed in as {}", user.email);
        Ok(user)
    }

    /// Popup sign-in through `provider`. Unlike [`Self::sign_up`], a first
    /// sign-in both creates the account and leaves the user signed in.
    pub async fn sign_in_with_provider(
        &self,
        provider: IdentityProvider,
    ) -> Result<User, ForumError> {
        let user = self
            .auth
            .sign_in_with_provider(provider)
            .await
            .map_err(|e| convert("Provider sign-in", e))?;
        log::info!("Signed in as {} through {provider}", user.email);
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), ForumError> {
        self.auth.sign_out().await.map_err(|e| convert("Sign-out", e))
    }

    /// Re-authenticate with `old_password`, then switch to `new_password`.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), ForumError> {
        validate_password_change(old_password, new_password, confirm_password)?;
        let user = self.auth.current_user().ok_or(ForumError::Unauthorized)?;

        self.auth
            .reauthenticate(&user.email, old_password)
            .await
            .map_err(|e| convert("Re-authentication", e))?;
        self.auth
            .update_password(new_password)
            .await
            .map_err(|e| convert("Password update", e))?;
        log::info!("Password changed for {}", user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForumConfig;
    use crate::memory::MemoryBackend;
    use forum_core::{Field, ValidationError};

    fn accounts() -> AccountController<crate::memory::MemoryClient> {
        AccountController::new(MemoryBackend::new(ForumConfig::for_testing()).connect())
    }

    #[tokio::test]
    async fn test_sign_up_leaves_user_signed_out() {
        let accounts = accounts();
        accounts.sign_up("gail@example.com", "hunter22").await.unwrap();
        assert!(accounts.auth().current_user().is_none());

        let user = accounts.sign_in("gail@example.com", "hunter22").await.unwrap();
        assert_eq!(accounts.auth().current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_blank_credentials() {
        let accounts = accounts();
        assert_eq!(
            accounts.sign_in("  ", "pw").await,
            Err(ForumError::Validation(ValidationError::Empty {
                field: Field::Email
            }))
        );
        assert_eq!(
            accounts.sign_up("hal@example.com", "").await,
            Err(ForumError::Validation(ValidationError::Empty {
                field: Field::Password
            }))
        );
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let accounts = accounts();
        accounts.sign_up("ivy@example.com", "hunter22").await.unwrap();
        assert!(matches!(
            accounts.sign_in("ivy@example.com", "hunter23").await,
            Err(ForumError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let accounts = accounts();
        accounts.sign_up("jo@example.com", "hunter22").await.unwrap();

        assert_eq!(
            accounts.change_password("hunter22", "new-secret", "new-secret").await,
            Err(ForumError::Unauthorized)
        );

        accounts.sign_in("jo@example.com", "hunter22").await.unwrap();
        assert_eq!(
            accounts.change_password("", "a", "a").await,
            Err(ForumError::Validation(ValidationError::MissingFields))
        );
        assert_eq!(
            accounts.change_password("hunter22", "new-secret", "other").await,
            Err(ForumError::Validation(ValidationError::PasswordMismatch))
        );
        assert!(matches!(
            accounts.change_password("wrong", "new-secret", "new-secret").await,
            Err(ForumError::Rejected(_))
        ));

        accounts
            .change_password("hunter22", "new-secret", "new-secret")
            .await
            .unwrap();
        accounts.sign_out().await.unwrap();
        assert!(accounts.sign_in("jo@example.com", "new-secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_provider_sign_in() {
        let backend = MemoryBackend::new(ForumConfig::for_testing());
        let accounts = AccountController::new(
            backend
                .connect()
                .with_identity(IdentityProvider::Google, "kai@gmail.com"),
        );

        let user = accounts
            .sign_in_with_provider(IdentityProvider::Google)
            .await
            .unwrap();
        assert_eq!(user.email, "kai@gmail.com");
        assert_eq!(accounts.auth().current_user(), Some(user.clone()));

        // Same identity from another tab lands on the same account.
        let other_tab = AccountController::new(
            backend
                .connect()
                .with_identity(IdentityProvider::Google, "kai@gmail.com"),
        );
        let again = other_tab
            .sign_in_with_provider(IdentityProvider::Google)
            .await
            .unwrap();
        assert_eq!(again.uid, user.uid);

        // Email sign-up for a provider-created account is refused.
        assert!(matches!(
            accounts.sign_up("kai@gmail.com", "hunter22").await,
            Err(ForumError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_sign_in_offline() {
        let backend = MemoryBackend::new(ForumConfig::for_testing());
        let accounts = AccountController::new(
            backend
                .connect()
                .with_identity(IdentityProvider::Google, "lee@gmail.com"),
        );
        backend.set_available(false);

        let result = accounts.sign_in_with_provider(IdentityProvider::Google).await;
        assert!(result.unwrap_err().is_transient());
        assert!(accounts.auth().current_user().is_none());
    }
}
