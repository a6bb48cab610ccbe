use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::storage::StorageError;
use super::{Credentials, Session};
use crate::api::{ApiError, LoginResponse};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username and password required")]
    MissingCredentials,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Server returned an empty token")]
    EmptyToken,

    #[error("Failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Text for the login form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Api(ApiError::Unauthorized(_)) => "Invalid username or password".to_string(),
            AuthError::Api(ApiError::NetworkError(e)) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            AuthError::Api(ApiError::NetworkError(_)) => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            other => format!("Login failed: {}", other),
        }
    }
}

/// Server side of login and logout.
pub trait AuthBackend: Send + Sync {
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// The two session mutations, on top of the shared [`Session`].
///
/// Login and logout are serialized through one mutex, so a double-submitted
/// form cannot interleave two writes to storage. The transport's forced
/// logout does not go through here.
pub struct SessionStore<B> {
    session: Arc<Session>,
    backend: B,
    mutations: Mutex<()>,
}

impl<B: AuthBackend> SessionStore<B> {
    pub fn new(session: Arc<Session>, backend: B) -> Self {
        Self {
            session,
            backend,
            mutations: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn username(&self) -> String {
        self.session.username()
    }

    /// Authenticate and persist the new session.
    ///
    /// Any failure leaves the session exactly as it was.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if !credentials.is_complete() {
            return Err(AuthError::MissingCredentials);
        }

        let _guard = self.mutations.lock().await;

        let response = match self.backend.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, username = %credentials.username, "Login failed");
                return Err(e.into());
            }
        };

        if response.token.is_empty() {
            error!(username = %credentials.username, "Login response carried no token");
            return Err(AuthError::EmptyToken);
        }

        let username = if response.username.is_empty() {
            credentials.username.clone()
        } else {
            response.username
        };

        self.session.establish(response.token, username.clone())?;
        info!(%username, "Login successful");
        Ok(())
    }

    /// End the session. Local state is always cleared, whatever the server
    /// says.
    pub async fn logout(&self) {
        let _guard = self.mutations.lock().await;

        // Without a token the server would only answer 401
        if self.session.is_logged_in() {
            if let Err(e) = self.backend.logout().await {
                warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }

        self.session.clear();
        info!("Logged out");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;

    use super::*;
    use crate::auth::storage::{MemoryStorage, Storage, TOKEN_KEY, USERNAME_KEY};

    enum LoginScript {
        Accept(&'static str, &'static str),
        Reject(StatusCode, &'static str),
    }

    struct FakeBackend {
        login: LoginScript,
        logout_fails: bool,
        logins: AtomicUsize,
        logouts: AtomicUsize,
    }

    impl FakeBackend {
        fn new(login: LoginScript) -> Self {
            Self {
                login,
                logout_fails: false,
                logins: AtomicUsize::new(0),
                logouts: AtomicUsize::new(0),
            }
        }
    }

    impl AuthBackend for FakeBackend {
        async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, ApiError> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            match self.login {
                LoginScript::Accept(token, username) => Ok(LoginResponse {
                    token: token.to_string(),
                    username: username.to_string(),
                }),
                LoginScript::Reject(status, body) => Err(ApiError::from_status(status, body)),
            }
        }

        async fn logout(&self) -> Result<(), ApiError> {
            self.logouts.fetch_add(1, Ordering::SeqCst);
            if self.logout_fails {
                Err(ApiError::from_status(StatusCode::BAD_GATEWAY, ""))
            } else {
                Ok(())
            }
        }
    }

    fn make_store(backend: FakeBackend) -> (SessionStore<FakeBackend>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let session = Arc::new(Session::hydrate(storage.clone()));
        (SessionStore::new(session, backend), storage)
    }

    fn assert_consistent(store: &SessionStore<FakeBackend>, storage: &MemoryStorage) {
        let data = store.session().snapshot();
        assert_eq!(data.token.is_empty(), data.username.is_empty());
        let persisted_token = storage.get(TOKEN_KEY).unwrap().unwrap_or_default();
        let persisted_username = storage.get(USERNAME_KEY).unwrap().unwrap_or_default();
        assert_eq!(persisted_token, data.token);
        assert_eq!(persisted_username, data.username);
    }

    #[tokio::test]
    async fn test_login_sets_and_persists_session() {
        let (store, storage) = make_store(FakeBackend::new(LoginScript::Accept("T", "admin")));

        store.login(&Credentials::new("admin", "secret")).await.unwrap();

        assert!(store.is_logged_in());
        assert_eq!(store.username(), "admin");
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("T"));
        assert_consistent(&store, &storage);
    }

    #[tokio::test]
    async fn test_login_rejected_leaves_state_unchanged() {
        let (store, storage) = make_store(FakeBackend::new(LoginScript::Reject(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"invalid credentials"}"#,
        )));

        let err = store
            .login(&Credentials::new("admin", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AuthError::Api(ApiError::Unauthorized(Some(ref m))) if m == "invalid credentials"
        ));
        assert_eq!(err.user_message(), "Invalid username or password");
        assert!(!store.is_logged_in());
        assert_consistent(&store, &storage);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (store, _storage) = make_store(FakeBackend::new(LoginScript::Accept("T", "admin")));

        let err = store.login(&Credentials::new("admin", "")).await.unwrap_err();

        assert!(matches!(err, AuthError::MissingCredentials));
        assert_eq!(store.backend().logins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_login_with_empty_token_is_rejected() {
        let (store, storage) = make_store(FakeBackend::new(LoginScript::Accept("", "admin")));

        let err = store.login(&Credentials::new("admin", "secret")).await.unwrap_err();

        assert!(matches!(err, AuthError::EmptyToken));
        assert!(!store.is_logged_in());
        assert_consistent(&store, &storage);
    }

    #[tokio::test]
    async fn test_login_falls_back_to_submitted_username() {
        let (store, storage) = make_store(FakeBackend::new(LoginScript::Accept("T", "")));

        store.login(&Credentials::new("admin", "secret")).await.unwrap();

        assert_eq!(store.username(), "admin");
        assert_consistent(&store, &storage);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_fails() {
        let mut backend = FakeBackend::new(LoginScript::Accept("T", "admin"));
        backend.logout_fails = true;
        let (store, storage) = make_store(backend);
        store.login(&Credentials::new("admin", "secret")).await.unwrap();

        store.logout().await;

        assert!(!store.is_logged_in());
        assert_eq!(store.backend().logouts.load(Ordering::SeqCst), 1);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USERNAME_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_when_logged_out_is_noop() {
        let (store, storage) = make_store(FakeBackend::new(LoginScript::Accept("T", "admin")));

        store.logout().await;
        store.logout().await;

        assert!(!store.is_logged_in());
        assert_eq!(store.backend().logouts.load(Ordering::SeqCst), 0);
        assert_consistent(&store, &storage);
    }

    #[tokio::test]
    async fn test_concurrent_login_logout_ends_consistent() {
        let (store, storage) = make_store(FakeBackend::new(LoginScript::Accept("T", "admin")));
        let credentials = Credentials::new("admin", "secret");

        let (login, ()) = tokio::join!(store.login(&credentials), store.logout());

        assert!(login.is_ok());
        assert_consistent(&store, &storage);
    }
}
