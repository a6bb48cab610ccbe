//! Composition root wiring the session into the transport and the router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, AuthApi, NotificationLog, REQUEST_TIMEOUT_SECS};
use crate::auth::{AuthError, Credentials, FileStorage, Session, SessionStore, Storage};
use crate::config::Config;
use crate::router::{NavigationGuard, Redirect, RouteTable, Router};

/// One console client: a single session shared by the transport (token
/// reads, forced logout) and the router (guard checks).
pub struct Console {
    pub config: Config,
    pub session: Arc<Session>,
    pub router: Arc<Router>,
    pub api: ApiClient,
    pub store: SessionStore<AuthApi>,
    pub notifications: Arc<NotificationLog>,
}

impl Console {
    /// Console with its session persisted in the user's cache directory
    pub fn new(config: Config) -> Result<Self> {
        let storage = FileStorage::in_dir(&config.cache_dir()?);
        debug!(path = %storage.path().display(), "Using session storage");
        Self::with_storage(config, Arc::new(storage))
    }

    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let session = Arc::new(Session::hydrate(storage.clone()));

        let routes = RouteTable::console();
        let login_path = routes.login_path().to_string();
        let router = Arc::new(Router::new(NavigationGuard::new(storage, routes)));

        let notifications = Arc::new(NotificationLog::new());
        let api = ApiClient::new(
            &config.server_url,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            session.clone(),
            router.clone(),
            notifications.clone(),
        )?
        .with_login_path(login_path);

        let store = SessionStore::new(session.clone(), AuthApi::new(api.clone()));

        Ok(Self {
            config,
            session,
            router,
            api,
            store,
            notifications,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.is_logged_in()
    }

    pub fn username(&self) -> String {
        self.store.username()
    }

    /// Log in, then move to the landing route
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        self.store.login(credentials).await?;
        let landing = self.router.guard().routes().landing_path().to_string();
        if let Err(e) = self.router.navigate(&landing) {
            warn!(error = %e, "Failed to open landing route after login");
        }
        Ok(())
    }

    /// Log out, then move to the login route. Never fails.
    pub async fn logout(&self) {
        self.store.logout().await;
        let login = self.router.guard().routes().login_path().to_string();
        self.router.redirect(&login);
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        self.store
            .backend()
            .change_password(old_password, new_password)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::{MemoryStorage, TOKEN_KEY, USERNAME_KEY};

    #[test]
    fn test_hydrates_shared_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "T").unwrap();
        storage.set(USERNAME_KEY, "admin").unwrap();

        let console = Console::with_storage(Config::default(), storage).unwrap();

        assert!(console.is_logged_in());
        assert_eq!(console.username(), "admin");
        assert!(Arc::ptr_eq(&console.session, console.api.session()));
        assert!(Arc::ptr_eq(&console.session, console.store.session()));
        assert_eq!(console.router.navigate("/").unwrap().path, "/dashboard");
    }

    #[tokio::test]
    async fn test_logout_without_session_lands_on_login() {
        let storage = Arc::new(MemoryStorage::new());
        let console = Console::with_storage(Config::default(), storage).unwrap();

        console.logout().await;

        assert!(!console.is_logged_in());
        assert_eq!(console.router.current().unwrap().path, "/login");
        assert!(console.notifications.is_empty());
    }
}
