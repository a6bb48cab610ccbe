use std::sync::Arc;

use super::routes::{normalize, RouteTable};
use crate::auth::Storage;

/// What the guard decided about one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Redirect(String),
}

/// Pre-navigation check.
///
/// Holds no session state of its own: the persisted token is read again on
/// every check, so a forced logout by the transport is seen immediately.
pub struct NavigationGuard {
    storage: Arc<dyn Storage>,
    routes: RouteTable,
}

impl NavigationGuard {
    pub fn new(storage: Arc<dyn Storage>, routes: RouteTable) -> Self {
        Self { storage, routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn check(&self, target: &str) -> Decision {
        let path = normalize(target);
        let has_token = self.storage.has_token();

        if self.routes.requires_auth(&path) && !has_token {
            Decision::Redirect(self.routes.login_path().to_string())
        } else if path == self.routes.login_path() && has_token {
            Decision::Redirect(self.routes.landing_path().to_string())
        } else {
            Decision::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::{MemoryStorage, TOKEN_KEY};

    fn make_guard(token: Option<&str>) -> (NavigationGuard, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(token) = token {
            storage.set(TOKEN_KEY, token).unwrap();
        }
        (NavigationGuard::new(storage.clone(), RouteTable::console()), storage)
    }

    #[test]
    fn test_protected_route_without_token_redirects_to_login() {
        let (guard, _) = make_guard(None);
        assert_eq!(guard.check("/dashboard"), Decision::Redirect("/login".into()));
        assert_eq!(guard.check("/settings"), Decision::Redirect("/login".into()));
        assert_eq!(guard.check("/"), Decision::Redirect("/login".into()));
    }

    #[test]
    fn test_login_with_token_redirects_to_landing() {
        let (guard, _) = make_guard(Some("T"));
        assert_eq!(guard.check("/login"), Decision::Redirect("/dashboard".into()));
    }

    #[test]
    fn test_normal_navigation_proceeds() {
        let (guard, _) = make_guard(Some("T"));
        assert_eq!(guard.check("/dashboard"), Decision::Proceed);
        assert_eq!(guard.check("/inbounds?page=3"), Decision::Proceed);

        let (guard, _) = make_guard(None);
        assert_eq!(guard.check("/login"), Decision::Proceed);
    }

    #[test]
    fn test_unknown_route_is_protected() {
        let (guard, _) = make_guard(None);
        assert_eq!(guard.check("/does-not-exist"), Decision::Redirect("/login".into()));
    }

    #[test]
    fn test_token_read_fresh_on_every_check() {
        let (guard, storage) = make_guard(Some("T"));
        assert_eq!(guard.check("/outbounds"), Decision::Proceed);

        // Cleared out-of-band, e.g. by a forced logout
        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(guard.check("/outbounds"), Decision::Redirect("/login".into()));
    }
}
