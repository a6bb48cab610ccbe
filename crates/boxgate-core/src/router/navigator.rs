use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::guard::{Decision, NavigationGuard};
use super::routes::{normalize, Route};
use super::Redirect;

/// Upper bound on guard and route redirects followed for one navigation
const MAX_REDIRECTS: usize = 8;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No route for {0}")]
    NotFound(String),

    #[error("Too many redirects navigating to {0}")]
    RedirectLoop(String),
}

/// Where the application currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub name: Option<String>,
    pub title: Option<String>,
}

impl From<&Route> for Location {
    fn from(route: &Route) -> Self {
        Self {
            path: route.path().to_string(),
            name: route.name().map(str::to_string),
            title: route.title().map(str::to_string),
        }
    }
}

/// Client-side router. Every transition, including hard redirects issued by
/// the transport, passes through the navigation guard.
pub struct Router {
    guard: NavigationGuard,
    current: Mutex<Option<Location>>,
}

impl Router {
    pub fn new(guard: NavigationGuard) -> Self {
        Self {
            guard,
            current: Mutex::new(None),
        }
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Last location reached, `None` before the first navigation
    pub fn current(&self) -> Option<Location> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Navigate to `target`, following guard and route redirects.
    ///
    /// The current location only changes when a route is reached.
    pub fn navigate(&self, target: &str) -> Result<Location, NavigationError> {
        let mut path = normalize(target);

        for _ in 0..MAX_REDIRECTS {
            if let Decision::Redirect(to) = self.guard.check(&path) {
                debug!(from = %path, %to, "Navigation redirected by guard");
                path = to;
                continue;
            }

            let route = self
                .guard
                .routes()
                .resolve(&path)
                .ok_or_else(|| NavigationError::NotFound(path.clone()))?;

            if let Some(to) = route.redirect() {
                debug!(from = %path, %to, "Route redirect");
                path = to.to_string();
                continue;
            }

            let location = Location::from(route);
            *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(location.clone());
            return Ok(location);
        }

        Err(NavigationError::RedirectLoop(normalize(target)))
    }
}

impl Redirect for Router {
    fn redirect(&self, path: &str) {
        info!(path, "Redirecting");
        if let Err(e) = self.navigate(path) {
            warn!(path, error = %e, "Redirect failed");
        }
    }
}
