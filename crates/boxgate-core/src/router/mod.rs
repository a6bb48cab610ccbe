//! Client-side navigation for the console views.
//!
//! Every route requires a session except the login route. The guard reads
//! the persisted token fresh on each transition and redirects:
//! - anonymous visits to protected routes go to the login route
//! - authenticated visits to the login route go to the landing route

pub mod guard;
pub mod navigator;
pub mod routes;

pub use guard::{Decision, NavigationGuard};
pub use navigator::{Location, NavigationError, Router};
pub use routes::{Route, RouteTable};

/// The single public route
pub const LOGIN_PATH: &str = "/login";

/// Default authenticated landing route
pub const LANDING_PATH: &str = "/dashboard";

/// Full-application navigation, used by the transport after a forced logout
pub trait Redirect: Send + Sync {
    fn redirect(&self, path: &str);
}
