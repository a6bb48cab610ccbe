//! boxgate core - session and request authorization for the sing-box web
//! console.
//!
//! Three parts share one [`auth::Session`]:
//! - [`auth`]: the session, its persistence, and login/logout
//! - [`api`]: the authorized transport wrapping every REST call
//! - [`router`]: the navigation guard consulted before every route change
//!
//! [`Console`] wires them together.

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod router;

pub use config::Config;
pub use console::Console;
