//! Session state and the operations that change it.
//!
//! This module provides:
//! - `Storage`: flat key-value persistence (`FileStorage`, `MemoryStorage`)
//! - `Session`: the in-memory token/username pair mirrored to storage
//! - `SessionStore`: login and logout against an `AuthBackend`
//!
//! The session is hydrated from storage at startup. An empty token means
//! logged out.

pub mod credentials;
pub mod session;
pub mod storage;
pub mod store;

pub use credentials::Credentials;
pub use session::{Session, SessionData};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{AuthBackend, AuthError, SessionStore};
