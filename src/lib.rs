//! seqdrift simulates implicit SSH sequence numbering over a handshake trace and shows how
//! silently dropping pre-authentication packets leaves the peers counting differently.
pub mod analyser;
pub mod config;
pub mod error;
pub mod ui;

pub use error::{Error, Result};
