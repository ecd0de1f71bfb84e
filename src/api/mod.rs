//! HTTP services, one router per role
//!
//! Every handler returns `Result<_, ApiError>`; failures are rendered as
//! `{"code": "...", "message": "..."}` with a matching status code.

pub mod coordinator;
pub mod directory;
mod error;
pub mod gateway;
pub mod ledger;
pub mod models;
mod server;
pub mod services;
pub mod state;
pub mod storage;
pub(crate) mod utils;

pub use error::{ApiError, ErrorCode};
pub use server::{serve, service, shutdown_signal};
