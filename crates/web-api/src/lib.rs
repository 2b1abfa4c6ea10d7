//! REST surface for the auction engine.

pub mod handlers;
pub mod server;

pub use server::{ApiServer, AppState};
