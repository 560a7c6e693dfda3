//! ticjar-gateway - the web face of the tic jar
//!
//! Serves the embedded HTML front end and the JSON API over axum. All
//! ledger semantics live in ticjar-core; this crate only maps requests
//! to store operations and store results to JSON responses.

pub mod frontend;
pub mod server;

pub use server::{AppState, GatewayServer};
