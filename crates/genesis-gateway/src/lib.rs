//! genesis-gateway - HTTP front door for the GENESIS agents
//!
//! Exposes a single `POST /chat` route that validates the request body and
//! hands it to the core [`Dispatcher`](genesis_core::Dispatcher).

pub mod protocol;
pub mod server;

pub use server::GatewayServer;
