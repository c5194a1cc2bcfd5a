//! Presentation bridge: HTTP + WebSocket boundary for the front end

pub mod server;

pub use server::{Bridge, BridgeBuilder, BridgeState};
