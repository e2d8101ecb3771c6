// Extraction backends

pub mod bridge;

pub use bridge::{BridgeBackend, BridgeConfig};
