pub mod bridge;
pub mod dispatcher;
pub mod mapper;

pub use bridge::{HueBridge, LightBridge, LightState};
pub use dispatcher::CommandDispatcher;
pub use mapper::{LightCommand, LightingMapper, MappingConfig};

use thiserror::Error;

/// Lighting-bridge failures.
///
/// Connection problems are fatal at startup; per-dispatch failures are logged
/// and swallowed so the frame pipeline keeps running.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge rejected the credential")]
    Unauthorized,

    #[error("bridge connection failed: {0}")]
    Connection(String),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected bridge response: {0}")]
    InvalidResponse(String),
}
