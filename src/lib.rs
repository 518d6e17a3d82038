//! # PA Relay
//!
//! Low-latency announcement relay for a shipboard public-address network.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │  Controller  │      │    Master    │      │    Player    │
//! │  (console)   │      │ (live mic)   │      │  (speaker)   │
//! └──────┬───────┘      └──────┬───────┘      └──────▲───────┘
//!        │ commands            │ start/stop          │ events +
//!        │ (JSON)              │ + audio frames      │ audio frames
//!        ▼                     ▼                     │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Relay (relay)                        │
//! │  ┌───────────────┐  ┌──────────────────┐  ┌──────────────┐  │
//! │  │   Registry    │  │   Arbitration    │  │    Router    │  │
//! │  │  (registry)   │  │    (session)     │  │   (router)   │  │
//! │  └───────────────┘  └──────────────────┘  └──────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!        ▲
//!        │ WebSocket endpoints /ws/{player,controller,master}
//! ┌──────┴───────┐
//! │  Web server  │  axum + static frontend + /api/status
//! │     (ui)     │
//! └──────────────┘
//! ```
//!
//! Controllers issue playback commands that fan out to every player.
//! A master pre-empts everything: while its live announcement is active,
//! controller commands are rejected and raw audio frames are forwarded
//! verbatim to all players. All delivery is best-effort; the relay keeps
//! no persistent state and never retries.

pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod router;
pub mod session;
pub mod ui;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default bind address for the web server
    pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

    /// Default HTTP/WebSocket port
    pub const DEFAULT_HTTP_PORT: u16 = 8000;

    /// Holder name used when a master starts without declaring one
    pub const DEFAULT_MASTER_NAME: &str = "Master";
}
