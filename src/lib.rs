//! Hearthboard - Family Message Board Backend
//!
//! Hearthboard keeps a shared family message board: text notes and recorded
//! media land as plain files in a versioned store directory, and a background
//! poller reconciles that directory with a git remote so every device in the
//! household converges on the same board.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Hearthboard Bridge                      │
//! │  ┌──────────────────────────┐  ┌────────────────────────┐  │
//! │  │       Board API          │  │  Notification Stream   │  │
//! │  │  POST /api/v1/notes      │  │  GET /ws               │  │
//! │  │  POST /api/v1/media      │  │  (newMessages events)  │  │
//! │  │  GET  /api/v1/artifacts  │  └───────────▲────────────┘  │
//! │  │  GET  /api/v1/device     │              │               │
//! │  └────────────┬─────────────┘              │               │
//! │               │                            │               │
//! │  ┌────────────▼─────────────┐  ┌───────────┴────────────┐  │
//! │  │      Artifact Store      │  │      Sync Poller       │  │
//! │  │  - write note / media    │  │  - fetch remote        │  │
//! │  │  - list artifacts        │  │  - compare tips        │  │
//! │  │  - commit each write     │  │  - pull --rebase       │  │
//! │  └────────────┬─────────────┘  └───────────┬────────────┘  │
//! │               └──────────┬─────────────────┘               │
//! │                ┌─────────▼──────────┐                      │
//! │                │   History Backend  │                      │
//! │                │   (git CLI + LFS)  │                      │
//! │                └────────────────────┘                      │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`bridge`]: HTTP + WebSocket boundary for the front end
//! - [`store`]: Artifact persistence gateway and board API types
//! - [`sync`]: Background poller reconciling with the git remote
//! - [`history`]: Version-control backend abstraction and git CLI driver
//! - [`device`]: Device identity derivation
//! - [`config`]: Configuration management

pub mod bridge;
pub mod config;
pub mod device;
pub mod error;
pub mod history;
pub mod store;
pub mod sync;

pub use config::BoardConfig;
pub use error::{Error, Result};
