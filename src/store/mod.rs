//! Artifact store: persistence gateway, types and HTTP boundary

pub mod handler;
pub mod store;
pub mod types;

pub use handler::{board_router, BoardState};
pub use store::{validate_filename, ArtifactStore};
pub use types::{Artifact, ArtifactKind};
