pub mod client;
pub mod error;
pub mod types;

pub use client::{ArtifactSource, BuildHistory, CircleClient};
pub use error::CircleError;
pub use types::{Artifact, BuildRecord, Project, Vcs, find_artifact};
