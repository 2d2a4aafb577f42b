use thiserror::Error;

use crate::circle::CircleError;
use crate::resolver::ResolveError;

#[derive(Debug, Error)]
pub enum CartError {
    /// Bad or missing command-line input.
    #[error("{0}")]
    Config(String),

    #[error("no auth token set: use $CIRCLE_TOKEN or flag --token")]
    Credential,

    #[error(transparent)]
    Transport(CircleError),

    #[error(transparent)]
    Decode(CircleError),

    #[error(transparent)]
    BuildNotFound(#[from] ResolveError),

    #[error("unable to find artifact: {0}")]
    ArtifactNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<CircleError> for CartError {
    fn from(err: CircleError) -> Self {
        if err.is_decode() {
            CartError::Decode(err)
        } else {
            CartError::Transport(err)
        }
    }
}

impl CartError {
    /// Whether usage text should follow the message. Only flag problems get
    /// it; a missing token is almost always an environment issue.
    pub fn shows_usage(&self) -> bool {
        matches!(self, CartError::Config(_))
    }
}
