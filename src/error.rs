use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    /// A source document was missing, unreachable or malformed.
    #[error("could not load {resource}: {reason}")]
    Load { resource: String, reason: String },

    #[error("rejected: {0}")]
    Validation(String),

    #[error("could not persist content: {0}")]
    Persistence(String),

    #[error("no news item with id {0}")]
    NotFound(String),

    #[error("the admin console is logged out")]
    Unauthorized,
}

impl ContentError {
    pub fn load(resource: impl ToString, reason: impl ToString) -> Self {
        ContentError::Load {
            resource: resource.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<sled::Error> for ContentError {
    fn from(e: sled::Error) -> Self {
        ContentError::Persistence(e.to_string())
    }
}

pub type Result<T, E = ContentError> = std::result::Result<T, E>;
