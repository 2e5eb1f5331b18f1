use thiserror::Error;

use crate::core::CodecError;

#[derive(Debug, Error)]
pub enum ImportIdSetError {
    #[error(transparent)]
    CodecError(#[from] CodecError),

    #[error("Invalid ImportIdSetConfig: '{0}'")]
    InvalidConfig(String),
}
