use thiserror::Error;

use crate::common::file_operations::FileOperationError;
use crate::core::{CodecError, ImportIdSetError};

#[derive(Debug, Error)]
pub enum ImportIdSetLibError {
    #[error(transparent)]
    CodecError(#[from] CodecError),

    #[error(transparent)]
    ImportIdSetError(#[from] ImportIdSetError),

    #[error(transparent)]
    FileOperationError(#[from] FileOperationError),

    #[error("Posting store failure: '{0}'")]
    StoreError(String),

    #[error("Failed to set up logger: '{0}'")]
    LoggerError(String),
}
