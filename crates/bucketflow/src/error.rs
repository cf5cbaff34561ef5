use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Bucket \"{0}\" is declared more than once")]
    DuplicateBucket(String),

    #[error(transparent)]
    Cloud(#[from] bucketflow_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, FlowError>;
