use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Bucket file not found. Looked in:\n\
        - current directory: bucket.local.kdl, .bucket.local.kdl, bucket.kdl, .bucket.kdl\n\
        - ./.bucketflow/ directory\n\
        - ~/.config/bucketflow/bucket.kdl\n\
        Set BUCKETFLOW_CONFIG_PATH to point at a file directly"
    )]
    BucketFileNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
