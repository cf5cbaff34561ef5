//! BucketFlow - declarative S3 bucket management
//!
//! Reads `bucket` nodes from a KDL file, plans them against the recorded
//! state in `.bucketflow/state.json` and applies the plan bucket by bucket.

pub mod engine;
pub mod error;
pub mod parser;

pub use engine::{Advisor, Engine, build_plan};
pub use error::{FlowError, Result};
pub use parser::{load_bucket_file, parse_bucket, parse_kdl_string};
