//! Persistence of finished files.

mod s3_sink;
mod sink;

pub use s3_sink::{create_s3_client, S3Sink};
pub use sink::{FileSink, MemorySink, TiffSink};
