pub mod access_log;
pub mod archiver;
pub mod catalogue;
pub mod file_writer;
pub mod pipeline;

pub use access_log::{LogRecord, RecordBuilder, RequestParts};
pub use pipeline::AccessLogPipeline;
