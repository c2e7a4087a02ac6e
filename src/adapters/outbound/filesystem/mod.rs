/// Filesystem adapters for feed, index, and report I/O
mod feed_reader;
mod index_files;
mod report_writer;

pub use feed_reader::FileSystemFeedSource;
pub use index_files::FileSystemIndexStore;
pub use report_writer::{FileSystemWriter, StdoutPresenter};
