//! File input and output.
//!
//! [`SourceReader`] turns paths into import batches; [`OutputWriter`] saves
//! the exported document (and optional thumbnails) to disk.

pub mod reader;
pub mod writer;

pub use reader::{LoadStatistics, LoadedInputs, SkippedInput, SourceReader};
pub use writer::{OutputWriter, WriteOptions, WriteStatistics};
