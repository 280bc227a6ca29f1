//! Ingestion pipeline for auditkv
//!
//! - LineSource: reader and file-tail sources (with `follow`)
//! - LineParser: JSON, pgaudit and wrap line formats
//! - IngestService: source → parser → write path, one transaction per line

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod parser;
pub mod service;
pub mod source;

pub use parser::{split_csv, LineParser, ParseError, ParseResult};
pub use service::{IngestService, IngestStats};
pub use source::{FileTail, LineSource, ReaderSource, StopHandle};
