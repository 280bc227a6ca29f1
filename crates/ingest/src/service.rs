//! Ingest service: source → parser → write path
//!
//! Lines are processed one at a time and each stored document is its own
//! transaction. The loop ends cleanly when the source reports end of
//! stream.

use tracing::{debug, info, trace, warn};

use auditkv_core::{Error, Result, TxId};
use auditkv_engine::{Collection, IngestConfig};

use crate::parser::LineParser;
use crate::source::LineSource;

/// Counters for one ingest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Lines read from the source, blank ones included
    pub lines_read: u64,
    /// Documents stored
    pub stored: u64,
    /// Blank lines skipped
    pub blank_skipped: u64,
    /// Lines the parser rejected
    pub parse_skipped: u64,
    /// Parsed documents rejected by validation and skipped
    pub invalid_skipped: u64,
    /// Transaction of the last stored document
    pub last_tx: Option<TxId>,
}

/// Drives one source into one collection
#[derive(Debug)]
pub struct IngestService<S> {
    source: S,
    parser: LineParser,
    collection: Collection,
    skip_invalid_documents: bool,
}

impl<S: LineSource> IngestService<S> {
    /// Service using the parser configured for `collection`
    pub fn new(source: S, collection: Collection) -> Self {
        let parser = LineParser::from(collection.settings().parser);
        Self {
            source,
            parser,
            collection,
            skip_invalid_documents: false,
        }
    }

    /// Override the parser
    pub fn with_parser(mut self, parser: LineParser) -> Self {
        self.parser = parser;
        self
    }

    /// Apply the `[ingest]` configuration
    pub fn with_config(mut self, config: &IngestConfig) -> Self {
        self.skip_invalid_documents = config.skip_invalid_documents;
        self
    }

    /// Skip documents that fail validation instead of stopping
    pub fn skip_invalid_documents(mut self, skip: bool) -> Self {
        self.skip_invalid_documents = skip;
        self
    }

    /// Run until the source ends.
    ///
    /// # Errors
    ///
    /// - `Error::Source` if the source fails
    /// - `Error::Ingest` if a parsed document cannot be stored; validation
    ///   failures are skipped instead when so configured
    pub fn run(&mut self) -> Result<IngestStats> {
        let mut stats = IngestStats::default();
        let collection = self.collection.name().to_string();

        while let Some(line) = self.source.read_line().map_err(Error::Source)? {
            stats.lines_read += 1;
            let line_no = stats.lines_read;

            if line.trim().is_empty() {
                stats.blank_skipped += 1;
                continue;
            }

            let document = match self.parser.parse(&line) {
                Ok(document) => document,
                Err(e) => {
                    debug!(
                        target: "auditkv::ingest",
                        collection = %collection,
                        line = line_no,
                        error = %e,
                        "Invalid line format, skipping"
                    );
                    stats.parse_skipped += 1;
                    continue;
                }
            };

            match self.collection.indexer().write(&document) {
                Ok(tx_id) => {
                    trace!(
                        target: "auditkv::ingest",
                        collection = %collection,
                        line = line_no,
                        tx_id = tx_id.as_u64(),
                        "Stored line"
                    );
                    stats.stored += 1;
                    stats.last_tx = Some(tx_id);
                }
                Err(e) if self.skip_invalid_documents && e.is_validation() => {
                    warn!(
                        target: "auditkv::ingest",
                        collection = %collection,
                        line = line_no,
                        error = %e,
                        "Skipping invalid document"
                    );
                    stats.invalid_skipped += 1;
                }
                Err(e) => {
                    return Err(Error::Ingest {
                        line: line_no,
                        source: Box::new(e),
                    })
                }
            }
        }

        info!(
            target: "auditkv::ingest",
            collection = %collection,
            lines = stats.lines_read,
            stored = stats.stored,
            parse_skipped = stats.parse_skipped,
            invalid_skipped = stats.invalid_skipped,
            "Reached end of source"
        );
        Ok(stats)
    }

    /// Give back the source
    pub fn into_source(self) -> S {
        self.source
    }
}
