//! auditkv CLI: index audit logs and query them.
//!
//! `auditkv [flags] COMMAND` runs a single command and exits. Collections
//! are defined with `create`, filled with `tail file|stdin`, and queried
//! with `read` and `history`.

mod commands;
mod format;
mod parse;

use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::ArgMatches;
use tracing::debug;

use auditkv_core::{CollectionSettings, Error, Result, Schema};
use auditkv_engine::config::CONFIG_FILE_NAME;
use auditkv_engine::{Collection, Engine, EngineConfig, StorageMode};
use auditkv_ingest::{FileTail, IngestService, LineSource, ReaderSource};

use commands::build_cli;
use format::{
    format_collections, format_created, format_documents, format_error, format_history,
    format_stats, OutputMode,
};
use parse::{matches_to_action, CliAction};

const DEFAULT_DATA_DIR: &str = ".auditkv";

fn main() {
    init_logging();

    let matches = build_cli().get_matches();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let exit_code = match run(&matches, output_mode) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            0
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            1
        }
    };
    process::exit(exit_code);
}

/// Log to stderr, filtered by `AUDITKV_LOG` (default: warn).
fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("AUDITKV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Resolve the engine configuration from the global flags.
///
/// `--memory` never touches the filesystem unless `--config` names a file.
/// Otherwise the config file defaults to `<data-dir>/auditkv.toml` and is
/// written with defaults on first use.
fn resolve_config(matches: &ArgMatches) -> Result<EngineConfig> {
    let data_dir_flag = matches.get_one::<String>("data-dir").map(PathBuf::from);
    let data_dir = data_dir_flag
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let config_flag = matches.get_one::<String>("config").map(PathBuf::from);

    if matches.get_flag("memory") {
        let mut config = match config_flag {
            Some(path) => EngineConfig::from_file(&path)?,
            None => EngineConfig::default(),
        };
        config.storage.mode = StorageMode::Memory;
        return Ok(config);
    }

    let config_path = config_flag.unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
    EngineConfig::write_default_if_missing(&config_path)?;
    let mut config = EngineConfig::from_file(&config_path)?;
    if let Some(dir) = data_dir_flag {
        config.storage.data_dir = dir;
    }
    debug!(
        target: "auditkv::cli",
        config = %config_path.display(),
        data_dir = %config.storage.data_dir.display(),
        "Resolved configuration"
    );
    Ok(config)
}

fn run(matches: &ArgMatches, mode: OutputMode) -> Result<String> {
    let action = matches_to_action(matches)?;
    let engine = Engine::open(resolve_config(matches)?)?;

    match action {
        CliAction::Create {
            collection,
            indexes,
            parser,
            force,
        } => {
            let indexes: Vec<String> = if indexes.is_empty() {
                parser
                    .default_indexes()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            } else {
                indexes
            };
            if indexes.is_empty() {
                return Err(Error::SchemaRequired { collection });
            }

            let schema = Schema::new(&indexes)?;
            let settings = CollectionSettings::with_parser(parser);
            let tx_id = if force {
                engine.create_collection(&collection, &schema, settings)?
            } else {
                engine.create_new_collection(&collection, &schema, settings)?
            };
            Ok(format_created(
                &collection,
                &schema.fields(),
                parser.as_str(),
                tx_id,
                mode,
            ))
        }
        CliAction::TailFile {
            collection,
            path,
            follow,
            skip_invalid,
        } => {
            let poll = Duration::from_millis(engine.ingest_config().poll_interval_ms);
            let source = FileTail::open(&path, follow)
                .map_err(Error::Source)?
                .with_poll_interval(poll);
            let collection = engine.open_collection(&collection)?;
            ingest(&engine, source, collection, skip_invalid, mode)
        }
        CliAction::TailStdin {
            collection,
            skip_invalid,
        } => {
            let source = ReaderSource::new(io::stdin().lock());
            let collection = engine.open_collection(&collection)?;
            ingest(&engine, source, collection, skip_invalid, mode)
        }
        CliAction::Read {
            collection,
            field,
            prefix,
        } => {
            let collection = engine.open_collection(&collection)?;
            let documents = collection.query().read(&field, &prefix)?;
            Ok(format_documents(&documents, mode))
        }
        CliAction::History {
            collection,
            primary_key,
        } => {
            let collection = engine.open_collection(&collection)?;
            let records = collection.history().history(&primary_key)?;
            Ok(format_history(&records, mode))
        }
        CliAction::Collections => {
            let names = engine.list_collections()?;
            Ok(format_collections(&names, mode))
        }
    }
}

fn ingest<S: LineSource>(
    engine: &Engine,
    source: S,
    collection: Collection,
    skip_invalid: bool,
    mode: OutputMode,
) -> Result<String> {
    let config = engine.ingest_config();
    let stats = IngestService::new(source, collection)
        .with_config(&config)
        .skip_invalid_documents(skip_invalid || config.skip_invalid_documents)
        .run()?;
    Ok(format_stats(&stats, mode))
}
