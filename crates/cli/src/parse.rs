//! ArgMatches → CliAction conversion.

use clap::ArgMatches;

use auditkv_core::{Error, ParserKind, Result};

/// The result of parsing the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Define a collection
    Create {
        collection: String,
        indexes: Vec<String>,
        parser: ParserKind,
        force: bool,
    },
    /// Ingest a file
    TailFile {
        collection: String,
        path: String,
        follow: bool,
        skip_invalid: bool,
    },
    /// Ingest standard input
    TailStdin {
        collection: String,
        skip_invalid: bool,
    },
    /// Prefix query on one index
    Read {
        collection: String,
        field: String,
        prefix: String,
    },
    /// All revisions of one document
    History {
        collection: String,
        primary_key: String,
    },
    /// List collection names
    Collections,
}

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| Error::Config(format!("missing argument '{}'", name)))
}

/// Convert clap matches into a [`CliAction`].
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| Error::Config("no command given".to_string()))?;

    match name {
        "create" => {
            let indexes = sub
                .get_many::<String>("indexes")
                .map(|values| {
                    values
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            let parser = sub
                .get_one::<String>("parser")
                .map(|s| s.parse::<ParserKind>())
                .transpose()?
                .unwrap_or_default();
            Ok(CliAction::Create {
                collection: required(sub, "collection")?,
                indexes,
                parser,
                force: sub.get_flag("force"),
            })
        }
        "tail" => match sub.subcommand() {
            Some(("file", file)) => Ok(CliAction::TailFile {
                collection: required(file, "collection")?,
                path: required(file, "path")?,
                follow: file.get_flag("follow"),
                skip_invalid: file.get_flag("skip-invalid"),
            }),
            Some(("stdin", stdin)) => Ok(CliAction::TailStdin {
                collection: required(stdin, "collection")?,
                skip_invalid: stdin.get_flag("skip-invalid"),
            }),
            _ => Err(Error::Config("tail needs a source: file or stdin".to_string())),
        },
        "read" => Ok(CliAction::Read {
            collection: required(sub, "collection")?,
            field: required(sub, "field")?,
            prefix: sub.get_one::<String>("prefix").cloned().unwrap_or_default(),
        }),
        "history" => Ok(CliAction::History {
            collection: required(sub, "collection")?,
            primary_key: required(sub, "primary-key")?,
        }),
        "collections" => Ok(CliAction::Collections),
        other => Err(Error::Config(format!("unknown command '{}'", other))),
    }
}
