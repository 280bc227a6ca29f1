//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("auditkv")
        .about("Index audit logs into a versioned document store and query them")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Durable store directory (default: .auditkv)")
                .global(true),
        )
        .arg(
            Arg::new("memory")
                .long("memory")
                .help("Ephemeral in-memory store, nothing is kept")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file (default: <data-dir>/auditkv.toml)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_create())
        .subcommand(build_tail())
        .subcommand(build_read())
        .subcommand(build_history())
        .subcommand(build_collections())
}

fn collection_arg() -> Arg {
    Arg::new("collection")
        .required(true)
        .help("Collection name")
}

fn skip_invalid_arg() -> Arg {
    Arg::new("skip-invalid")
        .long("skip-invalid")
        .help("Skip documents missing an indexed field instead of stopping")
        .action(ArgAction::SetTrue)
}

// =========================================================================
// Collections
// =========================================================================

fn build_create() -> Command {
    Command::new("create")
        .about("Create a collection")
        .arg(collection_arg())
        .arg(
            Arg::new("indexes")
                .long("indexes")
                .value_delimiter(',')
                .help("Indexed fields, primary key first; join fields with + for a composite key"),
        )
        .arg(
            Arg::new("parser")
                .long("parser")
                .default_value("json")
                .value_parser(["json", "pgaudit", "wrap"])
                .help("Line format ingested into the collection"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .help("Redefine the collection if it already exists")
                .action(ArgAction::SetTrue),
        )
}

fn build_collections() -> Command {
    Command::new("collections").about("List configured collections")
}

// =========================================================================
// Ingestion
// =========================================================================

fn build_tail() -> Command {
    Command::new("tail")
        .about("Store lines from a source into a collection")
        .subcommand_required(true)
        .subcommand(
            Command::new("file")
                .about("Tail a file")
                .arg(collection_arg())
                .arg(Arg::new("path").required(true).help("File to read"))
                .arg(
                    Arg::new("follow")
                        .long("follow")
                        .short('f')
                        .help("Keep waiting for new lines at end of file")
                        .action(ArgAction::SetTrue),
                )
                .arg(skip_invalid_arg()),
        )
        .subcommand(
            Command::new("stdin")
                .about("Read lines from standard input")
                .arg(collection_arg())
                .arg(skip_invalid_arg()),
        )
}

// =========================================================================
// Queries
// =========================================================================

fn build_read() -> Command {
    Command::new("read")
        .about("Read documents whose field value starts with a prefix")
        .arg(collection_arg())
        .arg(
            Arg::new("field")
                .required(true)
                .help("Indexed field, or the primary key specification"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .default_value("")
                .help("Value prefix to match (default: all documents)"),
        )
}

fn build_history() -> Command {
    Command::new("history")
        .about("Show every revision of a document")
        .arg(collection_arg())
        .arg(
            Arg::new("primary-key")
                .required(true)
                .help("Primary key value of the document"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_create_indexes_split_on_comma() {
        let matches = build_cli()
            .try_get_matches_from(["auditkv", "create", "trail", "--indexes", "a+b,c"])
            .unwrap();
        let (_, create) = matches.subcommand().unwrap();
        let indexes: Vec<&String> = create.get_many::<String>("indexes").unwrap().collect();
        assert_eq!(indexes, vec!["a+b", "c"]);
        assert_eq!(create.get_one::<String>("parser").unwrap(), "json");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["auditkv", "collections", "--memory", "--json"])
            .unwrap();
        assert!(matches.get_flag("memory"));
        assert!(matches.get_flag("json"));
    }

    #[test]
    fn test_unknown_parser_rejected() {
        assert!(build_cli()
            .try_get_matches_from(["auditkv", "create", "trail", "--parser", "xml"])
            .is_err());
    }
}
