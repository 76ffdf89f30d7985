use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI arguments for the simplec binary.
#[derive(Parser, Debug)]
#[command(name = "simplec", version, about = "Driver for the simplec compiler core")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Type-checks a directory of pre-parsed AST fixtures and prints diagnostics.
    Check {
        /// Directory of `*.json` fixtures, each a serialized `Vec<Statement>`
        /// for one source file (there is no parser in this workspace).
        fixtures: PathBuf,
    },
    /// Resolves hover info for one position, after checking a fixture directory.
    Hover {
        /// Directory of `*.json` fixtures (see `check`).
        fixtures: PathBuf,
        /// Fixture path to hover in, relative to `fixtures`.
        path: String,
        /// 1-based line.
        line: u32,
        /// 1-based UTF-8 byte column.
        column: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_parses_the_fixtures_directory() {
        let args = CliArgs::try_parse_from(["simplec", "check", "fixtures/basic"]).unwrap();
        match args.command {
            Command::Check { fixtures } => assert_eq!(fixtures, PathBuf::from("fixtures/basic")),
            other => panic!("expected Check, got {other:?}"),
        }
    }

    #[test]
    fn hover_parses_fixtures_path_line_and_column() {
        let args = CliArgs::try_parse_from(["simplec", "hover", "fixtures/basic", "main.simple.json", "3", "10"]).unwrap();
        match args.command {
            Command::Hover { fixtures, path, line, column } => {
                assert_eq!(fixtures, PathBuf::from("fixtures/basic"));
                assert_eq!(path, "main.simple.json");
                assert_eq!(line, 3);
                assert_eq!(column, 10);
            }
            other => panic!("expected Hover, got {other:?}"),
        }
    }

    #[test]
    fn missing_subcommand_is_a_parse_error() {
        assert!(CliArgs::try_parse_from(["simplec"]).is_err());
    }
}
