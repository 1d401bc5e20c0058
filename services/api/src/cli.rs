use crate::server;
use crate::terms::{run_terms_import, TermsImportArgs};
use clap::{Args, Parser, Subcommand};
use quark::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "quark",
    about = "Serve and administer the term calendar and exam archive",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Term calendar maintenance
    Terms {
        #[command(subcommand)]
        command: TermsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TermsCommand {
    /// Load a term CSV dump and print the resulting calendar
    Import(TermsImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the term calendar from a CSV dump (term,year,current) before serving
    #[arg(long)]
    pub(crate) terms_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Terms {
            command: TermsCommand::Import(args),
        } => run_terms_import(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["quark"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn terms_import_requires_a_csv_path() {
        assert!(Cli::try_parse_from(["quark", "terms", "import"]).is_err());

        let cli = Cli::try_parse_from(["quark", "terms", "import", "--csv", "terms.csv"])
            .expect("parses");
        match cli.command {
            Some(Command::Terms {
                command: TermsCommand::Import(args),
            }) => assert_eq!(args.csv, PathBuf::from("terms.csv")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
