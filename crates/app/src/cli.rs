use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "emballage", version)]
#[command(about = "Record returnable packaging handed out to and taken back from accounts")]
pub struct Cli {
    /// Optional settings file (TOML). Defaults to `settings.toml` when present.
    #[arg(long)]
    pub config: Option<String>,
    /// SQLite database path, or `:memory:`.
    #[arg(long)]
    pub database: Option<String>,
    /// Let unknown account aliases create accounts.
    #[arg(long)]
    pub auto_create: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive prompt (default).
    Run,
    /// Record one command line, e.g. `exec -- -ju 5k 2c`.
    Exec {
        /// Account to record against; the line then holds only quantities.
        #[arg(long)]
        account: Option<String>,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true, trailing_var_arg = true)]
        line: Vec<String>,
    },
    /// Show what a command line would record without writing it.
    Preview {
        #[arg(long)]
        account: Option<String>,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true, trailing_var_arg = true)]
        line: Vec<String>,
    },
    /// Totals per account and flow.
    Totals {
        #[arg(long)]
        json: bool,
    },
    /// Find units by code, name or keyword.
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Account shorthands and registered aliases.
    Aliases,
}
