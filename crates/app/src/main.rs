use clap::Parser;
use engine::Engine;
use migration::{Migrator, MigratorTrait};

use cli::{Cli, Command};
use error::Result;
use settings::{Database, Settings};

mod cli;
mod error;
mod render;
mod repl;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "emballage={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = Engine::builder()
        .database(db)
        .units(settings.registry())
        .auto_create(settings.auto_create_accounts)
        .build()
        .await?;

    let outcome = dispatch(&engine, cli.command.unwrap_or(Command::Run)).await;
    engine.close().await?;
    outcome
}

async fn dispatch(engine: &Engine, command: Command) -> Result<()> {
    match command {
        Command::Run => repl::run(engine).await?,
        Command::Exec { account, line } => {
            let recorded = engine
                .parse_and_execute(&line.join(" "), account.as_deref())
                .await?;
            println!("{}", render::recorded(&recorded, engine.units()));
        }
        Command::Preview { account, line } => {
            let preview = engine.preview(&line.join(" "), account.as_deref()).await?;
            println!("{}", preview.text);
        }
        Command::Totals { json } => {
            let totals = engine.totals().await?;
            if json {
                let report = render::totals_report(&totals, engine.units());
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::totals(&totals, engine.units()));
            }
        }
        Command::Search { query, limit } => {
            println!("{}", render::search(engine.units(), &query, limit));
        }
        Command::Aliases => {
            let shorthand = engine.shorthand().await?;
            let registered = engine.registered_aliases().await?;
            print!("{}", render::aliases(&shorthand, &registered));
        }
    }
    Ok(())
}

async fn parse_database(config: &Database) -> Result<sea_orm::DatabaseConnection> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };
    tracing::debug!(%url, "opening database");

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
