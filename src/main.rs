use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{fmt, EnvFilter};
use yoked::{seed, settings, storage, web};

#[derive(Parser, Debug)]
#[command(
    name = "yoked",
    version,
    about = "Fleet check-in and user provisioning service"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Insert configured shells, access levels and roles that are missing
    Seed,
    /// Drop all data, re-create the schema and seed reference data
    ResetDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database + migrations)
    let db = storage::init(&settings.database).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => web::serve(settings, db).await?,
        Command::Seed => {
            seed::seed_reference_data(&db, &settings.seed).await?;
        }
        Command::ResetDb => {
            seed::reset_database(&db, &settings.seed).await?;
        }
    }
    Ok(())
}
