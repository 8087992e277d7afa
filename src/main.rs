use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tunecrit::db::Bootstrapper;
use tunecrit::errors::BootstrapError;

#[derive(Parser)]
#[command(
    name = "tunecrit-manage",
    about = "Database management commands for the tunecrit web application"
)]
struct Cli {
    /// PostgreSQL connection URI; falls back to the DATABASE_URI
    /// environment variable.
    #[arg(long)]
    db_uri: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and configure the database role, database and extension
    CreateDb,
    /// Create the database schema from a SQL file
    Tables {
        /// Schema definition to apply
        #[arg(long, default_value = "admin/sql/create_tables.sql")]
        schema: PathBuf,
    },
    /// Install default fixture records from a SQL file
    Fixtures {
        /// Fixture records to apply
        #[arg(long, default_value = "admin/sql/fixtures.sql")]
        fixtures: PathBuf,
    },
    /// Database backup commands
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
}

#[derive(Subcommand)]
enum BackupCommands {
    /// Dump the database in pg_dump custom format
    Dump {
        /// Where to write the dump
        #[arg(long, default_value = "backup/tunecrit.dump")]
        out_file: PathBuf,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let db_uri = match cli.db_uri.or_else(|| std::env::var("DATABASE_URI").ok()) {
        Some(uri) => uri,
        None => {
            eprintln!("❌ Error: pass --db-uri or set DATABASE_URI");
            std::process::exit(1);
        }
    };

    let bootstrapper = Bootstrapper::new();
    let result: Result<(), BootstrapError> = match cli.command {
        Commands::CreateDb => bootstrapper.init_postgres(&db_uri),
        Commands::Tables { schema } => bootstrapper.create_tables(&db_uri, &schema),
        Commands::Fixtures { fixtures } => bootstrapper.install_fixtures(&db_uri, &fixtures),
        Commands::Backup { command } => match command {
            BackupCommands::Dump { out_file } => bootstrapper.backup(&db_uri, &out_file),
        },
    };

    if let Err(error) = result {
        eprintln!("❌ Error: {error}");
        std::process::exit(1);
    }
}
