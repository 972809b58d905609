// src/cli.rs
use crate::config::Settings;
use crate::database::Database;
use crate::schema::{self, SchemaArtifact};
use crate::seed::{self, SeedPolicy};
use crate::verify;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "jobboard-db")]
#[command(about = "Apply the job board schema and load sample data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SQL schema artifact to apply
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Env file read before DATABASE_URL is resolved
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply the schema, then list what it created
    Migrate,
    /// List tables, enum types and indexes without changing anything
    Verify {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Insert sample skills, users, a company and jobs
    Seed {
        /// Reuse the sample company and skip jobs it already has
        #[arg(long)]
        skip_existing: bool,
    },
    /// Migrate, then seed
    Setup {
        #[arg(long)]
        skip_existing: bool,
    },
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    // Configuration problems abort before any connection is attempted.
    let settings = Settings::load(cli.env_file.as_deref())?;
    let artifact = match cli.command {
        Command::Migrate | Command::Setup { .. } => {
            Some(SchemaArtifact::resolve(cli.schema.as_deref()).await?)
        }
        _ => None,
    };

    println!("📡 Connecting to database...");
    let db = Database::connect(&settings).await?;
    println!("✅ Connected successfully!");

    let result = match db.server_version().await {
        Ok(version) => {
            info!("Postgres server version {}", version);
            run_command(&db, cli.command, artifact).await
        }
        Err(e) => Err(e),
    };

    db.close().await;
    println!("👋 Database connection closed");
    result
}

async fn run_command(
    db: &Database,
    command: Command,
    artifact: Option<SchemaArtifact>,
) -> Result<()> {
    match command {
        Command::Migrate => {
            migrate(db, artifact.as_ref()).await?;
        }

        Command::Verify { json } => {
            let report = verify::inspect(db.pool()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("🔍 Verifying database setup...");
                print!("{}", report);
            }
            warn_missing_tables(&report);
        }

        Command::Seed { skip_existing } => {
            seed::run(db, policy(skip_existing)).await?;
        }

        Command::Setup { skip_existing } => {
            migrate(db, artifact.as_ref()).await?;
            seed::run(db, policy(skip_existing)).await?;
        }
    }

    Ok(())
}

async fn migrate(db: &Database, artifact: Option<&SchemaArtifact>) -> Result<()> {
    let artifact = artifact.context("Schema artifact was not resolved")?;
    println!("🚀 Starting database migration...");
    let load = schema::apply(db.pool(), artifact).await?;
    info!("Applied {} bytes from {}", load.size_bytes, load.source);

    println!("🔍 Verifying database setup...");
    let report = verify::inspect(db.pool()).await?;
    print!("{}", report);
    warn_missing_tables(&report);

    println!("✨ Database setup complete!");
    Ok(())
}

fn warn_missing_tables(report: &verify::SchemaReport) {
    let missing = report.missing_tables();
    if !missing.is_empty() {
        warn!("Expected tables not found: {}", missing.join(", "));
    }
}

fn policy(skip_existing: bool) -> SeedPolicy {
    if skip_existing {
        SeedPolicy::SkipExisting
    } else {
        SeedPolicy::Append
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_bare_subcommands() {
        let cli = Cli::try_parse_from(["jobboard-db", "migrate"]).unwrap();
        assert!(matches!(cli.command, Command::Migrate));
        assert!(cli.schema.is_none());
        assert!(cli.env_file.is_none());

        let cli = Cli::try_parse_from(["jobboard-db", "seed"]).unwrap();
        assert!(matches!(cli.command, Command::Seed { skip_existing: false }));
    }

    #[test]
    fn test_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "jobboard-db",
            "setup",
            "--skip-existing",
            "--schema",
            "db/schema.sql",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Setup { skip_existing: true }));
        assert_eq!(cli.schema, Some(PathBuf::from("db/schema.sql")));
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["jobboard-db"]).is_err());
    }

    #[test]
    fn test_policy_mapping() {
        assert_eq!(policy(false), SeedPolicy::Append);
        assert_eq!(policy(true), SeedPolicy::SkipExisting);
    }

    #[tokio::test]
    async fn test_missing_env_file_fails_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "jobboard-db",
            "seed",
            "--env-file",
            dir.path().join("absent.env").to_str().unwrap(),
        ])
        .unwrap();

        let err = handle_command(cli).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read env file"));
    }

    #[tokio::test]
    async fn test_unset_database_url_fails_before_connecting() {
        // No other test in this binary reads DATABASE_URL from the process env.
        std::env::remove_var("DATABASE_URL");
        let env_file = tempfile::NamedTempFile::new().unwrap();
        let cli = Cli::try_parse_from([
            "jobboard-db",
            "migrate",
            "--env-file",
            env_file.path().to_str().unwrap(),
        ])
        .unwrap();

        let err = handle_command(cli).await.unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL is not set"));
    }
}
