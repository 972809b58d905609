//! Database bootstrap tooling for the job board: schema loading,
//! catalog verification and sample-data seeding against Postgres.

pub mod cli;
pub mod config;
pub mod database;
pub mod models;
pub mod schema;
pub mod seed;
pub mod verify;

pub use config::Settings;
pub use database::Database;
pub use schema::SchemaArtifact;
pub use seed::{SeedPolicy, SeedReport};
pub use verify::SchemaReport;
