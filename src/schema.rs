// src/schema.rs
//! Schema artifact loading and application

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_SCHEMA_PATH: &str = "schema/database-schema.sql";

const BUNDLED_SCHEMA: &str = include_str!("../schema/database-schema.sql");

/// Where a schema artifact came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Bundled,
}

impl std::fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaSource::File(path) => write!(f, "{}", path.display()),
            SchemaSource::Bundled => write!(f, "<bundled schema>"),
        }
    }
}

/// The SQL text applied as one batch
#[derive(Debug, Clone)]
pub struct SchemaArtifact {
    pub source: SchemaSource,
    pub sql: String,
}

impl SchemaArtifact {
    /// Read an artifact from disk
    pub async fn from_file(path: &Path) -> Result<Self> {
        let sql = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        Self::new(SchemaSource::File(path.to_path_buf()), sql)
    }

    /// The schema compiled into this binary
    pub fn bundled() -> Result<Self> {
        Self::new(SchemaSource::Bundled, BUNDLED_SCHEMA.to_string())
    }

    /// Resolve the artifact for a run.
    ///
    /// An explicit path must be readable. Without one the default path is
    /// tried first and the bundled schema is the fallback.
    pub async fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path).await,
            None => {
                let default_path = Path::new(DEFAULT_SCHEMA_PATH);
                if tokio::fs::metadata(default_path).await.is_ok() {
                    Self::from_file(default_path).await
                } else {
                    info!(
                        "{} not found, using bundled schema",
                        default_path.display()
                    );
                    Self::bundled()
                }
            }
        }
    }

    fn new(source: SchemaSource, sql: String) -> Result<Self> {
        if sql.trim().is_empty() {
            anyhow::bail!("Schema artifact is empty: {}", source);
        }
        Ok(Self { source, sql })
    }

    pub fn size_bytes(&self) -> usize {
        self.sql.len()
    }
}

/// Outcome of a successful schema application
#[derive(Debug, Clone)]
pub struct SchemaLoad {
    pub source: SchemaSource,
    pub size_bytes: usize,
}

/// Submit the whole artifact as a single batch.
///
/// Uses the simple query protocol so multi-statement text and `DO` blocks are
/// accepted as-is. Any database error aborts the load unchanged.
pub async fn apply(pool: &PgPool, artifact: &SchemaArtifact) -> Result<SchemaLoad> {
    println!("📄 Reading schema file: {}", artifact.source);
    println!("⚙️  Executing database schema...");
    info!(
        "Applying schema from {} ({} bytes)",
        artifact.source,
        artifact.size_bytes()
    );

    sqlx::raw_sql(&artifact.sql)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to apply schema from {}", artifact.source))?;

    println!("✅ Migration completed successfully!");
    info!("Schema applied from {}", artifact.source);

    Ok(SchemaLoad {
        source: artifact.source.clone(),
        size_bytes: artifact.size_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_from_file_reads_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CREATE TABLE IF NOT EXISTS t (id INT);").unwrap();

        let artifact = SchemaArtifact::from_file(file.path()).await.unwrap();
        assert_eq!(artifact.source, SchemaSource::File(file.path().to_path_buf()));
        assert!(artifact.sql.contains("CREATE TABLE IF NOT EXISTS t"));
    }

    #[tokio::test]
    async fn test_empty_artifact_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   \n\t").unwrap();

        let err = SchemaArtifact::from_file(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.sql");
        let err = SchemaArtifact::resolve(Some(&missing)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read schema file"));
    }

    #[test]
    fn test_bundled_schema_is_guarded() {
        let artifact = SchemaArtifact::bundled().unwrap();
        assert_eq!(artifact.source, SchemaSource::Bundled);

        for line in artifact.sql.lines().map(str::trim) {
            if line.starts_with("CREATE TABLE") {
                assert!(line.starts_with("CREATE TABLE IF NOT EXISTS"), "{}", line);
            }
            if line.starts_with("CREATE INDEX") {
                assert!(line.starts_with("CREATE INDEX IF NOT EXISTS idx_"), "{}", line);
            }
        }
        assert!(artifact.sql.contains("EXCEPTION WHEN duplicate_object"));
    }
}
