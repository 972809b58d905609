// src/verify.rs
//! Read-only catalog introspection run after a schema load

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use std::fmt;
use tracing::info;

/// Tables the shipped schema is expected to create
pub const EXPECTED_TABLES: &[&str] = &[
    "applications",
    "blog_categories",
    "blogs",
    "companies",
    "jobs",
    "skills",
    "user_skills",
    "users",
];

const TABLES_QUERY: &str = r#"
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema = 'public'
    ORDER BY table_name
"#;

const ENUM_TYPES_QUERY: &str = r#"
    SELECT typname::text
    FROM pg_type
    WHERE typtype = 'e'
    ORDER BY typname
"#;

const INDEXES_QUERY: &str = r#"
    SELECT indexname::text
    FROM pg_indexes
    WHERE schemaname = 'public'
    AND indexname LIKE 'idx_%'
    ORDER BY indexname
"#;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaReport {
    pub tables: Vec<String>,
    pub enum_types: Vec<String>,
    pub indexes: Vec<String>,
}

impl SchemaReport {
    /// Expected tables absent from the catalog
    pub fn missing_tables(&self) -> Vec<&'static str> {
        EXPECTED_TABLES
            .iter()
            .copied()
            .filter(|expected| !self.tables.iter().any(|t| t == expected))
            .collect()
    }
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(f, "📊 Tables created:", &self.tables)?;
        writeln!(f)?;
        write_section(f, "🏷️  ENUM types created:", &self.enum_types)?;
        writeln!(f)?;
        write_section(f, "🔍 Indexes created:", &self.indexes)
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, heading: &str, names: &[String]) -> fmt::Result {
    writeln!(f, "{}", heading)?;
    for (index, name) in names.iter().enumerate() {
        writeln!(f, "   {}. {}", index + 1, name)?;
    }
    Ok(())
}

/// Run the three introspection queries
pub async fn inspect(pool: &PgPool) -> Result<SchemaReport> {
    let tables = list_names(pool, TABLES_QUERY)
        .await
        .context("Failed to list tables")?;
    let enum_types = list_names(pool, ENUM_TYPES_QUERY)
        .await
        .context("Failed to list enum types")?;
    let indexes = list_names(pool, INDEXES_QUERY)
        .await
        .context("Failed to list indexes")?;

    info!(
        "Schema inspected: {} tables, {} enum types, {} indexes",
        tables.len(),
        enum_types.len(),
        indexes.len()
    );

    Ok(SchemaReport {
        tables,
        enum_types,
        indexes,
    })
}

async fn list_names(pool: &PgPool, query: &str) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(query)
        .fetch_all(pool)
        .await?;
    Ok(names)
}
