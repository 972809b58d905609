// src/seed.rs
//! Sample data for a freshly migrated database
//!
//! Rows go in as skills, users, one company, then its jobs. The recruiter id
//! returned by the user insert (or looked up when no recruiter was newly
//! inserted) owns the company, and the company id returned by that insert
//! owns the jobs. The whole sequence runs in one transaction.

use anyhow::{Context, Result};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::Database;
use crate::models::{Company, InsertedUser, Job, JobType, UserRole, WorkLocation};

/// How company and job rows behave when the seed has already run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Always insert the company and jobs; repeated runs duplicate them.
    #[default]
    Append,
    /// Reuse the company and skip jobs that already exist for it.
    SkipExisting,
}

pub struct SeedUser {
    pub name: &'static str,
    pub email: &'static str,
    pub password_hash: &'static str,
    pub phone: &'static str,
    pub role: UserRole,
    pub bio: &'static str,
}

pub struct SeedCompany {
    pub name: &'static str,
    pub description: &'static str,
    pub website: &'static str,
}

pub struct SeedJob {
    pub title: &'static str,
    pub description: &'static str,
    pub salary: &'static str,
    pub location: &'static str,
    pub job_type: JobType,
    pub work_location: WorkLocation,
    pub openings: i32,
    pub required_skills: &'static [&'static str],
}

// Placeholder, not a usable bcrypt hash: seeded accounts cannot log in.
const PLACEHOLDER_HASH: &str = "$2a$10$abcdefghijklmnopqrstuvwxyz";

pub const SKILLS: &[&str] = &[
    "JavaScript",
    "TypeScript",
    "React",
    "Node.js",
    "Go",
    "PostgreSQL",
    "Docker",
    "Kubernetes",
    "AWS",
    "Python",
];

pub const USERS: &[SeedUser] = &[
    SeedUser {
        name: "John Doe",
        email: "john@example.com",
        password_hash: PLACEHOLDER_HASH,
        phone: "+1234567890",
        role: UserRole::Jobseeker,
        bio: "Experienced software developer",
    },
    SeedUser {
        name: "Jane Smith",
        email: "jane@example.com",
        password_hash: PLACEHOLDER_HASH,
        phone: "+1234567891",
        role: UserRole::Recruiter,
        bio: "Tech recruiter at top companies",
    },
    SeedUser {
        name: "Bob Wilson",
        email: "bob@example.com",
        password_hash: PLACEHOLDER_HASH,
        phone: "+1234567892",
        role: UserRole::Jobseeker,
        bio: "Frontend specialist",
    },
];

pub const COMPANY: SeedCompany = SeedCompany {
    name: "Tech Innovators Inc",
    description: "Leading technology company specializing in AI and cloud solutions",
    website: "https://techinnovators.example.com",
};

pub const JOBS: &[SeedJob] = &[
    SeedJob {
        title: "Senior Full Stack Developer",
        description: "# Job Description\n\nWe are looking for an experienced Full Stack Developer...\n\n## Requirements\n- 5+ years experience\n- Proficient in React and Node.js",
        salary: "$120,000 - $150,000",
        location: "San Francisco, CA",
        job_type: JobType::FullTime,
        work_location: WorkLocation::Hybrid,
        openings: 2,
        required_skills: &["JavaScript", "TypeScript", "React", "Node.js"],
    },
    SeedJob {
        title: "Junior Frontend Developer",
        description: "# Join Our Team!\n\nGreat opportunity for a junior developer to grow...",
        salary: "$60,000 - $80,000",
        location: "Remote",
        job_type: JobType::FullTime,
        work_location: WorkLocation::Remote,
        openings: 1,
        required_skills: &["JavaScript", "React"],
    },
];

#[derive(Debug, Clone)]
pub struct CompanyOutcome {
    pub company: Company,
    pub created: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub skills_inserted: Vec<String>,
    pub users_inserted: Vec<InsertedUser>,
    pub recruiter_id: Option<Uuid>,
    pub company: Option<CompanyOutcome>,
    pub jobs_inserted: Vec<Job>,
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 Summary:")?;
        writeln!(f, "   - Skills added: {}", self.skills_inserted.len())?;
        writeln!(f, "   - Users added:  {}", self.users_inserted.len())?;
        match &self.company {
            Some(outcome) if outcome.created => {
                writeln!(f, "   - Company:      {} (created)", outcome.company.name)?
            }
            Some(outcome) => {
                writeln!(f, "   - Company:      {} (existing)", outcome.company.name)?
            }
            None => writeln!(f, "   - Company:      skipped (no recruiter found)")?,
        }
        write!(f, "   - Jobs added:   {}", self.jobs_inserted.len())
    }
}

/// Seed the database in a single transaction.
///
/// A failing step rolls back every insert made earlier in the same run.
pub async fn run(db: &Database, policy: SeedPolicy) -> Result<SeedReport> {
    println!("🌱 Seeding database with sample data...");
    info!("Seeding database with policy {:?}", policy);

    let report = db
        .transaction(|conn| Box::pin(seed_all(conn, policy)))
        .await
        .context("Seeding failed")?;

    println!("✨ Database seeded successfully!");
    println!("{}", report);
    Ok(report)
}

async fn seed_all(conn: &mut PgConnection, policy: SeedPolicy) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    println!("📝 Adding skills...");
    report.skills_inserted = insert_skills(conn).await?;
    println!("   ✓ Added {} skills", report.skills_inserted.len());

    println!("👥 Adding sample users...");
    report.users_inserted = insert_users(conn).await?;
    println!("   ✓ Added {} users", report.users_inserted.len());

    report.recruiter_id = resolve_recruiter(conn, &report.users_inserted).await?;
    let Some(recruiter_id) = report.recruiter_id else {
        println!("⚠️  No recruiter found, skipping company and jobs");
        info!("No recruiter-role user exists; company and jobs not seeded");
        return Ok(report);
    };

    println!("🏢 Adding sample company...");
    let outcome = insert_company(conn, recruiter_id, policy).await?;
    if outcome.created {
        println!("   ✓ Added company: {}", outcome.company.name);
    } else {
        println!("   ✓ Reusing company: {}", outcome.company.name);
    }

    println!("💼 Adding sample jobs...");
    report.jobs_inserted = insert_jobs(conn, outcome.company.id, recruiter_id, policy).await?;
    println!("   ✓ Added {} jobs", report.jobs_inserted.len());

    report.company = Some(outcome);
    Ok(report)
}

async fn insert_skills(conn: &mut PgConnection) -> Result<Vec<String>> {
    let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO skills (name) ");
    builder.push_values(SKILLS, |mut row, name| {
        row.push_bind(*name);
    });
    builder.push(" ON CONFLICT (name) DO NOTHING RETURNING name");

    let inserted = builder
        .build_query_scalar::<String>()
        .fetch_all(&mut *conn)
        .await
        .context("Failed to insert skills")?;

    debug!("Inserted skills: {:?}", inserted);
    Ok(inserted)
}

async fn insert_users(conn: &mut PgConnection) -> Result<Vec<InsertedUser>> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO users (name, email, password_hash, phone, role, bio) ",
    );
    builder.push_values(USERS, |mut row, user| {
        row.push_bind(user.name)
            .push_bind(user.email)
            .push_bind(user.password_hash)
            .push_bind(user.phone)
            .push_bind(user.role)
            .push_bind(user.bio);
    });
    builder.push(" ON CONFLICT (email) DO NOTHING RETURNING id, email, role");

    let inserted = builder
        .build_query_as::<InsertedUser>()
        .fetch_all(&mut *conn)
        .await
        .context("Failed to insert users")?;

    debug!("Inserted users: {:?}", inserted);
    Ok(inserted)
}

/// Prefer a recruiter inserted by this run, else the earliest existing one.
async fn resolve_recruiter(
    conn: &mut PgConnection,
    inserted: &[InsertedUser],
) -> Result<Option<Uuid>> {
    if let Some(id) = first_recruiter(inserted) {
        return Ok(Some(id));
    }

    let existing = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM users
        WHERE role = 'recruiter'
        ORDER BY created_at ASC, email ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to look up a recruiter")?;

    Ok(existing)
}

fn first_recruiter(inserted: &[InsertedUser]) -> Option<Uuid> {
    inserted
        .iter()
        .find(|user| user.role == UserRole::Recruiter)
        .map(|user| user.id)
}

async fn insert_company(
    conn: &mut PgConnection,
    recruiter_id: Uuid,
    policy: SeedPolicy,
) -> Result<CompanyOutcome> {
    if policy == SeedPolicy::SkipExisting {
        let existing = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, recruiter_id, created_at
            FROM companies
            WHERE name = $1 AND recruiter_id = $2
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(COMPANY.name)
        .bind(recruiter_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up existing company")?;

        if let Some(company) = existing {
            return Ok(CompanyOutcome {
                company,
                created: false,
            });
        }
    }

    let company = sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (name, description, website, recruiter_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, recruiter_id, created_at
        "#,
    )
    .bind(COMPANY.name)
    .bind(COMPANY.description)
    .bind(COMPANY.website)
    .bind(recruiter_id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to insert company")?;

    info!("Created company {} ({})", company.name, company.id);
    Ok(CompanyOutcome {
        company,
        created: true,
    })
}

async fn insert_jobs(
    conn: &mut PgConnection,
    company_id: Uuid,
    recruiter_id: Uuid,
    policy: SeedPolicy,
) -> Result<Vec<Job>> {
    let existing = match policy {
        SeedPolicy::Append => Vec::new(),
        SeedPolicy::SkipExisting => {
            let titles: Vec<&str> = JOBS.iter().map(|job| job.title).collect();
            sqlx::query_scalar::<_, String>(
                "SELECT title FROM jobs WHERE company_id = $1 AND title = ANY($2)",
            )
            .bind(company_id)
            .bind(&titles)
            .fetch_all(&mut *conn)
            .await
            .context("Failed to look up existing jobs")?
        }
    };

    let pending = jobs_to_insert(&existing);
    if pending.is_empty() {
        debug!("All sample jobs already exist for company {}", company_id);
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO jobs (title, description, salary, location, job_type, work_location, \
         openings, required_skills, company_id, recruiter_id) ",
    );
    builder.push_values(pending, |mut row, job| {
        row.push_bind(job.title)
            .push_bind(job.description)
            .push_bind(job.salary)
            .push_bind(job.location)
            .push_bind(job.job_type)
            .push_bind(job.work_location)
            .push_bind(job.openings)
            .push_bind(job.required_skills)
            .push_bind(company_id)
            .push_bind(recruiter_id);
    });
    builder.push(
        " RETURNING id, title, company_id, recruiter_id, job_type, work_location, \
         openings, required_skills",
    );

    let inserted = builder
        .build_query_as::<Job>()
        .fetch_all(&mut *conn)
        .await
        .context("Failed to insert jobs")?;

    debug!(
        "Inserted jobs: {:?}",
        inserted.iter().map(|job| &job.title).collect::<Vec<_>>()
    );
    Ok(inserted)
}

fn jobs_to_insert(existing_titles: &[String]) -> Vec<&'static SeedJob> {
    JOBS.iter()
        .filter(|job| !existing_titles.iter().any(|title| title == job.title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_users_have_unique_emails_and_one_recruiter() {
        let mut emails: Vec<&str> = USERS.iter().map(|u| u.email).collect();
        emails.sort_unstable();
        emails.dedup();
        assert_eq!(emails.len(), USERS.len());

        let recruiters: Vec<&str> = USERS
            .iter()
            .filter(|u| u.role == UserRole::Recruiter)
            .map(|u| u.email)
            .collect();
        assert_eq!(recruiters, vec!["jane@example.com"]);
    }

    #[test]
    fn test_job_skills_are_seeded_skills() {
        for job in JOBS {
            for skill in job.required_skills {
                assert!(SKILLS.contains(skill), "{} requires unknown skill {}", job.title, skill);
            }
            assert!(job.openings >= 1);
        }
    }

    #[test]
    fn test_first_recruiter_prefers_inserted_rows() {
        let recruiter = Uuid::new_v4();
        let inserted = vec![
            InsertedUser {
                id: Uuid::new_v4(),
                email: "john@example.com".to_string(),
                role: UserRole::Jobseeker,
            },
            InsertedUser {
                id: recruiter,
                email: "jane@example.com".to_string(),
                role: UserRole::Recruiter,
            },
        ];
        assert_eq!(first_recruiter(&inserted), Some(recruiter));
        assert_eq!(first_recruiter(&inserted[..1]), None);
        assert_eq!(first_recruiter(&[]), None);
    }

    #[test]
    fn test_jobs_to_insert_skips_existing_titles() {
        assert_eq!(jobs_to_insert(&[]).len(), JOBS.len());

        let pending = jobs_to_insert(&["Senior Full Stack Developer".to_string()]);
        let titles: Vec<&str> = pending.iter().map(|job| job.title).collect();
        assert_eq!(titles, vec!["Junior Frontend Developer"]);

        let all: Vec<String> = JOBS.iter().map(|job| job.title.to_string()).collect();
        assert!(jobs_to_insert(&all).is_empty());
    }

    #[test]
    fn test_report_summary_without_company() {
        let report = SeedReport {
            skills_inserted: vec!["Go".to_string()],
            ..SeedReport::default()
        };
        let rendered = report.to_string();
        assert!(rendered.contains("Skills added: 1"));
        assert!(rendered.contains("Users added:  0"));
        assert!(rendered.contains("skipped (no recruiter found)"));
        assert!(rendered.ends_with("Jobs added:   0"));
    }
}
