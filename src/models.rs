// src/models.rs
//! Row types for the job-board schema

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Jobseeker,
    Recruiter,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "job_type", rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "work_location", rename_all = "lowercase")]
pub enum WorkLocation {
    Remote,
    Onsite,
    Hybrid,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InsertedUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub recruiter_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company_id: Uuid,
    pub recruiter_id: Uuid,
    pub job_type: JobType,
    pub work_location: WorkLocation,
    pub openings: i32,
    pub required_skills: Vec<String>,
}
