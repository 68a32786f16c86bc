use chrono::{DateTime, Duration, SubsecRound, Utc};

use super::project::{Project, ProjectPriority, ProjectStatus};

/// (id, name, status, priority, budget, due date offset in days)
const SEED_PROJECTS: &[(&str, &str, ProjectStatus, ProjectPriority, f64, i64)] = &[
    (
        "proj_1",
        "Nexus Dashboard UI Revamp",
        ProjectStatus::Active,
        ProjectPriority::High,
        120_000.0,
        30,
    ),
    (
        "proj_2",
        "Edge API Gateway Integration",
        ProjectStatus::Active,
        ProjectPriority::High,
        75_000.0,
        60,
    ),
    (
        "proj_3",
        "Durable Object Storage Layer",
        ProjectStatus::Completed,
        ProjectPriority::Medium,
        95_000.0,
        -15,
    ),
    (
        "proj_4",
        "Q3 Marketing Campaign Assets",
        ProjectStatus::OnHold,
        ProjectPriority::Low,
        30_000.0,
        90,
    ),
    (
        "proj_5",
        "Internal Tooling CLI",
        ProjectStatus::Active,
        ProjectPriority::Medium,
        45_000.0,
        45,
    ),
    (
        "proj_6",
        "Customer Onboarding Flow",
        ProjectStatus::Completed,
        ProjectPriority::High,
        82_000.0,
        -5,
    ),
    (
        "proj_7",
        "Security Audit & Compliance",
        ProjectStatus::Active,
        ProjectPriority::High,
        150_000.0,
        120,
    ),
];

/// Demonstration projects with due dates relative to `now`.
pub fn seed_projects(now: DateTime<Utc>) -> Vec<Project> {
    let now = now.trunc_subsecs(0);
    SEED_PROJECTS
        .iter()
        .map(|&(id, name, status, priority, budget, offset)| Project {
            id: id.to_string(),
            name: name.to_string(),
            status,
            priority,
            budget,
            due_date: now + Duration::days(offset),
        })
        .collect()
}
