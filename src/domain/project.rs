use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "On Hold")]
    OnHold,
    Active,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [Self::OnHold, Self::Active, Self::Completed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnHold => "On Hold",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the wire spelling.
impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid project status: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl ProjectPriority {
    pub const ALL: [ProjectPriority; 3] = [Self::Low, Self::Medium, Self::High];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for ProjectPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| format!("Invalid project priority: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    pub budget: f64,
    pub due_date: DateTime<Utc>,
}

impl Entity for Project {
    const ENTITY_NAME: &'static str = "project";
    const INDEX_NAME: &'static str = "projects";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn initial_state() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            status: ProjectStatus::OnHold,
            priority: ProjectPriority::Low,
            budget: 0.0,
            due_date: Utc::now(),
        }
    }

    fn seed_data() -> Vec<Self> {
        super::seed::seed_projects(Utc::now())
    }
}

/// Validated create payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    pub budget: f64,
    pub due_date: DateTime<Utc>,
}

impl NewProject {
    pub fn into_project(self, id: String) -> Project {
        Project {
            id,
            name: self.name,
            status: self.status,
            priority: self.priority,
            budget: self.budget,
            due_date: self.due_date,
        }
    }
}

/// Validated update payload; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    pub budget: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
}

impl ProjectPatch {
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.status.is_some()
            || self.priority.is_some()
            || self.budget.is_some()
            || self.due_date.is_some()
    }

    /// Merge the present fields over `project`. The id is never touched.
    pub fn apply(self, mut project: Project) -> Project {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
        }
        if let Some(budget) = self.budget {
            project.budget = budget;
        }
        if let Some(due_date) = self.due_date {
            project.due_date = due_date;
        }
        project
    }
}

/// Headline figures shown on the dashboard home page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub total_projects: usize,
    pub total_budget: f64,
    pub active: usize,
    pub completed: usize,
    pub on_hold: usize,
}

impl ProjectSummary {
    pub fn from_projects(projects: &[Project]) -> Self {
        projects
            .iter()
            .fold(Self::default(), |mut summary, project| {
                summary.total_projects += 1;
                summary.total_budget += project.budget;
                match project.status {
                    ProjectStatus::Active => summary.active += 1,
                    ProjectStatus::Completed => summary.completed += 1,
                    ProjectStatus::OnHold => summary.on_hold += 1,
                }
                summary
            })
    }
}
