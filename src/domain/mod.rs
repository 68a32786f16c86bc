pub mod project;
pub mod seed;
pub mod validation;

pub use project::{
    NewProject, Project, ProjectPatch, ProjectPriority, ProjectStatus, ProjectSummary,
};
pub use seed::seed_projects;
pub use validation::{
    FieldRule, PROJECT_RULES, ValidationError, ValidationMode, parse_new_project,
    parse_project_patch, validate_fields,
};
