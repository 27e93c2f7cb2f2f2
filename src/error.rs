use std::fmt::Write as _;

use uuid::Uuid;

use crate::model::EntityKind;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("{}", multiline("Not found", .0))]
    NotFound(String),
    #[error("{}", multiline("Conflict", .0))]
    Conflict(String),
    #[error("{}", missing_references(.kind, .ids))]
    MissingReferences { kind: EntityKind, ids: Vec<Uuid> },
    #[error("{}", multiline("Invalid input", .0))]
    InvalidInput(String),
}

impl AppError {
    /// Stable machine-readable discriminator for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Io(_) => "io",
            AppError::Db(_) => "database",
            AppError::Json(_) => "json",
            AppError::Config(_) => "config",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::MissingReferences { .. } => "missing_references",
            AppError::InvalidInput(_) => "invalid_input",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound(_) => 3,
            AppError::Conflict(_) => 4,
            AppError::MissingReferences { .. } => 5,
            AppError::InvalidInput(_) => 6,
            AppError::Io(_) | AppError::Db(_) | AppError::Json(_) | AppError::Config(_) => 1,
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(value.to_string())
    }
}

fn multiline(label: &str, message: &str) -> String {
    if message.contains('\n') {
        format!("{label}:\n{message}")
    } else {
        format!("{label}: {message}")
    }
}

fn missing_references(kind: &EntityKind, ids: &[Uuid]) -> String {
    let mut output = format!("Missing references: {} ", kind.as_str());
    for (idx, id) in ids.iter().enumerate() {
        if idx > 0 {
            output.push_str(", ");
        }
        let _ = write!(output, "{id}");
    }
    output
}
