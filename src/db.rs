use std::fs::{self, File, OpenOptions};
use std::path::Path;

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, EntityTrait, Schema, Statement,
};
use url::Url;

use crate::entities::{
    body_category, exercise_completion, exercise_item, plan_completion, plan_exercise, profile,
    training_plan,
};
use crate::error::AppError;

pub fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Advisory lock file next to the database. Holding its write guard keeps
/// other processes out for the duration of one command.
pub fn open_lock(path: &Path) -> Result<fd_lock::RwLock<File>, AppError> {
    let lock_path = path.with_extension("lock");
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path)?;
    Ok(fd_lock::RwLock::new(file))
}

pub async fn connect(path: &Path) -> Result<DatabaseConnection, AppError> {
    let mut url = Url::from_file_path(path)
        .map_err(|_| AppError::Config(format!("invalid sqlite path: {}", path.display())))?;
    url.set_query(Some("mode=rwc"));
    let sqlite_url = url.as_str().replacen("file://", "sqlite://", 1);
    tracing::debug!(url = %sqlite_url, "connecting to database");
    Ok(Database::connect(&sqlite_url).await?)
}

pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), AppError> {
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "PRAGMA foreign_keys = ON;",
    ))
    .await?;

    // Dependency order, so every referenced table exists first.
    create_table(db, profile::Entity).await?;
    create_table(db, body_category::Entity).await?;
    create_table(db, training_plan::Entity).await?;
    create_table(db, exercise_item::Entity).await?;
    create_table(db, plan_exercise::Entity).await?;
    create_table(db, plan_completion::Entity).await?;
    create_table(db, exercise_completion::Entity).await?;

    create_index(
        db,
        Index::create()
            .name("idx_plan_exercises_plan_order")
            .table(plan_exercise::Entity)
            .col(plan_exercise::Column::TrainingPlanId)
            .col(plan_exercise::Column::SortOrder)
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .name("idx_plan_exercises_item")
            .table(plan_exercise::Entity)
            .col(plan_exercise::Column::ExerciseItemId)
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .name("idx_exercise_items_category")
            .table(exercise_item::Entity)
            .col(exercise_item::Column::BodyCategoryId)
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .name("idx_training_plans_profile")
            .table(training_plan::Entity)
            .col(training_plan::Column::ProfileId)
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .name("idx_plan_completions_profile_day")
            .table(plan_completion::Entity)
            .col(plan_completion::Column::ProfileId)
            .col(plan_completion::Column::TrainingDay)
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .name("idx_exercise_completions_profile_day")
            .table(exercise_completion::Entity)
            .col(exercise_completion::Column::ProfileId)
            .col(exercise_completion::Column::TrainingDay)
            .to_owned(),
    )
    .await?;

    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), AppError> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(builder.build(&stmt)).await?;
    Ok(())
}

async fn create_index(
    db: &DatabaseConnection,
    mut stmt: IndexCreateStatement,
) -> Result<(), AppError> {
    let builder = db.get_database_backend();
    stmt.if_not_exists();
    db.execute(builder.build(&stmt)).await?;
    Ok(())
}
