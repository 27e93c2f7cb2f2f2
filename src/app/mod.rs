mod catalog;
mod completions;
mod plans;
mod sync;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, QueryFilter,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::refs::Referenced;

pub use plans::{ExerciseDetail, PlanDetail};

// Rows per multi-row INSERT; keeps the widest table under 999 bound parameters.
const INSERT_CHUNK: usize = 50;

/// Entry point for every store operation. Holds the one connection handle the
/// process opened at startup; each public method runs in its own transaction.
pub struct App {
    db: DatabaseConnection,
}

impl App {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

async fn finalize_transaction<T>(
    txn: DatabaseTransaction,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                return Err(rollback_err.into());
            }
            Err(err)
        }
    }
}

/// Rejects `value` when another row of `entity` already holds it in `column`.
/// `except` excludes the row being updated.
async fn ensure_unique<C, E>(
    db: &C,
    _entity: E,
    column: E::Column,
    value: &str,
    except: Option<Uuid>,
) -> Result<(), AppError>
where
    C: ConnectionTrait,
    E: Referenced,
{
    let mut select = E::find().filter(column.eq(value));
    if let Some(id) = except {
        select = select.filter(E::id_column().ne(id));
    }
    if select.one(db).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "{} '{value}' already exists",
            E::KIND.as_str()
        )));
    }
    Ok(())
}

async fn insert_chunked<C, A>(db: &C, rows: Vec<A>) -> Result<u64, AppError>
where
    C: ConnectionTrait,
    A: ActiveModelTrait,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let mut inserted = 0;
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        let chunk: Vec<A> = rows.by_ref().take(INSERT_CHUNK).collect();
        inserted += <A::Entity as EntityTrait>::insert_many(chunk)
            .exec_without_returning(db)
            .await?;
    }
    Ok(inserted)
}

fn ensure_non_empty(label: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{label} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn not_found(kind: crate::model::EntityKind, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} id {id}", kind.as_str()))
}

#[cfg(test)]
pub(crate) mod testing {
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::{App, PlanDetail};
    use crate::db;
    use crate::entities::{body_category, exercise_item, profile};
    use crate::model::{ExerciseItemInput, ExerciseSpec, PlanInput, ProfileInput};

    pub async fn setup_app() -> (TempDir, App) {
        crate::logging::init_test();
        let dir = TempDir::new().expect("temp dir");
        let db_path = dir.path().join("data").join("bearmode.db");
        db::ensure_parent_dir(&db_path).expect("ensure parent");
        let db = db::connect(&db_path).await.expect("connect db");
        db::ensure_schema(&db).await.expect("ensure schema");
        (dir, App::new(db))
    }

    pub async fn create_profile(app: &App, name: &str) -> profile::Model {
        app.add_profile(ProfileInput {
            name: name.to_string(),
            emoji: None,
        })
        .await
        .expect("add profile")
    }

    pub async fn create_category(app: &App, name: &str) -> body_category::Model {
        app.add_category(name).await.expect("add category")
    }

    pub async fn create_item(app: &App, description: &str, category_id: Uuid) -> exercise_item::Model {
        app.add_item(ExerciseItemInput {
            description: description.to_string(),
            video_url: None,
            body_category_id: category_id,
        })
        .await
        .expect("add item")
    }

    pub fn exercise(item_id: Uuid, order: i32, sets: i32, reps: i32) -> ExerciseSpec {
        ExerciseSpec {
            order,
            equipment: None,
            sets: Some(sets),
            reps: Some(reps),
            break_time_seconds: 60,
            exercise_item_id: item_id,
        }
    }

    pub async fn create_plan(
        app: &App,
        name: &str,
        profile_id: Uuid,
        exercises: Vec<ExerciseSpec>,
    ) -> PlanDetail {
        app.create_plan(PlanInput {
            name: name.to_string(),
            profile_id,
            exercises,
        })
        .await
        .expect("create plan")
    }
}
