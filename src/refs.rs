//! Batch foreign-key checks run before any insert that carries references.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{body_category, exercise_item, plan_exercise, profile, training_plan};
use crate::error::AppError;
use crate::model::EntityKind;

// Well under SQLite's bound-parameter limit.
const ID_CHUNK: usize = 500;

/// An entity other rows may point at by id.
pub trait Referenced: EntityTrait {
    const KIND: EntityKind;

    fn id_column() -> Self::Column;
}

impl Referenced for profile::Entity {
    const KIND: EntityKind = EntityKind::Profile;

    fn id_column() -> Self::Column {
        profile::Column::Id
    }
}

impl Referenced for body_category::Entity {
    const KIND: EntityKind = EntityKind::BodyCategory;

    fn id_column() -> Self::Column {
        body_category::Column::Id
    }
}

impl Referenced for exercise_item::Entity {
    const KIND: EntityKind = EntityKind::ExerciseItem;

    fn id_column() -> Self::Column {
        exercise_item::Column::Id
    }
}

impl Referenced for training_plan::Entity {
    const KIND: EntityKind = EntityKind::TrainingPlan;

    fn id_column() -> Self::Column {
        training_plan::Column::Id
    }
}

impl Referenced for plan_exercise::Entity {
    const KIND: EntityKind = EntityKind::PlanExercise;

    fn id_column() -> Self::Column {
        plan_exercise::Column::Id
    }
}

/// Confirms every id exists in `entity`'s table. Fails once with all of the
/// missing ids rather than stopping at the first.
pub async fn ensure_exist<C, E>(db: &C, _entity: E, ids: &[Uuid]) -> Result<(), AppError>
where
    C: ConnectionTrait,
    E: Referenced,
{
    let wanted = unique_ids(ids);
    if wanted.is_empty() {
        return Ok(());
    }

    let mut found = HashSet::with_capacity(wanted.len());
    for chunk in wanted.chunks(ID_CHUNK) {
        let rows: Vec<Uuid> = E::find()
            .select_only()
            .column(E::id_column())
            .filter(E::id_column().is_in(chunk.to_vec()))
            .into_tuple()
            .all(db)
            .await?;
        found.extend(rows);
    }

    ensure_known(E::KIND, &wanted, &found)
}

/// Same batch semantics as [`ensure_exist`], against ids already in memory.
pub fn ensure_known(kind: EntityKind, ids: &[Uuid], known: &HashSet<Uuid>) -> Result<(), AppError> {
    let missing: Vec<Uuid> = unique_ids(ids)
        .into_iter()
        .filter(|id| !known.contains(id))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    tracing::debug!(kind = kind.as_str(), count = missing.len(), "missing references");
    Err(AppError::MissingReferences { kind, ids: missing })
}

/// Deduplicates while keeping first-seen order.
pub fn unique_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for id in ids {
        if seen.insert(*id) {
            unique.push(*id);
        }
    }
    unique
}
