use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder, TransactionTrait};
use uuid::Uuid;

use super::{ensure_non_empty, finalize_transaction, insert_chunked, App};
use crate::entities::{
    body_category, exercise_completion, exercise_item, plan_completion, plan_exercise, profile,
    training_plan,
};
use crate::error::AppError;
use crate::model::{floor_count, normalize_optional_text, EntityKind};
use crate::refs;
use crate::snapshot::Snapshot;

impl App {
    /// Reads every table in a stable order so two exports of the same data
    /// serialize identically.
    pub async fn export(&self) -> Result<Snapshot, AppError> {
        let txn = self.db.begin().await?;
        let result = read_all(&txn).await;
        let snapshot = finalize_transaction(txn, result).await?;
        tracing::info!(rows = snapshot.total_rows(), "snapshot exported");
        Ok(snapshot)
    }

    /// Replaces the whole database with `snapshot`. The snapshot is checked
    /// before anything is deleted; a failure at any later point rolls back to
    /// the previous contents.
    pub async fn import(&self, snapshot: Snapshot) -> Result<u64, AppError> {
        let snapshot = validate_snapshot(snapshot)?;

        let txn = self.db.begin().await?;
        let result: Result<u64, AppError> = async {
            let wiped = wipe_all(&txn).await?;
            tracing::debug!(wiped, "existing rows cleared");
            load_all(&txn, &snapshot).await
        }
        .await;

        let inserted = finalize_transaction(txn, result).await?;
        tracing::info!(inserted, "snapshot imported");
        Ok(inserted)
    }
}

async fn read_all<C: ConnectionTrait>(db: &C) -> Result<Snapshot, AppError> {
    let profiles = profile::Entity::find()
        .order_by_asc(profile::Column::Name)
        .all(db)
        .await?;
    let body_categories = body_category::Entity::find()
        .order_by_asc(body_category::Column::Name)
        .all(db)
        .await?;
    let exercise_items = exercise_item::Entity::find()
        .order_by_asc(exercise_item::Column::Description)
        .all(db)
        .await?;
    let training_plans = training_plan::Entity::find()
        .order_by_asc(training_plan::Column::Name)
        .all(db)
        .await?;
    let plan_exercises = plan_exercise::Entity::find()
        .order_by_asc(plan_exercise::Column::TrainingPlanId)
        .order_by_asc(plan_exercise::Column::SortOrder)
        .order_by_asc(plan_exercise::Column::Id)
        .all(db)
        .await?;
    let training_plan_completions = plan_completion::Entity::find()
        .order_by_asc(plan_completion::Column::TrainingDay)
        .order_by_asc(plan_completion::Column::CreatedAt)
        .order_by_asc(plan_completion::Column::Id)
        .all(db)
        .await?;
    let exercise_completions = exercise_completion::Entity::find()
        .order_by_asc(exercise_completion::Column::TrainingDay)
        .order_by_asc(exercise_completion::Column::CreatedAt)
        .order_by_asc(exercise_completion::Column::SortOrder)
        .order_by_asc(exercise_completion::Column::Id)
        .all(db)
        .await?;

    Ok(Snapshot {
        profiles: profiles.into_iter().map(Into::into).collect(),
        body_categories: body_categories.into_iter().map(Into::into).collect(),
        exercise_items: exercise_items.into_iter().map(Into::into).collect(),
        training_plans: training_plans.into_iter().map(Into::into).collect(),
        plan_exercises: plan_exercises.into_iter().map(Into::into).collect(),
        training_plan_completions: training_plan_completions
            .into_iter()
            .map(Into::into)
            .collect(),
        exercise_completions: exercise_completions.into_iter().map(Into::into).collect(),
    })
}

// Dependents first.
async fn wipe_all<C: ConnectionTrait>(db: &C) -> Result<u64, AppError> {
    let mut wiped = 0;
    wiped += exercise_completion::Entity::delete_many()
        .exec(db)
        .await?
        .rows_affected;
    wiped += plan_completion::Entity::delete_many()
        .exec(db)
        .await?
        .rows_affected;
    wiped += plan_exercise::Entity::delete_many()
        .exec(db)
        .await?
        .rows_affected;
    wiped += training_plan::Entity::delete_many()
        .exec(db)
        .await?
        .rows_affected;
    wiped += exercise_item::Entity::delete_many()
        .exec(db)
        .await?
        .rows_affected;
    wiped += body_category::Entity::delete_many()
        .exec(db)
        .await?
        .rows_affected;
    wiped += profile::Entity::delete_many()
        .exec(db)
        .await?
        .rows_affected;
    Ok(wiped)
}

// Referenced kinds first; each phase completes before the next starts.
async fn load_all<C: ConnectionTrait>(db: &C, snapshot: &Snapshot) -> Result<u64, AppError> {
    let mut inserted = 0;
    inserted += insert_chunked(db, snapshot.profiles.iter().map(|r| r.to_row()).collect()).await?;
    inserted += insert_chunked(
        db,
        snapshot.body_categories.iter().map(|r| r.to_row()).collect(),
    )
    .await?;
    inserted += insert_chunked(
        db,
        snapshot.training_plans.iter().map(|r| r.to_row()).collect(),
    )
    .await?;
    inserted += insert_chunked(
        db,
        snapshot.exercise_items.iter().map(|r| r.to_row()).collect(),
    )
    .await?;
    inserted += insert_chunked(
        db,
        snapshot.plan_exercises.iter().map(|r| r.to_row()).collect(),
    )
    .await?;
    inserted += insert_chunked(
        db,
        snapshot
            .training_plan_completions
            .iter()
            .map(|r| r.to_row())
            .collect(),
    )
    .await?;
    inserted += insert_chunked(
        db,
        snapshot
            .exercise_completions
            .iter()
            .map(|r| r.to_row())
            .collect(),
    )
    .await?;
    Ok(inserted)
}

/// Checks a snapshot on its own terms and returns it with counts floored and
/// text trimmed. Completion rows only need distinct ids: the plans and
/// exercises they name may no longer exist.
pub(crate) fn validate_snapshot(mut snapshot: Snapshot) -> Result<Snapshot, AppError> {
    for record in &mut snapshot.profiles {
        record.name = ensure_non_empty("profile name", &record.name)?;
        record.emoji = normalize_optional_text(record.emoji.take());
    }
    for record in &mut snapshot.body_categories {
        record.name = ensure_non_empty("body category name", &record.name)?;
    }
    for record in &mut snapshot.exercise_items {
        record.description = ensure_non_empty("exercise description", &record.description)?;
        record.video_url = normalize_optional_text(record.video_url.take());
    }
    for record in &mut snapshot.training_plans {
        record.name = ensure_non_empty("plan name", &record.name)?;
    }
    for record in &mut snapshot.plan_exercises {
        if record.break_time_seconds < 0 {
            return Err(AppError::InvalidInput(format!(
                "break time cannot be negative (plan exercise {}, got {})",
                record.id, record.break_time_seconds
            )));
        }
        record.sets = floor_count(Some(record.sets));
        record.reps = floor_count(Some(record.reps));
        record.equipment = normalize_optional_text(record.equipment.take());
    }
    for record in &snapshot.training_plan_completions {
        if record.count_completed_exercises < 0 || record.count_open_exercises < 0 {
            return Err(AppError::InvalidInput(format!(
                "exercise counts cannot be negative (plan completion {})",
                record.id
            )));
        }
    }
    for record in &mut snapshot.exercise_completions {
        if record.break_time_seconds < 0 {
            return Err(AppError::InvalidInput(format!(
                "break time cannot be negative (exercise completion {}, got {})",
                record.id, record.break_time_seconds
            )));
        }
        record.reps = floor_count(Some(record.reps));
    }

    ensure_distinct(EntityKind::Profile, "id", snapshot.profiles.iter().map(|r| r.id))?;
    ensure_distinct(
        EntityKind::Profile,
        "name",
        snapshot.profiles.iter().map(|r| r.name.as_str()),
    )?;
    ensure_distinct(
        EntityKind::BodyCategory,
        "id",
        snapshot.body_categories.iter().map(|r| r.id),
    )?;
    ensure_distinct(
        EntityKind::BodyCategory,
        "name",
        snapshot.body_categories.iter().map(|r| r.name.as_str()),
    )?;
    ensure_distinct(
        EntityKind::ExerciseItem,
        "id",
        snapshot.exercise_items.iter().map(|r| r.id),
    )?;
    ensure_distinct(
        EntityKind::ExerciseItem,
        "description",
        snapshot.exercise_items.iter().map(|r| r.description.as_str()),
    )?;
    ensure_distinct(
        EntityKind::TrainingPlan,
        "id",
        snapshot.training_plans.iter().map(|r| r.id),
    )?;
    ensure_distinct(
        EntityKind::TrainingPlan,
        "name",
        snapshot.training_plans.iter().map(|r| r.name.as_str()),
    )?;
    ensure_distinct(
        EntityKind::PlanExercise,
        "id",
        snapshot.plan_exercises.iter().map(|r| r.id),
    )?;
    ensure_distinct(
        EntityKind::TrainingPlanCompletion,
        "id",
        snapshot.training_plan_completions.iter().map(|r| r.id),
    )?;
    ensure_distinct(
        EntityKind::ExerciseCompletion,
        "id",
        snapshot.exercise_completions.iter().map(|r| r.id),
    )?;

    let profile_ids: HashSet<Uuid> = snapshot.profiles.iter().map(|r| r.id).collect();
    let category_ids: HashSet<Uuid> = snapshot.body_categories.iter().map(|r| r.id).collect();
    let item_ids: HashSet<Uuid> = snapshot.exercise_items.iter().map(|r| r.id).collect();
    let plan_ids: HashSet<Uuid> = snapshot.training_plans.iter().map(|r| r.id).collect();

    refs::ensure_known(
        EntityKind::BodyCategory,
        &snapshot
            .exercise_items
            .iter()
            .map(|r| r.body_category_id)
            .collect::<Vec<_>>(),
        &category_ids,
    )?;
    refs::ensure_known(
        EntityKind::Profile,
        &snapshot
            .training_plans
            .iter()
            .map(|r| r.profile_id)
            .collect::<Vec<_>>(),
        &profile_ids,
    )?;
    refs::ensure_known(
        EntityKind::TrainingPlan,
        &snapshot
            .plan_exercises
            .iter()
            .map(|r| r.training_plan_id)
            .collect::<Vec<_>>(),
        &plan_ids,
    )?;
    refs::ensure_known(
        EntityKind::ExerciseItem,
        &snapshot
            .plan_exercises
            .iter()
            .map(|r| r.exercise_item_id)
            .collect::<Vec<_>>(),
        &item_ids,
    )?;

    Ok(snapshot)
}

fn ensure_distinct<T, I>(kind: EntityKind, field: &str, values: I) -> Result<(), AppError>
where
    T: Eq + Hash + Display,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    for value in values {
        if seen.contains(&value) {
            return Err(AppError::Conflict(format!(
                "duplicate {} {field} '{value}' in import",
                kind.as_str()
            )));
        }
        seen.insert(value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::app::testing::{
        create_category, create_item, create_plan, create_profile, exercise, setup_app,
    };
    use crate::model::{ExerciseCompletionInput, PlanCompletionInput};
    use crate::snapshot::{
        BodyCategoryRecord, ExerciseCompletionRecord, ExerciseItemRecord, PlanExerciseRecord,
        ProfileRecord, TrainingPlanRecord,
    };

    async fn populate(app: &App) {
        let alice = create_profile(app, "Alice").await;
        let bob = create_profile(app, "Bob").await;
        let chest = create_category(app, "Chest").await;
        let legs = create_category(app, "Legs").await;
        let pushups = create_item(app, "Pushups", chest.id).await;
        let squats = create_item(app, "Squats", legs.id).await;
        let push = create_plan(
            app,
            "Push Day",
            alice.id,
            vec![exercise(pushups.id, 1, 3, 10), exercise(pushups.id, 1, 2, 5)],
        )
        .await;
        create_plan(app, "Leg Day", bob.id, vec![exercise(squats.id, 1, 4, 8)]).await;

        let day = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        app.record_plan_completions(vec![PlanCompletionInput {
            profile_id: alice.id,
            training_plan_id: push.plan.id,
            training_plan_name: "Push Day".to_string(),
            count_completed_exercises: 2,
            count_open_exercises: 0,
            training_day: Some(day),
        }])
        .await
        .expect("plan completion");
        app.record_exercise_completions(vec![ExerciseCompletionInput {
            profile_id: alice.id,
            training_plan_id: push.plan.id,
            exercise_id: push.exercises[0].exercise.id,
            exercise_description: "Pushups".to_string(),
            exercise_video_url: None,
            body_category_id: Some(chest.id),
            body_category_name: Some("Chest".to_string()),
            order: 1,
            equipment: None,
            reps: Some(10),
            break_time_seconds: 60,
            training_day: Some(day),
        }])
        .await
        .expect("exercise completion");
    }

    fn small_snapshot() -> Snapshot {
        let profile = ProfileRecord {
            id: Uuid::now_v7(),
            name: "Carol".to_string(),
            emoji: None,
        };
        let category = BodyCategoryRecord {
            id: Uuid::now_v7(),
            name: "Back".to_string(),
        };
        let item = ExerciseItemRecord {
            id: Uuid::now_v7(),
            description: "Rows".to_string(),
            video_url: None,
            body_category_id: category.id,
        };
        let plan = TrainingPlanRecord {
            id: Uuid::now_v7(),
            name: "Pull Day".to_string(),
            profile_id: profile.id,
        };
        let plan_exercise = PlanExerciseRecord {
            id: Uuid::now_v7(),
            training_plan_id: plan.id,
            order: 1,
            equipment: None,
            sets: 3,
            reps: 12,
            break_time_seconds: 90,
            exercise_item_id: item.id,
        };
        Snapshot {
            profiles: vec![profile],
            body_categories: vec![category],
            exercise_items: vec![item],
            training_plans: vec![plan],
            plan_exercises: vec![plan_exercise],
            ..Snapshot::default()
        }
    }

    #[tokio::test]
    async fn export_import_export_is_identical() {
        let (_dir, app) = setup_app().await;
        populate(&app).await;

        let first = app.export().await.expect("first export");
        assert_eq!(first.total_rows(), 2 + 2 + 2 + 2 + 3 + 1 + 1);
        let inserted = app.import(first.clone()).await.expect("import");
        assert_eq!(inserted as usize, first.total_rows());
        let second = app.export().await.expect("second export");
        assert_eq!(first, second);

        let json = serde_json::to_string(&first).expect("serialize");
        let parsed: Snapshot = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, first);
    }

    #[tokio::test]
    async fn import_replaces_previous_contents() {
        let (_dir, app) = setup_app().await;
        populate(&app).await;

        app.import(small_snapshot()).await.expect("import");

        let profiles = app.list_profiles().await.expect("list profiles");
        let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Carol"]);
        let plans = app.list_plan_details().await.expect("list plans");
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].exercises[0].item.description, "Rows");
        let completions = plan_completion::Entity::find()
            .count(app.db())
            .await
            .expect("count completions");
        assert_eq!(completions, 0);
    }

    #[tokio::test]
    async fn rejected_import_leaves_store_unchanged() {
        let (_dir, app) = setup_app().await;
        populate(&app).await;
        let before = app.export().await.expect("export");

        let mut broken = small_snapshot();
        let missing = Uuid::now_v7();
        broken.plan_exercises[0].exercise_item_id = missing;
        let err = app.import(broken).await.unwrap_err();
        match err {
            AppError::MissingReferences { kind, ids } => {
                assert_eq!(kind, EntityKind::ExerciseItem);
                assert_eq!(ids, vec![missing]);
            }
            _ => panic!("unexpected error type"),
        }

        let mut duplicate = small_snapshot();
        let copy = duplicate.profiles[0].clone();
        duplicate.profiles.push(ProfileRecord {
            id: Uuid::now_v7(),
            ..copy
        });
        assert!(matches!(
            app.import(duplicate).await.unwrap_err(),
            AppError::Conflict(_)
        ));

        assert_eq!(app.export().await.expect("export"), before);
    }

    #[tokio::test]
    async fn import_rejects_negative_break_and_floors_counts() {
        let (_dir, app) = setup_app().await;

        let mut negative = small_snapshot();
        negative.plan_exercises[0].break_time_seconds = -1;
        assert!(matches!(
            app.import(negative).await.unwrap_err(),
            AppError::InvalidInput(_)
        ));

        let mut loose = small_snapshot();
        loose.plan_exercises[0].sets = 0;
        loose.plan_exercises[0].reps = -3;
        app.import(loose).await.expect("import");
        let exported = app.export().await.expect("export");
        assert_eq!(exported.plan_exercises[0].sets, 1);
        assert_eq!(exported.plan_exercises[0].reps, 1);
    }

    #[tokio::test]
    async fn completions_may_name_missing_plans() {
        let (_dir, app) = setup_app().await;
        let mut snapshot = small_snapshot();
        let profile_id = snapshot.profiles[0].id;
        snapshot.exercise_completions.push(ExerciseCompletionRecord {
            id: Uuid::now_v7(),
            profile_id,
            training_plan_id: Uuid::now_v7(),
            exercise_id: Uuid::now_v7(),
            exercise_description: "Retired exercise".to_string(),
            exercise_video_url: None,
            body_category_id: None,
            body_category_name: None,
            order: 1,
            equipment: None,
            reps: 5,
            break_time_seconds: 30,
            created_at: Utc::now(),
            training_day: NaiveDate::from_ymd_opt(2023, 1, 2).expect("valid date"),
        });

        app.import(snapshot).await.expect("import");
        let listed = app
            .list_exercise_completions(profile_id)
            .await
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].exercise_description, "Retired exercise");
    }

    #[tokio::test]
    async fn importing_empty_snapshot_clears_everything() {
        let (_dir, app) = setup_app().await;
        populate(&app).await;
        app.import(Snapshot::default()).await.expect("import");
        assert_eq!(app.export().await.expect("export"), Snapshot::default());
    }

    #[tokio::test]
    async fn large_import_spans_several_chunks() {
        let (_dir, app) = setup_app().await;
        let mut snapshot = small_snapshot();
        let plan_id = snapshot.training_plans[0].id;
        let item_id = snapshot.exercise_items[0].id;
        for order in 2..=130 {
            snapshot.plan_exercises.push(PlanExerciseRecord {
                id: Uuid::now_v7(),
                training_plan_id: plan_id,
                order,
                equipment: None,
                sets: 1,
                reps: 1,
                break_time_seconds: 0,
                exercise_item_id: item_id,
            });
        }

        app.import(snapshot).await.expect("import");
        let detail = app.get_plan_detail(plan_id).await.expect("get plan");
        assert_eq!(detail.exercises.len(), 130);
        assert_eq!(detail.exercises[129].exercise.sort_order, 130);
    }
}
