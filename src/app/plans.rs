use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{ensure_non_empty, ensure_unique, finalize_transaction, insert_chunked, not_found, App};
use crate::entities::{exercise_item, plan_exercise, profile, training_plan};
use crate::error::AppError;
use crate::model::{EntityKind, ExerciseSpec, NormalizedExercise, PlanInput};
use crate::refs;

#[derive(Clone, Debug)]
pub struct ExerciseDetail {
    pub exercise: plan_exercise::Model,
    pub item: exercise_item::Model,
}

/// A plan with its exercises, sorted by `sort_order` with ties in creation order.
#[derive(Clone, Debug)]
pub struct PlanDetail {
    pub plan: training_plan::Model,
    pub exercises: Vec<ExerciseDetail>,
}

struct ValidatedPlan {
    name: String,
    profile_id: Uuid,
    exercises: Vec<NormalizedExercise>,
}

impl App {
    pub async fn create_plan(&self, input: PlanInput) -> Result<PlanDetail, AppError> {
        let validated = validate_plan_input(input)?;

        let txn = self.db.begin().await?;
        let result: Result<PlanDetail, AppError> = async {
            ensure_unique(
                &txn,
                training_plan::Entity,
                training_plan::Column::Name,
                &validated.name,
                None,
            )
            .await?;
            ensure_plan_references(&txn, &validated).await?;

            let plan_id = Uuid::now_v7();
            training_plan::ActiveModel {
                id: Set(plan_id),
                name: Set(validated.name),
                profile_id: Set(validated.profile_id),
            }
            .insert(&txn)
            .await?;
            insert_exercises(&txn, plan_id, validated.exercises).await?;

            load_plan_detail(&txn, plan_id).await
        }
        .await;

        let detail = finalize_transaction(txn, result).await?;
        tracing::info!(
            plan_id = %detail.plan.id,
            exercises = detail.exercises.len(),
            "training plan created"
        );
        Ok(detail)
    }

    /// Replaces name, owner and the whole exercise list. Every previous
    /// exercise row is deleted; the new ones get fresh ids even when their
    /// content is unchanged. Concurrent replaces are last-writer-wins.
    pub async fn replace_plan(&self, id: Uuid, input: PlanInput) -> Result<PlanDetail, AppError> {
        let validated = validate_plan_input(input)?;

        let txn = self.db.begin().await?;
        let result: Result<PlanDetail, AppError> = async {
            // Take the write lock before any read; overlapping replaces wait on it.
            let removed = plan_exercise::Entity::delete_many()
                .filter(plan_exercise::Column::TrainingPlanId.eq(id))
                .exec(&txn)
                .await?
                .rows_affected;

            let existing = training_plan::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| not_found(EntityKind::TrainingPlan, id))?;
            ensure_unique(
                &txn,
                training_plan::Entity,
                training_plan::Column::Name,
                &validated.name,
                Some(id),
            )
            .await?;
            ensure_plan_references(&txn, &validated).await?;
            tracing::debug!(plan_id = %id, removed, "cleared plan exercises");

            let mut active: training_plan::ActiveModel = existing.into();
            active.name = Set(validated.name);
            active.profile_id = Set(validated.profile_id);
            active.update(&txn).await?;
            insert_exercises(&txn, id, validated.exercises).await?;

            load_plan_detail(&txn, id).await
        }
        .await;

        let detail = finalize_transaction(txn, result).await?;
        tracing::info!(
            plan_id = %id,
            exercises = detail.exercises.len(),
            "training plan replaced"
        );
        Ok(detail)
    }

    pub async fn delete_plan(&self, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let result: Result<(), AppError> = async {
            plan_exercise::Entity::delete_many()
                .filter(plan_exercise::Column::TrainingPlanId.eq(id))
                .exec(&txn)
                .await?;
            let deleted = training_plan::Entity::delete_by_id(id).exec(&txn).await?;
            if deleted.rows_affected == 0 {
                return Err(not_found(EntityKind::TrainingPlan, id));
            }
            Ok(())
        }
        .await;

        finalize_transaction(txn, result).await?;
        tracing::info!(plan_id = %id, "training plan deleted");
        Ok(())
    }

    pub async fn get_plan_detail(&self, id: Uuid) -> Result<PlanDetail, AppError> {
        load_plan_detail(&self.db, id).await
    }

    pub async fn list_plan_details(&self) -> Result<Vec<PlanDetail>, AppError> {
        let plans = training_plan::Entity::find()
            .order_by_asc(training_plan::Column::Name)
            .all(&self.db)
            .await?;
        assemble_details(&self.db, plans).await
    }

    pub async fn list_plan_details_for_profile(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<PlanDetail>, AppError> {
        self.get_profile(profile_id).await?;
        let plans = training_plan::Entity::find()
            .filter(training_plan::Column::ProfileId.eq(profile_id))
            .order_by_asc(training_plan::Column::Name)
            .all(&self.db)
            .await?;
        assemble_details(&self.db, plans).await
    }
}

fn validate_plan_input(input: PlanInput) -> Result<ValidatedPlan, AppError> {
    let name = ensure_non_empty("plan name", &input.name)?;
    let exercises = input
        .exercises
        .into_iter()
        .map(ExerciseSpec::normalize)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ValidatedPlan {
        name,
        profile_id: input.profile_id,
        exercises,
    })
}

async fn ensure_plan_references<C: ConnectionTrait>(
    db: &C,
    plan: &ValidatedPlan,
) -> Result<(), AppError> {
    refs::ensure_exist(db, profile::Entity, &[plan.profile_id]).await?;
    let item_ids: Vec<Uuid> = plan
        .exercises
        .iter()
        .map(|exercise| exercise.exercise_item_id)
        .collect();
    refs::ensure_exist(db, exercise_item::Entity, &item_ids).await
}

async fn insert_exercises<C: ConnectionTrait>(
    db: &C,
    plan_id: Uuid,
    exercises: Vec<NormalizedExercise>,
) -> Result<(), AppError> {
    let rows: Vec<plan_exercise::ActiveModel> = exercises
        .into_iter()
        .map(|exercise| plan_exercise::ActiveModel {
            id: Set(Uuid::now_v7()),
            training_plan_id: Set(plan_id),
            sort_order: Set(exercise.order),
            equipment: Set(exercise.equipment),
            sets: Set(exercise.sets),
            reps: Set(exercise.reps),
            break_time_seconds: Set(exercise.break_time_seconds),
            exercise_item_id: Set(exercise.exercise_item_id),
        })
        .collect();
    insert_chunked(db, rows).await?;
    Ok(())
}

pub(super) async fn load_plan_detail<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<PlanDetail, AppError> {
    let plan = training_plan::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(EntityKind::TrainingPlan, id))?;
    assemble_details(db, vec![plan])
        .await?
        .pop()
        .ok_or_else(|| not_found(EntityKind::TrainingPlan, id))
}

/// Loads the exercises of `plans` and their catalog items in two queries and
/// stitches them onto each plan.
async fn assemble_details<C: ConnectionTrait>(
    db: &C,
    plans: Vec<training_plan::Model>,
) -> Result<Vec<PlanDetail>, AppError> {
    if plans.is_empty() {
        return Ok(Vec::new());
    }
    let plan_ids: Vec<Uuid> = plans.iter().map(|plan| plan.id).collect();
    let exercises = plan_exercise::Entity::find()
        .filter(plan_exercise::Column::TrainingPlanId.is_in(plan_ids))
        .order_by_asc(plan_exercise::Column::SortOrder)
        .order_by_asc(plan_exercise::Column::Id)
        .all(db)
        .await?;

    let item_ids = refs::unique_ids(
        &exercises
            .iter()
            .map(|exercise| exercise.exercise_item_id)
            .collect::<Vec<_>>(),
    );
    let items: HashMap<Uuid, exercise_item::Model> = if item_ids.is_empty() {
        HashMap::new()
    } else {
        exercise_item::Entity::find()
            .filter(exercise_item::Column::Id.is_in(item_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect()
    };

    let mut by_plan: HashMap<Uuid, Vec<ExerciseDetail>> = HashMap::new();
    for exercise in exercises {
        let item = items
            .get(&exercise.exercise_item_id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::ExerciseItem, exercise.exercise_item_id))?;
        by_plan
            .entry(exercise.training_plan_id)
            .or_default()
            .push(ExerciseDetail { exercise, item });
    }

    Ok(plans
        .into_iter()
        .map(|plan| {
            let exercises = by_plan.remove(&plan.id).unwrap_or_default();
            PlanDetail { plan, exercises }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::app::testing::{
        create_category, create_item, create_plan, create_profile, exercise, setup_app,
    };

    struct Fixture {
        profile: profile::Model,
        pushups: exercise_item::Model,
        squats: exercise_item::Model,
    }

    async fn fixture(app: &App) -> Fixture {
        let profile = create_profile(app, "Alice").await;
        let category = create_category(app, "Full Body").await;
        let pushups = create_item(app, "Pushups", category.id).await;
        let squats = create_item(app, "Squats", category.id).await;
        Fixture {
            profile,
            pushups,
            squats,
        }
    }

    #[tokio::test]
    async fn create_then_get_sorts_by_order_and_floors_counts() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let mut loose = exercise(fx.squats.id, 5, 0, -2);
        loose.sets = None;

        let created = create_plan(
            &app,
            "Leg Day",
            fx.profile.id,
            vec![loose, exercise(fx.pushups.id, 2, 3, 10)],
        )
        .await;
        assert_eq!(created.exercises.len(), 2);

        let loaded = app.get_plan_detail(created.plan.id).await.expect("get plan");
        let orders: Vec<i32> = loaded
            .exercises
            .iter()
            .map(|detail| detail.exercise.sort_order)
            .collect();
        assert_eq!(orders, vec![2, 5]);
        let squats = &loaded.exercises[1];
        assert_eq!(squats.item.description, "Squats");
        assert_eq!(squats.exercise.sets, 1);
        assert_eq!(squats.exercise.reps, 1);
        assert_eq!(squats.exercise.training_plan_id, created.plan.id);
    }

    #[tokio::test]
    async fn equal_orders_keep_submission_order() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let created = create_plan(
            &app,
            "Ties",
            fx.profile.id,
            vec![
                exercise(fx.squats.id, 1, 1, 1),
                exercise(fx.pushups.id, 1, 1, 1),
            ],
        )
        .await;

        let loaded = app.get_plan_detail(created.plan.id).await.expect("get plan");
        let names: Vec<&str> = loaded
            .exercises
            .iter()
            .map(|detail| detail.item.description.as_str())
            .collect();
        assert_eq!(names, vec!["Squats", "Pushups"]);
    }

    #[tokio::test]
    async fn create_reports_all_missing_items_at_once() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();

        let err = app
            .create_plan(PlanInput {
                name: "Ghost".to_string(),
                profile_id: fx.profile.id,
                exercises: vec![
                    exercise(first, 1, 3, 10),
                    exercise(fx.pushups.id, 2, 3, 10),
                    exercise(second, 3, 3, 10),
                ],
            })
            .await
            .unwrap_err();
        match err {
            AppError::MissingReferences { kind, ids } => {
                assert_eq!(kind, EntityKind::ExerciseItem);
                assert_eq!(ids, vec![first, second]);
            }
            _ => panic!("unexpected error type"),
        }

        let plans = training_plan::Entity::find()
            .count(app.db())
            .await
            .expect("count plans");
        assert_eq!(plans, 0);
    }

    #[tokio::test]
    async fn create_requires_existing_profile() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let missing = Uuid::now_v7();
        let err = app
            .create_plan(PlanInput {
                name: "Orphan".to_string(),
                profile_id: missing,
                exercises: vec![exercise(fx.pushups.id, 1, 1, 1)],
            })
            .await
            .unwrap_err();
        match err {
            AppError::MissingReferences { kind, ids } => {
                assert_eq!(kind, EntityKind::Profile);
                assert_eq!(ids, vec![missing]);
            }
            _ => panic!("unexpected error type"),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name_without_side_effects() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        create_plan(&app, "Push Day", fx.profile.id, vec![exercise(fx.pushups.id, 1, 1, 1)]).await;

        let err = app
            .create_plan(PlanInput {
                name: "Push Day".to_string(),
                profile_id: fx.profile.id,
                exercises: vec![exercise(fx.squats.id, 1, 1, 1)],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let exercises = plan_exercise::Entity::find()
            .count(app.db())
            .await
            .expect("count exercises");
        assert_eq!(exercises, 1);
    }

    #[tokio::test]
    async fn create_rejects_negative_break() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let mut bad = exercise(fx.pushups.id, 1, 3, 10);
        bad.break_time_seconds = -5;
        let err = app
            .create_plan(PlanInput {
                name: "Bad".to_string(),
                profile_id: fx.profile.id,
                exercises: vec![bad],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn replace_supersedes_every_previous_exercise() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let created = create_plan(
            &app,
            "Push Day",
            fx.profile.id,
            vec![
                exercise(fx.pushups.id, 1, 3, 10),
                exercise(fx.squats.id, 2, 3, 10),
            ],
        )
        .await;
        let old_ids: HashSet<Uuid> = created
            .exercises
            .iter()
            .map(|detail| detail.exercise.id)
            .collect();

        let replaced = app
            .replace_plan(
                created.plan.id,
                PlanInput {
                    name: "Push Day v2".to_string(),
                    profile_id: fx.profile.id,
                    exercises: vec![
                        exercise(fx.pushups.id, 1, 3, 10),
                        exercise(fx.squats.id, 2, 3, 10),
                    ],
                },
            )
            .await
            .expect("replace plan");
        assert_eq!(replaced.plan.id, created.plan.id);
        assert_eq!(replaced.plan.name, "Push Day v2");

        let loaded = app.get_plan_detail(created.plan.id).await.expect("get plan");
        assert_eq!(loaded.exercises.len(), 2);
        assert!(loaded
            .exercises
            .iter()
            .all(|detail| !old_ids.contains(&detail.exercise.id)));
        let total = plan_exercise::Entity::find()
            .count(app.db())
            .await
            .expect("count exercises");
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn replace_with_empty_list_clears_exercises() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let created =
            create_plan(&app, "Short", fx.profile.id, vec![exercise(fx.pushups.id, 1, 1, 1)])
                .await;
        let replaced = app
            .replace_plan(
                created.plan.id,
                PlanInput {
                    name: "Short".to_string(),
                    profile_id: fx.profile.id,
                    exercises: Vec::new(),
                },
            )
            .await
            .expect("replace plan");
        assert!(replaced.exercises.is_empty());
    }

    #[tokio::test]
    async fn replace_missing_plan_is_not_found() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let err = app
            .replace_plan(
                Uuid::now_v7(),
                PlanInput {
                    name: "Nope".to_string(),
                    profile_id: fx.profile.id,
                    exercises: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_replace_leaves_plan_untouched() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let created =
            create_plan(&app, "Stable", fx.profile.id, vec![exercise(fx.pushups.id, 1, 3, 10)])
                .await;
        create_plan(&app, "Taken", fx.profile.id, Vec::new()).await;

        let conflict = app
            .replace_plan(
                created.plan.id,
                PlanInput {
                    name: "Taken".to_string(),
                    profile_id: fx.profile.id,
                    exercises: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(conflict, AppError::Conflict(_)));

        let missing = app
            .replace_plan(
                created.plan.id,
                PlanInput {
                    name: "Stable".to_string(),
                    profile_id: fx.profile.id,
                    exercises: vec![exercise(Uuid::now_v7(), 1, 1, 1)],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::MissingReferences { .. }));

        let loaded = app.get_plan_detail(created.plan.id).await.expect("get plan");
        assert_eq!(loaded.plan.name, "Stable");
        assert_eq!(loaded.exercises.len(), 1);
        assert_eq!(loaded.exercises[0].exercise.id, created.exercises[0].exercise.id);
    }

    fn replacement(fx: &Fixture, item_id: Uuid, sets: i32) -> PlanInput {
        PlanInput {
            name: "Shared".to_string(),
            profile_id: fx.profile.id,
            exercises: vec![exercise(item_id, 1, sets, sets)],
        }
    }

    #[tokio::test]
    async fn later_replace_overwrites_earlier() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let created =
            create_plan(&app, "Shared", fx.profile.id, vec![exercise(fx.pushups.id, 1, 1, 1)])
                .await;

        app.replace_plan(created.plan.id, replacement(&fx, fx.pushups.id, 5))
            .await
            .expect("first replace");
        app.replace_plan(created.plan.id, replacement(&fx, fx.squats.id, 2))
            .await
            .expect("second replace");

        let loaded = app.get_plan_detail(created.plan.id).await.expect("get plan");
        assert_eq!(loaded.exercises.len(), 1);
        assert_eq!(loaded.exercises[0].item.id, fx.squats.id);
        assert_eq!(loaded.exercises[0].exercise.sets, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_replaces_last_writer_wins() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let created =
            create_plan(&app, "Shared", fx.profile.id, vec![exercise(fx.pushups.id, 1, 1, 1)])
                .await;

        for round in 0..10 {
            let (first, second) = tokio::join!(
                app.replace_plan(created.plan.id, replacement(&fx, fx.pushups.id, 5)),
                app.replace_plan(created.plan.id, replacement(&fx, fx.squats.id, 2)),
            );
            first.expect("first replace");
            second.expect("second replace");

            // One writer's list survives whole; the lists never interleave.
            let loaded = app.get_plan_detail(created.plan.id).await.expect("get plan");
            assert_eq!(loaded.exercises.len(), 1, "round {round}");
            let survivor = &loaded.exercises[0];
            let pair = (survivor.item.id, survivor.exercise.sets);
            assert!(
                pair == (fx.pushups.id, 5) || pair == (fx.squats.id, 2),
                "round {round}: unexpected survivor {pair:?}"
            );
        }
    }

    #[tokio::test]
    async fn delete_removes_plan_and_its_exercises() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let created = create_plan(
            &app,
            "Gone",
            fx.profile.id,
            vec![exercise(fx.pushups.id, 1, 1, 1), exercise(fx.squats.id, 2, 1, 1)],
        )
        .await;
        let kept =
            create_plan(&app, "Kept", fx.profile.id, vec![exercise(fx.squats.id, 1, 1, 1)]).await;

        app.delete_plan(created.plan.id).await.expect("delete plan");

        assert!(matches!(
            app.get_plan_detail(created.plan.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        let orphans = plan_exercise::Entity::find()
            .filter(plan_exercise::Column::TrainingPlanId.eq(created.plan.id))
            .count(app.db())
            .await
            .expect("count exercises");
        assert_eq!(orphans, 0);
        let kept = app.get_plan_detail(kept.plan.id).await.expect("other plan");
        assert_eq!(kept.exercises.len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_plan_is_not_found() {
        let (_dir, app) = setup_app().await;
        let err = app.delete_plan(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_orders_plans_by_name_with_exercises_loaded() {
        let (_dir, app) = setup_app().await;
        let fx = fixture(&app).await;
        let bob = create_profile(&app, "Bob").await;
        create_plan(&app, "Zeta", fx.profile.id, vec![exercise(fx.squats.id, 1, 1, 1)]).await;
        create_plan(&app, "Alpha", bob.id, vec![exercise(fx.pushups.id, 1, 1, 1)]).await;

        let all = app.list_plan_details().await.expect("list plans");
        let names: Vec<&str> = all.iter().map(|detail| detail.plan.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert!(all.iter().all(|detail| detail.exercises.len() == 1));

        let bobs = app
            .list_plan_details_for_profile(bob.id)
            .await
            .expect("list for profile");
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].plan.name, "Alpha");
    }
}
