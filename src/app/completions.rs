use chrono::{Local, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use uuid::Uuid;

use super::{ensure_non_empty, finalize_transaction, insert_chunked, App};
use crate::entities::{
    body_category, exercise_completion, plan_completion, plan_exercise, profile, training_plan,
};
use crate::error::AppError;
use crate::model::{
    floor_count, normalize_optional_text, ExerciseCompletionInput, PlanCompletionInput,
};
use crate::refs;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl App {
    /// Appends plan completions. All referenced profiles and plans must exist;
    /// otherwise nothing is written.
    pub async fn record_plan_completions(
        &self,
        batch: Vec<PlanCompletionInput>,
    ) -> Result<Vec<Uuid>, AppError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let created_at = Utc::now();
        let mut rows = Vec::with_capacity(batch.len());
        let mut ids = Vec::with_capacity(batch.len());
        for input in &batch {
            let name = ensure_non_empty("training plan name", &input.training_plan_name)?;
            if input.count_completed_exercises < 0 || input.count_open_exercises < 0 {
                return Err(AppError::InvalidInput(format!(
                    "exercise counts cannot be negative (plan {})",
                    input.training_plan_id
                )));
            }
            let id = Uuid::now_v7();
            ids.push(id);
            rows.push(plan_completion::ActiveModel {
                id: Set(id),
                profile_id: Set(input.profile_id),
                training_plan_id: Set(input.training_plan_id),
                training_plan_name: Set(name),
                count_completed_exercises: Set(input.count_completed_exercises),
                count_open_exercises: Set(input.count_open_exercises),
                created_at: Set(created_at),
                training_day: Set(input.training_day.unwrap_or_else(today)),
            });
        }

        let profile_ids: Vec<Uuid> = batch.iter().map(|input| input.profile_id).collect();
        let plan_ids: Vec<Uuid> = batch.iter().map(|input| input.training_plan_id).collect();

        let txn = self.db.begin().await?;
        let result: Result<u64, AppError> = async {
            refs::ensure_exist(&txn, profile::Entity, &profile_ids).await?;
            refs::ensure_exist(&txn, training_plan::Entity, &plan_ids).await?;
            insert_chunked(&txn, rows).await
        }
        .await;

        let inserted = finalize_transaction(txn, result).await?;
        tracing::info!(inserted, "plan completions recorded");
        Ok(ids)
    }

    pub async fn record_exercise_completions(
        &self,
        batch: Vec<ExerciseCompletionInput>,
    ) -> Result<Vec<Uuid>, AppError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let created_at = Utc::now();
        let mut rows = Vec::with_capacity(batch.len());
        let mut ids = Vec::with_capacity(batch.len());
        for input in &batch {
            let description =
                ensure_non_empty("exercise description", &input.exercise_description)?;
            if input.break_time_seconds < 0 {
                return Err(AppError::InvalidInput(format!(
                    "break time cannot be negative (exercise {}, got {})",
                    input.exercise_id, input.break_time_seconds
                )));
            }
            let id = Uuid::now_v7();
            ids.push(id);
            rows.push(exercise_completion::ActiveModel {
                id: Set(id),
                profile_id: Set(input.profile_id),
                training_plan_id: Set(input.training_plan_id),
                exercise_id: Set(input.exercise_id),
                exercise_description: Set(description),
                exercise_video_url: Set(normalize_optional_text(input.exercise_video_url.clone())),
                body_category_id: Set(input.body_category_id),
                body_category_name: Set(normalize_optional_text(input.body_category_name.clone())),
                sort_order: Set(input.order),
                equipment: Set(normalize_optional_text(input.equipment.clone())),
                reps: Set(floor_count(input.reps)),
                break_time_seconds: Set(input.break_time_seconds),
                created_at: Set(created_at),
                training_day: Set(input.training_day.unwrap_or_else(today)),
            });
        }

        let profile_ids: Vec<Uuid> = batch.iter().map(|input| input.profile_id).collect();
        let plan_ids: Vec<Uuid> = batch.iter().map(|input| input.training_plan_id).collect();
        let exercise_ids: Vec<Uuid> = batch.iter().map(|input| input.exercise_id).collect();
        let category_ids: Vec<Uuid> = batch
            .iter()
            .filter_map(|input| input.body_category_id)
            .collect();

        let txn = self.db.begin().await?;
        let result: Result<u64, AppError> = async {
            refs::ensure_exist(&txn, profile::Entity, &profile_ids).await?;
            refs::ensure_exist(&txn, training_plan::Entity, &plan_ids).await?;
            refs::ensure_exist(&txn, plan_exercise::Entity, &exercise_ids).await?;
            refs::ensure_exist(&txn, body_category::Entity, &category_ids).await?;
            insert_chunked(&txn, rows).await
        }
        .await;

        let inserted = finalize_transaction(txn, result).await?;
        tracing::info!(inserted, "exercise completions recorded");
        Ok(ids)
    }

    /// Newest training day first.
    pub async fn list_plan_completions(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<plan_completion::Model>, AppError> {
        self.get_profile(profile_id).await?;
        Ok(plan_completion::Entity::find()
            .filter(plan_completion::Column::ProfileId.eq(profile_id))
            .order_by_desc(plan_completion::Column::TrainingDay)
            .order_by_desc(plan_completion::Column::CreatedAt)
            .order_by_asc(plan_completion::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn list_exercise_completions(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<exercise_completion::Model>, AppError> {
        self.get_profile(profile_id).await?;
        Ok(exercise_completion::Entity::find()
            .filter(exercise_completion::Column::ProfileId.eq(profile_id))
            .order_by_desc(exercise_completion::Column::TrainingDay)
            .order_by_desc(exercise_completion::Column::TrainingPlanId)
            .order_by_asc(exercise_completion::Column::SortOrder)
            .order_by_asc(exercise_completion::Column::Id)
            .all(&self.db)
            .await?)
    }
}
