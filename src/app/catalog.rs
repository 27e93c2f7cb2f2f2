use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{ensure_non_empty, ensure_unique, finalize_transaction, not_found, App};
use crate::entities::{
    body_category, exercise_completion, exercise_item, plan_completion, plan_exercise, profile,
    training_plan,
};
use crate::error::AppError;
use crate::model::{
    normalize_optional_text, EntityKind, ExerciseItemChanges, ExerciseItemInput, ProfileChanges,
    ProfileInput,
};
use crate::refs;

pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Brust",
    "Rücken",
    "Beine",
    "Schultern",
    "Arme",
    "Bauch",
    "Unterer Rücken",
];

impl App {
    pub async fn add_profile(&self, input: ProfileInput) -> Result<profile::Model, AppError> {
        let name = ensure_non_empty("profile name", &input.name)?;
        let txn = self.db.begin().await?;
        let result: Result<profile::Model, AppError> = async {
            ensure_unique(&txn, profile::Entity, profile::Column::Name, &name, None).await?;
            let active = profile::ActiveModel {
                id: Set(Uuid::now_v7()),
                name: Set(name),
                emoji: Set(normalize_optional_text(input.emoji)),
            };
            Ok(active.insert(&txn).await?)
        }
        .await;

        let profile = finalize_transaction(txn, result).await?;
        tracing::info!(profile_id = %profile.id, "profile created");
        Ok(profile)
    }

    pub async fn list_profiles(&self) -> Result<Vec<profile::Model>, AppError> {
        Ok(profile::Entity::find()
            .order_by_asc(profile::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<profile::Model, AppError> {
        profile::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| not_found(EntityKind::Profile, id))
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<profile::Model, AppError> {
        let name = match changes.name.as_deref() {
            Some(name) => Some(ensure_non_empty("profile name", name)?),
            None => None,
        };

        let txn = self.db.begin().await?;
        let result: Result<profile::Model, AppError> = async {
            let existing = profile::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| not_found(EntityKind::Profile, id))?;
            let mut active: profile::ActiveModel = existing.clone().into();
            if let Some(name) = name {
                ensure_unique(&txn, profile::Entity, profile::Column::Name, &name, Some(id))
                    .await?;
                active.name = Set(name);
            }
            if let Some(emoji) = changes.emoji {
                active.emoji = Set(normalize_optional_text(Some(emoji)));
            }
            if !active.is_changed() {
                return Ok(existing);
            }
            Ok(active.update(&txn).await?)
        }
        .await;

        finalize_transaction(txn, result).await
    }

    /// Removes the profile with its plans, their exercises and the profile's
    /// completion history.
    pub async fn delete_profile(&self, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let result: Result<u64, AppError> = async {
            profile::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| not_found(EntityKind::Profile, id))?;

            let plans = training_plan::Entity::find()
                .filter(training_plan::Column::ProfileId.eq(id))
                .all(&txn)
                .await?;
            let plan_ids: Vec<Uuid> = plans.iter().map(|plan| plan.id).collect();
            if !plan_ids.is_empty() {
                plan_exercise::Entity::delete_many()
                    .filter(plan_exercise::Column::TrainingPlanId.is_in(plan_ids.clone()))
                    .exec(&txn)
                    .await?;
                training_plan::Entity::delete_many()
                    .filter(training_plan::Column::ProfileId.eq(id))
                    .exec(&txn)
                    .await?;
            }
            exercise_completion::Entity::delete_many()
                .filter(exercise_completion::Column::ProfileId.eq(id))
                .exec(&txn)
                .await?;
            plan_completion::Entity::delete_many()
                .filter(plan_completion::Column::ProfileId.eq(id))
                .exec(&txn)
                .await?;
            profile::Entity::delete_by_id(id).exec(&txn).await?;
            Ok(plan_ids.len() as u64)
        }
        .await;

        let plans_removed = finalize_transaction(txn, result).await?;
        tracing::info!(profile_id = %id, plans_removed, "profile deleted");
        Ok(())
    }

    pub async fn add_category(&self, name: &str) -> Result<body_category::Model, AppError> {
        let name = ensure_non_empty("body category name", name)?;
        let txn = self.db.begin().await?;
        let result: Result<body_category::Model, AppError> = async {
            ensure_unique(
                &txn,
                body_category::Entity,
                body_category::Column::Name,
                &name,
                None,
            )
            .await?;
            let active = body_category::ActiveModel {
                id: Set(Uuid::now_v7()),
                name: Set(name),
            };
            Ok(active.insert(&txn).await?)
        }
        .await;

        finalize_transaction(txn, result).await
    }

    pub async fn list_categories(&self) -> Result<Vec<body_category::Model>, AppError> {
        Ok(body_category::Entity::find()
            .order_by_asc(body_category::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<body_category::Model, AppError> {
        body_category::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| not_found(EntityKind::BodyCategory, id))
    }

    pub async fn rename_category(
        &self,
        id: Uuid,
        name: &str,
    ) -> Result<body_category::Model, AppError> {
        let name = ensure_non_empty("body category name", name)?;
        let txn = self.db.begin().await?;
        let result: Result<body_category::Model, AppError> = async {
            let existing = body_category::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| not_found(EntityKind::BodyCategory, id))?;
            ensure_unique(
                &txn,
                body_category::Entity,
                body_category::Column::Name,
                &name,
                Some(id),
            )
            .await?;
            let mut active: body_category::ActiveModel = existing.into();
            active.name = Set(name);
            Ok(active.update(&txn).await?)
        }
        .await;

        finalize_transaction(txn, result).await
    }

    /// Refuses while any exercise item still belongs to the category.
    pub async fn delete_category(&self, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let result: Result<(), AppError> = async {
            body_category::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| not_found(EntityKind::BodyCategory, id))?;
            let referencing = exercise_item::Entity::find()
                .filter(exercise_item::Column::BodyCategoryId.eq(id))
                .count(&txn)
                .await?;
            if referencing > 0 {
                return Err(AppError::Conflict(format!(
                    "body category id {id} is used by {referencing} exercise item(s)"
                )));
            }
            body_category::Entity::delete_by_id(id).exec(&txn).await?;
            Ok(())
        }
        .await;

        finalize_transaction(txn, result).await
    }

    /// Inserts the default categories into an empty catalog. Returns how many
    /// were inserted; zero when any category already exists.
    pub async fn seed_default_categories(&self) -> Result<usize, AppError> {
        let txn = self.db.begin().await?;
        let result: Result<usize, AppError> = async {
            if body_category::Entity::find().one(&txn).await?.is_some() {
                return Ok(0);
            }
            let rows: Vec<body_category::ActiveModel> = DEFAULT_CATEGORIES
                .iter()
                .map(|name| body_category::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    name: Set(name.to_string()),
                })
                .collect();
            super::insert_chunked(&txn, rows).await?;
            Ok(DEFAULT_CATEGORIES.len())
        }
        .await;

        let seeded = finalize_transaction(txn, result).await?;
        if seeded > 0 {
            tracing::info!(count = seeded, "seeded default body categories");
        }
        Ok(seeded)
    }

    pub async fn add_item(&self, input: ExerciseItemInput) -> Result<exercise_item::Model, AppError> {
        let description = ensure_non_empty("exercise item description", &input.description)?;
        let txn = self.db.begin().await?;
        let result: Result<exercise_item::Model, AppError> = async {
            ensure_unique(
                &txn,
                exercise_item::Entity,
                exercise_item::Column::Description,
                &description,
                None,
            )
            .await?;
            refs::ensure_exist(&txn, body_category::Entity, &[input.body_category_id]).await?;
            let active = exercise_item::ActiveModel {
                id: Set(Uuid::now_v7()),
                description: Set(description),
                video_url: Set(normalize_optional_text(input.video_url)),
                body_category_id: Set(input.body_category_id),
            };
            Ok(active.insert(&txn).await?)
        }
        .await;

        let item = finalize_transaction(txn, result).await?;
        tracing::info!(item_id = %item.id, "exercise item created");
        Ok(item)
    }

    pub async fn list_items(&self) -> Result<Vec<exercise_item::Model>, AppError> {
        Ok(exercise_item::Entity::find()
            .order_by_asc(exercise_item::Column::Description)
            .all(&self.db)
            .await?)
    }

    pub async fn get_item(&self, id: Uuid) -> Result<exercise_item::Model, AppError> {
        exercise_item::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| not_found(EntityKind::ExerciseItem, id))
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        changes: ExerciseItemChanges,
    ) -> Result<exercise_item::Model, AppError> {
        let description = match changes.description.as_deref() {
            Some(description) => Some(ensure_non_empty("exercise item description", description)?),
            None => None,
        };

        let txn = self.db.begin().await?;
        let result: Result<exercise_item::Model, AppError> = async {
            let existing = exercise_item::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| not_found(EntityKind::ExerciseItem, id))?;
            let mut active: exercise_item::ActiveModel = existing.clone().into();
            if let Some(description) = description {
                ensure_unique(
                    &txn,
                    exercise_item::Entity,
                    exercise_item::Column::Description,
                    &description,
                    Some(id),
                )
                .await?;
                active.description = Set(description);
            }
            if let Some(video_url) = changes.video_url {
                active.video_url = Set(normalize_optional_text(Some(video_url)));
            }
            if let Some(category_id) = changes.body_category_id {
                refs::ensure_exist(&txn, body_category::Entity, &[category_id]).await?;
                active.body_category_id = Set(category_id);
            }
            if !active.is_changed() {
                return Ok(existing);
            }
            Ok(active.update(&txn).await?)
        }
        .await;

        finalize_transaction(txn, result).await
    }

    /// Refuses while any plan exercise still points at the item.
    pub async fn delete_item(&self, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let result: Result<(), AppError> = async {
            exercise_item::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| not_found(EntityKind::ExerciseItem, id))?;
            let referencing = plan_exercise::Entity::find()
                .filter(plan_exercise::Column::ExerciseItemId.eq(id))
                .count(&txn)
                .await?;
            if referencing > 0 {
                return Err(AppError::Conflict(format!(
                    "exercise item id {id} is used by {referencing} plan exercise(s)"
                )));
            }
            exercise_item::Entity::delete_by_id(id).exec(&txn).await?;
            Ok(())
        }
        .await;

        finalize_transaction(txn, result).await
    }
}
