//! Flat, id-carrying records for whole-database export and import.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::entities::{
    body_category, exercise_completion, exercise_item, plan_completion, plan_exercise, profile,
    training_plan,
};

/// Backups written by older tooling use `training_exercise_*` names; both
/// spellings deserialize, the current names are always written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,
    #[serde(default)]
    pub body_categories: Vec<BodyCategoryRecord>,
    #[serde(default, alias = "training_exercise_items")]
    pub exercise_items: Vec<ExerciseItemRecord>,
    #[serde(default)]
    pub training_plans: Vec<TrainingPlanRecord>,
    #[serde(default, alias = "training_exercises")]
    pub plan_exercises: Vec<PlanExerciseRecord>,
    #[serde(default)]
    pub training_plan_completions: Vec<PlanCompletionRecord>,
    #[serde(default, alias = "training_exercise_completions")]
    pub exercise_completions: Vec<ExerciseCompletionRecord>,
}

impl Snapshot {
    pub fn total_rows(&self) -> usize {
        self.profiles.len()
            + self.body_categories.len()
            + self.exercise_items.len()
            + self.training_plans.len()
            + self.plan_exercises.len()
            + self.training_plan_completions.len()
            + self.exercise_completions.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyCategoryRecord {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseItemRecord {
    pub id: Uuid,
    pub description: String,
    #[serde(default)]
    pub video_url: Option<String>,
    pub body_category_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlanRecord {
    pub id: Uuid,
    pub name: String,
    pub profile_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanExerciseRecord {
    pub id: Uuid,
    pub training_plan_id: Uuid,
    pub order: i32,
    #[serde(default)]
    pub equipment: Option<String>,
    pub sets: i32,
    pub reps: i32,
    pub break_time_seconds: i32,
    #[serde(alias = "training_exercise_item_id")]
    pub exercise_item_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanCompletionRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub training_plan_id: Uuid,
    pub training_plan_name: String,
    pub count_completed_exercises: i32,
    pub count_open_exercises: i32,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub training_day: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseCompletionRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub training_plan_id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_description: String,
    #[serde(default)]
    pub exercise_video_url: Option<String>,
    #[serde(default)]
    pub body_category_id: Option<Uuid>,
    #[serde(default)]
    pub body_category_name: Option<String>,
    pub order: i32,
    #[serde(default)]
    pub equipment: Option<String>,
    pub reps: i32,
    pub break_time_seconds: i32,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub training_day: NaiveDate,
}

/// RFC 3339 timestamps, or offset-less ones as older backups wrote them,
/// which are taken as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp '{raw}'"))
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

impl From<profile::Model> for ProfileRecord {
    fn from(model: profile::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            emoji: model.emoji,
        }
    }
}

impl ProfileRecord {
    pub fn to_row(&self) -> profile::ActiveModel {
        profile::ActiveModel {
            id: Set(self.id),
            name: Set(self.name.clone()),
            emoji: Set(self.emoji.clone()),
        }
    }
}

impl From<body_category::Model> for BodyCategoryRecord {
    fn from(model: body_category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl BodyCategoryRecord {
    pub fn to_row(&self) -> body_category::ActiveModel {
        body_category::ActiveModel {
            id: Set(self.id),
            name: Set(self.name.clone()),
        }
    }
}

impl From<exercise_item::Model> for ExerciseItemRecord {
    fn from(model: exercise_item::Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            video_url: model.video_url,
            body_category_id: model.body_category_id,
        }
    }
}

impl ExerciseItemRecord {
    pub fn to_row(&self) -> exercise_item::ActiveModel {
        exercise_item::ActiveModel {
            id: Set(self.id),
            description: Set(self.description.clone()),
            video_url: Set(self.video_url.clone()),
            body_category_id: Set(self.body_category_id),
        }
    }
}

impl From<training_plan::Model> for TrainingPlanRecord {
    fn from(model: training_plan::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            profile_id: model.profile_id,
        }
    }
}

impl TrainingPlanRecord {
    pub fn to_row(&self) -> training_plan::ActiveModel {
        training_plan::ActiveModel {
            id: Set(self.id),
            name: Set(self.name.clone()),
            profile_id: Set(self.profile_id),
        }
    }
}

impl From<plan_exercise::Model> for PlanExerciseRecord {
    fn from(model: plan_exercise::Model) -> Self {
        Self {
            id: model.id,
            training_plan_id: model.training_plan_id,
            order: model.sort_order,
            equipment: model.equipment,
            sets: model.sets,
            reps: model.reps,
            break_time_seconds: model.break_time_seconds,
            exercise_item_id: model.exercise_item_id,
        }
    }
}

impl PlanExerciseRecord {
    pub fn to_row(&self) -> plan_exercise::ActiveModel {
        plan_exercise::ActiveModel {
            id: Set(self.id),
            training_plan_id: Set(self.training_plan_id),
            sort_order: Set(self.order),
            equipment: Set(self.equipment.clone()),
            sets: Set(self.sets),
            reps: Set(self.reps),
            break_time_seconds: Set(self.break_time_seconds),
            exercise_item_id: Set(self.exercise_item_id),
        }
    }
}

impl From<plan_completion::Model> for PlanCompletionRecord {
    fn from(model: plan_completion::Model) -> Self {
        Self {
            id: model.id,
            profile_id: model.profile_id,
            training_plan_id: model.training_plan_id,
            training_plan_name: model.training_plan_name,
            count_completed_exercises: model.count_completed_exercises,
            count_open_exercises: model.count_open_exercises,
            created_at: model.created_at,
            training_day: model.training_day,
        }
    }
}

impl PlanCompletionRecord {
    pub fn to_row(&self) -> plan_completion::ActiveModel {
        plan_completion::ActiveModel {
            id: Set(self.id),
            profile_id: Set(self.profile_id),
            training_plan_id: Set(self.training_plan_id),
            training_plan_name: Set(self.training_plan_name.clone()),
            count_completed_exercises: Set(self.count_completed_exercises),
            count_open_exercises: Set(self.count_open_exercises),
            created_at: Set(self.created_at),
            training_day: Set(self.training_day),
        }
    }
}

impl From<exercise_completion::Model> for ExerciseCompletionRecord {
    fn from(model: exercise_completion::Model) -> Self {
        Self {
            id: model.id,
            profile_id: model.profile_id,
            training_plan_id: model.training_plan_id,
            exercise_id: model.exercise_id,
            exercise_description: model.exercise_description,
            exercise_video_url: model.exercise_video_url,
            body_category_id: model.body_category_id,
            body_category_name: model.body_category_name,
            order: model.sort_order,
            equipment: model.equipment,
            reps: model.reps,
            break_time_seconds: model.break_time_seconds,
            created_at: model.created_at,
            training_day: model.training_day,
        }
    }
}

impl ExerciseCompletionRecord {
    pub fn to_row(&self) -> exercise_completion::ActiveModel {
        exercise_completion::ActiveModel {
            id: Set(self.id),
            profile_id: Set(self.profile_id),
            training_plan_id: Set(self.training_plan_id),
            exercise_id: Set(self.exercise_id),
            exercise_description: Set(self.exercise_description.clone()),
            exercise_video_url: Set(self.exercise_video_url.clone()),
            body_category_id: Set(self.body_category_id),
            body_category_name: Set(self.body_category_name.clone()),
            sort_order: Set(self.order),
            equipment: Set(self.equipment.clone()),
            reps: Set(self.reps),
            break_time_seconds: Set(self.break_time_seconds),
            created_at: Set(self.created_at),
            training_day: Set(self.training_day),
        }
    }
}
