use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Profile,
    BodyCategory,
    ExerciseItem,
    TrainingPlan,
    PlanExercise,
    TrainingPlanCompletion,
    ExerciseCompletion,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::BodyCategory => "body category",
            Self::ExerciseItem => "exercise item",
            Self::TrainingPlan => "training plan",
            Self::PlanExercise => "plan exercise",
            Self::TrainingPlanCompletion => "training plan completion",
            Self::ExerciseCompletion => "exercise completion",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    pub emoji: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub emoji: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseItemInput {
    pub description: String,
    pub video_url: Option<String>,
    pub body_category_id: Uuid,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExerciseItemChanges {
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub body_category_id: Option<Uuid>,
}

/// One exercise entry as submitted by a caller, before defaulting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub order: i32,
    pub equipment: Option<String>,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub break_time_seconds: i32,
    pub exercise_item_id: Uuid,
}

impl ExerciseSpec {
    /// Floors sets and reps to 1 and rejects a negative break.
    pub fn normalize(self) -> Result<NormalizedExercise, AppError> {
        if self.break_time_seconds < 0 {
            return Err(AppError::InvalidInput(format!(
                "break time cannot be negative (order {}, got {})",
                self.order, self.break_time_seconds
            )));
        }
        Ok(NormalizedExercise {
            order: self.order,
            equipment: normalize_optional_text(self.equipment),
            sets: floor_count(self.sets),
            reps: floor_count(self.reps),
            break_time_seconds: self.break_time_seconds,
            exercise_item_id: self.exercise_item_id,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedExercise {
    pub order: i32,
    pub equipment: Option<String>,
    pub sets: i32,
    pub reps: i32,
    pub break_time_seconds: i32,
    pub exercise_item_id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanInput {
    pub name: String,
    pub profile_id: Uuid,
    pub exercises: Vec<ExerciseSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanCompletionInput {
    pub profile_id: Uuid,
    pub training_plan_id: Uuid,
    pub training_plan_name: String,
    pub count_completed_exercises: i32,
    pub count_open_exercises: i32,
    #[serde(default)]
    pub training_day: Option<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseCompletionInput {
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
    #[serde(default)]
    pub reps: Option<i32>,
    pub break_time_seconds: i32,
    #[serde(default)]
    pub training_day: Option<NaiveDate>,
}

/// A single set of a single exercise in an expanded workout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub step_order: u32,
    pub source_exercise_id: Uuid,
    pub equipment: Option<String>,
    pub reps: i32,
    pub break_seconds: i32,
    pub description: String,
    pub video_url: Option<String>,
}

pub fn floor_count(value: Option<i32>) -> i32 {
    value.unwrap_or(1).max(1)
}

pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
