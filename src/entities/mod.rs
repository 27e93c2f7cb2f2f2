pub mod body_category;
pub mod exercise_completion;
pub mod exercise_item;
pub mod plan_completion;
pub mod plan_exercise;
pub mod profile;
pub mod training_plan;
