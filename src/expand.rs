//! Flattens a plan into the single-set steps an athlete works through.

use crate::app::{ExerciseDetail, PlanDetail};
use crate::model::ExecutionStep;

/// One step per set, exercises taken in `order` with ties kept in list order.
/// `step_order` is 1-based and runs across the whole plan.
pub fn expand(plan: &PlanDetail) -> Vec<ExecutionStep> {
    let mut exercises: Vec<&ExerciseDetail> = plan.exercises.iter().collect();
    exercises.sort_by_key(|detail| detail.exercise.sort_order);

    let mut steps = Vec::new();
    for detail in exercises {
        let sets = detail.exercise.sets.max(1);
        for _ in 0..sets {
            steps.push(ExecutionStep {
                step_order: steps.len() as u32 + 1,
                source_exercise_id: detail.exercise.id,
                equipment: detail.exercise.equipment.clone(),
                reps: detail.exercise.reps,
                break_seconds: detail.exercise.break_time_seconds,
                description: detail.item.description.clone(),
                video_url: detail.item.video_url.clone(),
            });
        }
    }
    steps
}
