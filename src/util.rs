use chrono::{DateTime, Utc};

use crate::app::PlanDetail;
use crate::entities::{body_category, exercise_item, profile};
use crate::model::ExecutionStep;

fn has_text(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|text| !text.trim().is_empty())
        .unwrap_or(false)
}

pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_break(seconds: i32) -> String {
    if seconds >= 60 && seconds % 60 == 0 {
        format!("{}m", seconds / 60)
    } else if seconds > 60 {
        format!("{}m{}s", seconds / 60, seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

pub fn format_profile_detail(profile: &profile::Model, plan_names: &[String]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Profile ID: {}\n", profile.id));
    output.push_str(&format!("Name: {}\n", profile.name));
    if has_text(&profile.emoji) {
        output.push_str(&format!(
            "Emoji: {}\n",
            profile.emoji.as_deref().unwrap_or("")
        ));
    }
    output.push('\n');
    if plan_names.is_empty() {
        output.push_str("Plans: (none)");
        return output;
    }
    output.push_str("Plans:\n");
    for name in plan_names {
        output.push_str(&format!("- {name}\n"));
    }
    output.trim_end().to_string()
}

pub fn format_item_detail(item: &exercise_item::Model, category: &body_category::Model) -> String {
    let mut output = String::new();
    output.push_str(&format!("Exercise Item ID: {}\n", item.id));
    output.push_str(&format!("Description: {}\n", item.description));
    output.push_str(&format!(
        "Body Category: {} (id {})\n",
        category.name, category.id
    ));
    if has_text(&item.video_url) {
        output.push_str(&format!(
            "Video: {}\n",
            item.video_url.as_deref().unwrap_or("")
        ));
    }
    output.trim_end().to_string()
}

pub fn format_plan_detail(detail: &PlanDetail, owner: &profile::Model) -> String {
    let mut output = String::new();
    output.push_str(&format!("Plan ID: {}\n", detail.plan.id));
    output.push_str(&format!("Name: {}\n", detail.plan.name));
    output.push_str(&format!("Profile: {} (id {})\n", owner.name, owner.id));
    output.push('\n');
    if detail.exercises.is_empty() {
        output.push_str("Exercises: (none)");
        return output;
    }
    output.push_str("Exercises:\n");
    for entry in &detail.exercises {
        let exercise = &entry.exercise;
        output.push_str(&format!(
            "- [{}] {} {}x{}, break {} (exercise id {})\n",
            exercise.sort_order,
            entry.item.description,
            exercise.sets,
            exercise.reps,
            format_break(exercise.break_time_seconds),
            exercise.id
        ));
        if has_text(&exercise.equipment) {
            output.push_str(&format!(
                "  Equipment: {}\n",
                exercise.equipment.as_deref().unwrap_or("")
            ));
        }
        if has_text(&entry.item.video_url) {
            output.push_str(&format!(
                "  Video: {}\n",
                entry.item.video_url.as_deref().unwrap_or("")
            ));
        }
    }
    output.trim_end().to_string()
}

pub fn format_execution_steps(detail: &PlanDetail, steps: &[ExecutionStep]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Workout: {} ({} steps)\n",
        detail.plan.name,
        steps.len()
    ));
    if steps.is_empty() {
        return output.trim_end().to_string();
    }
    output.push('\n');
    for step in steps {
        output.push_str(&format!(
            "{:>3}. {} x{}, then rest {}",
            step.step_order,
            step.description,
            step.reps,
            format_break(step.break_seconds)
        ));
        if has_text(&step.equipment) {
            output.push_str(&format!(
                " [{}]",
                step.equipment.as_deref().unwrap_or("")
            ));
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::app::ExerciseDetail;
    use crate::entities::{plan_exercise, training_plan};

    #[test]
    fn format_break_prefers_minutes() {
        assert_eq!(format_break(0), "0s");
        assert_eq!(format_break(45), "45s");
        assert_eq!(format_break(120), "2m");
        assert_eq!(format_break(90), "1m30s");
    }

    #[test]
    fn plan_detail_lists_exercises_in_order() {
        let owner = profile::Model {
            id: Uuid::nil(),
            name: "Alice".to_string(),
            emoji: None,
        };
        let item = exercise_item::Model {
            id: Uuid::nil(),
            description: "Pushups".to_string(),
            video_url: None,
            body_category_id: Uuid::nil(),
        };
        let detail = PlanDetail {
            plan: training_plan::Model {
                id: Uuid::nil(),
                name: "Push Day".to_string(),
                profile_id: owner.id,
            },
            exercises: vec![ExerciseDetail {
                exercise: plan_exercise::Model {
                    id: Uuid::nil(),
                    training_plan_id: Uuid::nil(),
                    sort_order: 1,
                    equipment: Some("Mat".to_string()),
                    sets: 3,
                    reps: 10,
                    break_time_seconds: 60,
                    exercise_item_id: item.id,
                },
                item,
            }],
        };

        let output = format_plan_detail(&detail, &owner);
        assert!(output.contains("Name: Push Day"));
        assert!(output.contains("- [1] Pushups 3x10, break 1m"));
        assert!(output.contains("  Equipment: Mat"));
        assert!(!output.contains("Video:"));
    }

    #[test]
    fn empty_workout_has_header_only() {
        let detail = PlanDetail {
            plan: training_plan::Model {
                id: Uuid::nil(),
                name: "Rest".to_string(),
                profile_id: Uuid::nil(),
            },
            exercises: Vec::new(),
        };
        assert_eq!(format_execution_steps(&detail, &[]), "Workout: Rest (0 steps)");
    }
}
