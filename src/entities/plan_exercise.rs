use sea_orm::entity::prelude::*;

use super::{exercise_item, training_plan};

/// One exercise entry of a training plan. Rows are owned by exactly one plan
/// and are replaced wholesale whenever the plan is.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "plan_exercises")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub training_plan_id: Uuid,
    pub sort_order: i32,
    pub equipment: Option<String>,
    pub sets: i32,
    pub reps: i32,
    pub break_time_seconds: i32,
    pub exercise_item_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    TrainingPlan,
    ExerciseItem,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::TrainingPlan => Entity::belongs_to(training_plan::Entity)
                .from(Column::TrainingPlanId)
                .to(training_plan::Column::Id)
                .into(),
            Self::ExerciseItem => Entity::belongs_to(exercise_item::Entity)
                .from(Column::ExerciseItemId)
                .to(exercise_item::Column::Id)
                .into(),
        }
    }
}

impl Related<training_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainingPlan.def()
    }
}

impl Related<exercise_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExerciseItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
