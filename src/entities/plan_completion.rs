use sea_orm::entity::prelude::*;

// Completion history keeps its ids as plain columns: the plan a row describes
// may be replaced or deleted afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "training_plan_completions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub profile_id: Uuid,
    pub training_plan_id: Uuid,
    pub training_plan_name: String,
    pub count_completed_exercises: i32,
    pub count_open_exercises: i32,
    pub created_at: DateTimeUtc,
    pub training_day: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
