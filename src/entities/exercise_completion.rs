use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "exercise_completions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub profile_id: Uuid,
    pub training_plan_id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_description: String,
    pub exercise_video_url: Option<String>,
    pub body_category_id: Option<Uuid>,
    pub body_category_name: Option<String>,
    pub sort_order: i32,
    pub equipment: Option<String>,
    pub reps: i32,
    pub break_time_seconds: i32,
    pub created_at: DateTimeUtc,
    pub training_day: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
