use sea_orm::entity::prelude::*;

use super::{body_category, plan_exercise};

/// Catalog entry shared by any number of plan exercises.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "exercise_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub description: String,
    pub video_url: Option<String>,
    pub body_category_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    BodyCategory,
    PlanExercise,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::BodyCategory => Entity::belongs_to(body_category::Entity)
                .from(Column::BodyCategoryId)
                .to(body_category::Column::Id)
                .into(),
            Self::PlanExercise => Entity::has_many(plan_exercise::Entity).into(),
        }
    }
}

impl Related<body_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BodyCategory.def()
    }
}

impl Related<plan_exercise::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlanExercise.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
