use sea_orm::entity::prelude::*;

use super::exercise_item;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "body_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    ExerciseItem,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::ExerciseItem => Entity::has_many(exercise_item::Entity).into(),
        }
    }
}

impl Related<exercise_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExerciseItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
