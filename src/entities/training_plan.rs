use sea_orm::entity::prelude::*;

use super::{plan_exercise, profile};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "training_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub profile_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Profile,
    PlanExercise,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Profile => Entity::belongs_to(profile::Entity)
                .from(Column::ProfileId)
                .to(profile::Column::Id)
                .into(),
            Self::PlanExercise => Entity::has_many(plan_exercise::Entity).into(),
        }
    }
}

impl Related<profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<plan_exercise::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlanExercise.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
