//! Per-chain portal URL and login credentials. 1:1 with [super::chain].

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "web_access")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub chain_id: super::chain::ChainId,
    pub url: String,
    #[serde(skip_serializing)]
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        chain_id: super::chain::ChainId,
        url: String,
        username: String,
        password: String,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            chain_id: Set(chain_id),
            url: Set(url),
            username: Set(username),
            password: Set(password),
        };
        active.insert(db).await
    }

    pub async fn find_by_chain<C: ConnectionTrait>(
        db: &C,
        chain_id: super::chain::ChainId,
    ) -> DbResult<Option<Self>> {
        Entity::find_by_id(chain_id).one(db).await
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chain::Entity",
        from = "Column::ChainId",
        to = "super::chain::Column::Id"
    )]
    Chain,
}

impl Related<super::chain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chain.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
