//! A supermarket brand (or one of its subchains). One row per
//! `(full_id, subchain_id)` pair.

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

pub type ChainId = i32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chains")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: ChainId,
    /// 13-digit external chain identifier published by the portal.
    pub full_id: i64,
    pub subchain_id: Option<i32>,
    pub name: String,
}

impl Model {
    /// Looks up the `(full_id, subchain_id)` pair the catalog scraper
    /// treats as the chain's unique identity.
    pub async fn find_by_full_and_subchain<C: ConnectionTrait>(
        db: &C,
        full_id: i64,
        subchain_id: Option<i32>,
    ) -> DbResult<Option<Self>> {
        let mut query = Entity::find().filter(Column::FullId.eq(full_id));
        query = match subchain_id {
            Some(id) => query.filter(Column::SubchainId.eq(id)),
            None => query.filter(Column::SubchainId.is_null()),
        };
        query.one(db).await
    }

    /// Returns every known `(full_id, subchain_id)` pair, used by the
    /// catalog scraper to skip chains it has already recorded.
    pub async fn all_full_subchain_ids<C: ConnectionTrait>(
        db: &C,
    ) -> DbResult<Vec<(i64, Option<i32>)>> {
        let chains = Entity::find().all(db).await?;
        Ok(chains
            .into_iter()
            .map(|c| (c.full_id, c.subchain_id))
            .collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        full_id: i64,
        subchain_id: Option<i32>,
        name: String,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            full_id: Set(full_id),
            subchain_id: Set(subchain_id),
            name: Set(name),
        };
        active.insert(db).await
    }

    /// Overwrites the chain's display name with the subchain name
    /// discovered while parsing a multi-subchain stores file (spec.md
    /// §4.5). Sticky across runs: nothing detects whether the name
    /// already matches before writing again.
    pub async fn update_name<C: ConnectionTrait>(db: &C, id: ChainId, name: String) -> DbResult<()> {
        let active = ActiveModel {
            id: Set(id),
            name: Set(name),
            ..Default::default()
        };
        Entity::update(active).exec(db).await?;
        Ok(())
    }

    pub async fn all<C: ConnectionTrait>(db: &C) -> DbResult<Vec<Self>> {
        Entity::find().all(db).await
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::store::Entity")]
    Store,
    #[sea_orm(has_one = "super::chain_web_access::Entity")]
    WebAccess,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::chain_web_access::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WebAccess.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
