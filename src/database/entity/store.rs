//! A physical or web branch belonging to one chain.

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type StoreId = i32;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum StoreType {
    #[default]
    #[sea_orm(num_value = 0)]
    Unknown = 0,
    #[sea_orm(num_value = 1)]
    Physical = 1,
    #[sea_orm(num_value = 2)]
    Web = 2,
    #[sea_orm(num_value = 3)]
    Both = 3,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: StoreId,
    /// Chain-local integer store id, as found in the stores XML.
    pub store_id: i32,
    pub chain_id: super::chain::ChainId,
    pub name: String,
    pub city: String,
    #[sea_orm(default_value = "")]
    pub address: String,
    pub store_type: StoreType,
}

/// A store row as discovered while parsing a stores file, not yet
/// assigned a surrogate id.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub store_id: i32,
    pub name: String,
    pub city: String,
    pub address: String,
    pub store_type: StoreType,
}

impl Model {
    /// Inserts any `candidates` not already present for `chain_id`
    /// (keyed by the chain-local `store_id`), leaving existing rows
    /// untouched (spec.md §4.5).
    pub async fn upsert_many<C: ConnectionTrait>(
        db: &C,
        chain_id: super::chain::ChainId,
        candidates: Vec<NewStore>,
    ) -> DbResult<usize> {
        let existing: HashSet<i32> = Entity::find()
            .filter(Column::ChainId.eq(chain_id))
            .all(db)
            .await?
            .into_iter()
            .map(|s| s.store_id)
            .collect();

        let mut inserted = 0usize;
        for candidate in candidates {
            if existing.contains(&candidate.store_id) {
                continue;
            }
            let active = ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                store_id: Set(candidate.store_id),
                chain_id: Set(chain_id),
                name: Set(candidate.name),
                city: Set(candidate.city),
                address: Set(candidate.address),
                store_type: Set(candidate.store_type),
            };
            active.insert(db).await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    pub async fn all_for_chain<C: ConnectionTrait>(
        db: &C,
        chain_id: super::chain::ChainId,
    ) -> DbResult<Vec<Self>> {
        Entity::find()
            .filter(Column::ChainId.eq(chain_id))
            .all(db)
            .await
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
    #[sea_orm(has_many = "super::store_product::Entity")]
    StoreProduct,
    #[sea_orm(has_many = "super::promotion::Entity")]
    Promotion,
}

impl Related<super::chain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chain.def()
    }
}

impl Related<super::store_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StoreProduct.def()
    }
}

impl Related<super::promotion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Promotion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
