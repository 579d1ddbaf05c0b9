//! Materialized view of each store product's currently open price
//! interval. Kept in sync by the reconciliation engine, never written to
//! directly by a scraper or parser.

use crate::database::DbResult;
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "current_price")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub store_product_id: super::store_product::StoreProductId,
    pub price: Decimal,
}

impl Model {
    /// Deletes every `CurrentPrice` row for the given store products, the
    /// first half of the "delete then reinsert" materialization step
    /// (spec.md §4.6.2 stage 4). Callers pass every `StoreProduct` id
    /// belonging to the store, since `CurrentPrice` carries no store id
    /// of its own.
    pub async fn delete_for_store_products<C: ConnectionTrait>(
        db: &C,
        store_product_ids: &[super::store_product::StoreProductId],
    ) -> DbResult<()> {
        if store_product_ids.is_empty() {
            return Ok(());
        }
        Entity::delete_many()
            .filter(Column::StoreProductId.is_in(store_product_ids.iter().copied()))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn insert_new<C: ConnectionTrait>(
        db: &C,
        store_product_id: super::store_product::StoreProductId,
        price: Decimal,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            store_product_id: Set(store_product_id),
            price: Set(price),
        };
        active.insert(db).await
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store_product::Entity",
        from = "Column::StoreProductId",
        to = "super::store_product::Column::Id"
    )]
    StoreProduct,
}

impl Related<super::store_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StoreProduct.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
