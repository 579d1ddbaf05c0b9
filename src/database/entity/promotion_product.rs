//! Many-to-many link between a promotion and the store products it
//! applies to.

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ActiveValue::Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotion_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub promotion_id: super::promotion::PromotionId,
    #[sea_orm(primary_key, auto_increment = false)]
    pub store_product_id: super::store_product::StoreProductId,
}

impl Model {
    /// Replaces the full membership of `promotion_id` with
    /// `store_product_ids`: member rows are re-derived from the XML on
    /// every parse, so stale rows from a previous parse of the same
    /// promotion are dropped first.
    pub async fn replace_members<C: ConnectionTrait>(
        db: &C,
        promotion_id: super::promotion::PromotionId,
        store_product_ids: &[super::store_product::StoreProductId],
    ) -> DbResult<()> {
        Entity::delete_many()
            .filter(Column::PromotionId.eq(promotion_id))
            .exec(db)
            .await?;

        for store_product_id in store_product_ids {
            Entity::insert(ActiveModel {
                promotion_id: Set(promotion_id),
                store_product_id: Set(*store_product_id),
            })
            .on_conflict(
                OnConflict::columns([Column::PromotionId, Column::StoreProductId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::promotion::Entity",
        from = "Column::PromotionId",
        to = "super::promotion::Column::Id"
    )]
    Promotion,
    #[sea_orm(
        belongs_to = "super::store_product::Entity",
        from = "Column::StoreProductId",
        to = "super::store_product::Column::Id"
    )]
    StoreProduct,
}

impl Related<super::promotion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Promotion.def()
    }
}

impl Related<super::store_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StoreProduct.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
