//! A condition attached to a promotion: minimum/maximum quantity, basket
//! price threshold, club membership, or a specific required item.

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

pub type RestrictionId = i64;

/// A restriction as extracted from a promotion element, before it has a
/// surrogate id.
#[derive(Debug, Clone)]
pub struct NewRestriction {
    pub kind: RestrictionKind,
    pub amount: Option<i32>,
    pub store_product_id: Option<super::store_product::StoreProductId>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum RestrictionKind {
    #[sea_orm(num_value = 1)]
    MinQty = 1,
    #[sea_orm(num_value = 2)]
    MaxQty = 2,
    #[sea_orm(num_value = 3)]
    BasketPrice = 3,
    #[sea_orm(num_value = 4)]
    ClubIds = 4,
    #[sea_orm(num_value = 5)]
    SpecificItem = 5,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "restrictions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: RestrictionId,
    pub promotion_id: super::promotion::PromotionId,
    pub kind: RestrictionKind,
    /// Quantity/price amount; unused for `ClubIds`/`SpecificItem`.
    pub amount: Option<i32>,
    /// Referenced store product; only set for `SpecificItem`.
    pub store_product_id: Option<super::store_product::StoreProductId>,
}

impl Model {
    /// Promotions are re-parsed wholesale on every run, so restrictions
    /// are replaced rather than diffed (mirrors
    /// [super::promotion_product::Model::replace_members]).
    pub async fn replace_for_promotion<C: ConnectionTrait>(
        db: &C,
        promotion_id: super::promotion::PromotionId,
        restrictions: Vec<NewRestriction>,
    ) -> DbResult<()> {
        Entity::delete_many()
            .filter(Column::PromotionId.eq(promotion_id))
            .exec(db)
            .await?;

        for restriction in restrictions {
            Entity::insert(ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                promotion_id: Set(promotion_id),
                kind: Set(restriction.kind),
                amount: Set(restriction.amount),
                store_product_id: Set(restriction.store_product_id),
            })
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
