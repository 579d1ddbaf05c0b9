pub mod chain;
pub mod chain_web_access;
pub mod current_price;
pub mod item;
pub mod price_function;
pub mod price_history;
pub mod promotion;
pub mod promotion_product;
pub mod restriction;
pub mod store;
pub mod store_product;

pub type Chain = chain::Model;
pub type ChainWebAccess = chain_web_access::Model;
pub type Store = store::Model;
pub type Item = item::Model;
pub type StoreProduct = store_product::Model;
pub type PriceHistory = price_history::Model;
pub type CurrentPrice = current_price::Model;
pub type Promotion = promotion::Model;
pub type PromotionProduct = promotion_product::Model;
pub type Restriction = restriction::Model;
pub type PriceFunction = price_function::Model;

pub use restriction::NewRestriction;
pub use store::NewStore;
pub use store_product::{StoreProductDraft, StoreProductKey};
