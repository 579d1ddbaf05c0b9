pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_chains;
mod m20240101_000002_create_web_access;
mod m20240101_000003_create_stores;
mod m20240101_000004_create_items;
mod m20240101_000005_create_store_products;
mod m20240101_000006_create_price_history;
mod m20240101_000007_create_current_price;
mod m20240101_000008_create_promotions;
mod m20240101_000009_create_promotion_products;
mod m20240101_000010_create_restrictions;
mod m20240101_000011_create_price_functions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_chains::Migration),
            Box::new(m20240101_000002_create_web_access::Migration),
            Box::new(m20240101_000003_create_stores::Migration),
            Box::new(m20240101_000004_create_items::Migration),
            Box::new(m20240101_000005_create_store_products::Migration),
            Box::new(m20240101_000006_create_price_history::Migration),
            Box::new(m20240101_000007_create_current_price::Migration),
            Box::new(m20240101_000008_create_promotions::Migration),
            Box::new(m20240101_000009_create_promotion_products::Migration),
            Box::new(m20240101_000010_create_restrictions::Migration),
            Box::new(m20240101_000011_create_price_functions::Migration),
        ]
    }
}
