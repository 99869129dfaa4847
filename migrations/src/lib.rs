pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_orders_table;
mod m20240301_000002_create_order_products_table;
mod m20240301_000003_create_stacks_table;
mod m20240301_000004_create_user_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_orders_table::Migration),
            Box::new(m20240301_000002_create_order_products_table::Migration),
            Box::new(m20240301_000003_create_stacks_table::Migration),
            Box::new(m20240301_000004_create_user_tables::Migration),
        ]
    }
}
