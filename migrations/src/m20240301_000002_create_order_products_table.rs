use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Child rows are removed by the order service before their parent;
        // the index exists for the by-order lookups, not for cascade.
        manager
            .create_table(
                Table::create()
                    .table(OrderProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderProducts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderProducts::OrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderProducts::Micron).integer().not_null())
                    .col(ColumnDef::new(OrderProducts::Meter).integer().not_null())
                    .col(ColumnDef::new(OrderProducts::Size).string().not_null())
                    .col(ColumnDef::new(OrderProducts::Color).string().not_null())
                    .col(
                        ColumnDef::new(OrderProducts::Nos)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OrderProducts::Unit)
                            .string()
                            .not_null()
                            .default("Pcs"),
                    )
                    .col(
                        ColumnDef::new(OrderProducts::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_products_order_id")
                    .table(OrderProducts::Table)
                    .col(OrderProducts::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderProducts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrderProducts {
    Table,
    Id,
    OrderId,
    Micron,
    Meter,
    Size,
    Color,
    Nos,
    Unit,
    Quantity,
}
