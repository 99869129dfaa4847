use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stacks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stacks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Stacks::Micron).integer().not_null())
                    .col(ColumnDef::new(Stacks::Meter).integer().not_null())
                    .col(ColumnDef::new(Stacks::Size).string().not_null())
                    .col(ColumnDef::new(Stacks::Color).string().not_null())
                    .col(
                        ColumnDef::new(Stacks::Stock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stacks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Stacks {
    Table,
    Id,
    Micron,
    Meter,
    Size,
    Color,
    Stock,
}
