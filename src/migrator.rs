//! Embedded schema migrations, applied at startup when `auto_migrate` is
//! set.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_000001_create_tables::Migration)]
    }
}

mod m20250101_000001_create_tables {
    use sea_orm_migration::prelude::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[derive(Iden)]
    enum Customers {
        Table,
        Id,
        UserId,
        Name,
        Phone,
        Address,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        UserId,
        Name,
        Sku,
        StockQuantity,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        UserId,
        CustomerId,
        Status,
        QuotationAmount,
        ConfirmedAmount,
        MeasurementDate,
        InstallationDate,
        PaymentMethod,
        SettlementMemo,
        PreparationChecklist,
        InstallationChecklist,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(Iden)]
    enum OrderMaterials {
        Table,
        Id,
        OrderId,
        ProductId,
        PlannedQuantity,
        HeldQuantity,
        UsedQuantity,
        ShortageQuantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Schedules {
        Table,
        Id,
        UserId,
        OrderId,
        ScheduleType,
        Title,
        Date,
        Time,
        DurationMinutes,
        IsActive,
        IsCompleted,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum OutsourceOrders {
        Table,
        Id,
        UserId,
        OrderId,
        SupplierName,
        Description,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Customers::UserId).uuid().not_null())
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Phone).string())
                        .col(ColumnDef::new(Customers::Address).string())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Products::UserId).uuid().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Products::StockQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::QuotationAmount).decimal())
                        .col(ColumnDef::new(Orders::ConfirmedAmount).decimal())
                        .col(ColumnDef::new(Orders::MeasurementDate).date())
                        .col(ColumnDef::new(Orders::InstallationDate).date())
                        .col(ColumnDef::new(Orders::PaymentMethod).string())
                        .col(ColumnDef::new(Orders::SettlementMemo).string())
                        .col(ColumnDef::new(Orders::PreparationChecklist).json().not_null())
                        .col(
                            ColumnDef::new(Orders::InstallationChecklist)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Orders::Version).integer().not_null().default(1))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderMaterials::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderMaterials::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderMaterials::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderMaterials::PlannedQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderMaterials::HeldQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderMaterials::UsedQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderMaterials::ShortageQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderMaterials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderMaterials::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_materials_order")
                                .from(OrderMaterials::Table, OrderMaterials::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_materials_product")
                                .from(OrderMaterials::Table, OrderMaterials::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_order_materials_order_id")
                        .table(OrderMaterials::Table)
                        .col(OrderMaterials::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Schedules::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Schedules::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Schedules::UserId).uuid().not_null())
                        .col(ColumnDef::new(Schedules::OrderId).uuid())
                        .col(ColumnDef::new(Schedules::ScheduleType).string().not_null())
                        .col(ColumnDef::new(Schedules::Title).string().not_null())
                        .col(ColumnDef::new(Schedules::Date).date().not_null())
                        .col(ColumnDef::new(Schedules::Time).time())
                        .col(ColumnDef::new(Schedules::DurationMinutes).integer())
                        .col(
                            ColumnDef::new(Schedules::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Schedules::IsCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Schedules::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Schedules::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedules_order")
                                .from(Schedules::Table, Schedules::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_schedules_order_id")
                        .table(Schedules::Table)
                        .col(Schedules::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OutsourceOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OutsourceOrders::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OutsourceOrders::UserId).uuid().not_null())
                        .col(ColumnDef::new(OutsourceOrders::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(OutsourceOrders::SupplierName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OutsourceOrders::Description).string())
                        .col(ColumnDef::new(OutsourceOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(OutsourceOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OutsourceOrders::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_outsource_orders_order")
                                .from(OutsourceOrders::Table, OutsourceOrders::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_outsource_orders_order_id")
                        .table(OutsourceOrders::Table)
                        .col(OutsourceOrders::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OutsourceOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Schedules::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderMaterials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }
}
