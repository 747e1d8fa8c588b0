use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UsageCounters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UsageCounters::SubjectId).text().not_null())
                    .col(ColumnDef::new(UsageCounters::FeatureKey).text().not_null())
                    .col(ColumnDef::new(UsageCounters::PeriodKey).text().not_null())
                    .col(
                        ColumnDef::new(UsageCounters::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageCounters::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(UsageCounters::SubjectId)
                            .col(UsageCounters::FeatureKey)
                            .col(UsageCounters::PeriodKey),
                    )
                    .check(Expr::col(UsageCounters::Count).gte(0))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsageCounters::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UsageCounters {
    Table,
    SubjectId,
    FeatureKey,
    PeriodKey,
    Count,
    UpdatedAt,
}
