use sea_orm_migration::{
    prelude::{
        async_trait,
        sea_orm::{self, DeriveIden},
        DbErr, DeriveMigrationName, Expr, ForeignKey, ForeignKeyAction, MigrationTrait,
        SchemaManager, Table,
    },
    schema::{string_uniq, timestamp_with_time_zone, uuid, uuid_uniq},
};

use crate::m20240722_000001_create_users_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RegistrationProfile::Table)
                    .if_not_exists()
                    .col(uuid(RegistrationProfile::Id).primary_key())
                    .col(uuid_uniq(RegistrationProfile::UserId))
                    .col(string_uniq(RegistrationProfile::ActivationKey))
                    .col(
                        timestamp_with_time_zone(RegistrationProfile::ActivationStartedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-registration_profiles-user_id")
                            .from(RegistrationProfile::Table, RegistrationProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RegistrationProfile::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum RegistrationProfile {
    #[sea_orm(iden = "registration_profiles")]
    Table,
    Id,
    UserId,
    ActivationKey,
    ActivationStartedAt,
}
