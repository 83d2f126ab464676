pub use sea_orm_migration::prelude::*;

mod m20240722_000001_create_users_table;
mod m20240722_000002_create_registration_profiles_table;
mod m20240722_000003_create_units_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240722_000001_create_users_table::Migration),
            Box::new(m20240722_000002_create_registration_profiles_table::Migration),
            Box::new(m20240722_000003_create_units_table::Migration),
        ]
    }
}
