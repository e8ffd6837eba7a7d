pub use sea_orm_migration::prelude::*;

mod iden;
mod m20250801_000001_create_roster_tables;
mod m20250801_000002_create_deadline_table;
mod m20250801_000003_create_access_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_roster_tables::Migration),
            Box::new(m20250801_000002_create_deadline_table::Migration),
            Box::new(m20250801_000003_create_access_tables::Migration),
        ]
    }
}
