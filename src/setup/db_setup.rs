use redb::Database;

use crate::models::db_operations::posts_db_operations::{self, DbError};

/// Creates the storage table and writes the seed collection when the
/// posts key is absent. Safe to run against an existing database.
pub fn setup_posts_db(db: &Database) -> Result<(), DbError> {
    posts_db_operations::initialize_store(db)
}
