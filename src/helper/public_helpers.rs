use crate::models::db_operations::posts_db_operations;
use crate::models::{AdjacentPosts, Post};
use actix_web::web;
use redb::Database;

pub fn fetch_feed(db: &web::Data<Database>) -> Result<Vec<Post>, posts_db_operations::DbError> {
    posts_db_operations::read_all_posts(db)
}

pub fn fetch_post_by_id(
    id: &str,
    db: &web::Data<Database>,
) -> Result<Option<Post>, posts_db_operations::DbError> {
    posts_db_operations::read_post(db, id)
}

pub fn fetch_adjacent_posts(
    id: &str,
    db: &web::Data<Database>,
) -> Result<AdjacentPosts, posts_db_operations::DbError> {
    posts_db_operations::read_adjacent_posts(db, id)
}
