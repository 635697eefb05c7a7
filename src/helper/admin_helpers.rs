use std::collections::HashMap;

use actix_web::web;
use chrono::Utc;
use redb::Database;

use crate::helper::form_helpers;
use crate::models::db_operations::posts_db_operations;
use crate::models::Post;

pub const DEFAULT_IMAGE_URL: &str = "https://picsum.photos/800/400";
pub const DEFAULT_AUTHOR: &str = "Admin";

/// Mints a caller-assigned id from the current time, the way new
/// entries have always been identified in this store.
pub fn mint_post_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

pub fn today_iso() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Assembles a `Post` from the submitted editor form. An empty id field
/// means a new entry, so one is minted; empty date/image/author fall
/// back to the editor defaults. Title is the only required field.
pub fn post_from_form(parsed: &HashMap<String, String>) -> Option<Post> {
    let title = parsed.get("title").map(|s| s.trim()).unwrap_or("");
    if title.is_empty() {
        return None;
    }

    let field = |name: &str| parsed.get(name).map(|s| s.trim().to_string()).unwrap_or_default();

    let id = match field("id") {
        s if s.is_empty() => mint_post_id(),
        s => s,
    };
    let date = match field("date") {
        s if s.is_empty() => today_iso(),
        s => s,
    };
    let image_url = match field("image_url") {
        s if s.is_empty() => DEFAULT_IMAGE_URL.to_string(),
        s => s,
    };
    let author = match field("author") {
        s if s.is_empty() => DEFAULT_AUTHOR.to_string(),
        s => s,
    };

    Some(Post {
        id,
        title: title.to_string(),
        excerpt: parsed.get("excerpt").cloned().unwrap_or_default(),
        content: parsed.get("content").cloned().unwrap_or_default(),
        date,
        image_url,
        author,
        tags: form_helpers::parse_tags(parsed.get("tags").map(String::as_str).unwrap_or("")),
    })
}

pub fn save_entry(
    db: &web::Data<Database>,
    post: &Post,
) -> Result<(), posts_db_operations::DbError> {
    posts_db_operations::save_post(db, post)
}

pub fn delete_entry(
    db: &web::Data<Database>,
    id: &str,
) -> Result<(), posts_db_operations::DbError> {
    posts_db_operations::delete_post(db, id)
}
