use redb::{Database, ReadableTable, TableDefinition, CommitError, StorageError, TableError, TransactionError};
use crate::models::{AdjacentPosts, Post};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

// The whole collection is one JSON array under a fixed key, read and
// rewritten in full on every mutation. Two concurrent writers race at
// the blob level and the later commit wins.
pub const STORAGE: TableDefinition<&str, &str> = TableDefinition::new("storage");
pub const POSTS_KEY: &str = "devlog_posts";

/// The two fixed entries written on first-ever access.
pub fn seed_posts() -> Vec<Post> {
    vec![
        Post {
            id: "1".to_string(),
            title: "Deploying our first Kubernetes Cluster".to_string(),
            excerpt: "A deep dive into the challenges and triumphs of moving our monolithic app to k8s.".to_string(),
            content: "We started the morning with high hopes. By noon, the pods were crashing loops. But after tweaking the readiness probes...".to_string(),
            date: "2023-10-15".to_string(),
            image_url: "https://picsum.photos/800/400?random=1".to_string(),
            author: "Alex Dev".to_string(),
            tags: vec!["DevOps".to_string(), "Kubernetes".to_string()],
        },
        Post {
            id: "2".to_string(),
            title: "React 19 Features Review".to_string(),
            excerpt: "Checking out the compiler and new hook optimizations.".to_string(),
            content: "React 19 brings some massive changes to how we think about memoization. The new compiler is a game changer...".to_string(),
            date: "2023-11-02".to_string(),
            image_url: "https://picsum.photos/800/400?random=2".to_string(),
            author: "Sarah Code".to_string(),
            tags: vec!["React".to_string(), "Frontend".to_string()],
        },
    ]
}

/// Writes the seed collection if the storage key is absent. Idempotent:
/// existing data is never overwritten.
pub fn initialize_store(db: &Database) -> Result<(), DbError> {
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(STORAGE)?;
        if table.get(POSTS_KEY)?.is_none() {
            let blob = serde_json::to_string(&seed_posts())?;
            table.insert(POSTS_KEY, blob.as_str())?;
        }
    }
    write_txn.commit()?;
    Ok(())
}

fn write_all_posts(db: &Database, posts: &[Post]) -> Result<(), DbError> {
    let blob = serde_json::to_string(posts)?;
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(STORAGE)?;
        table.insert(POSTS_KEY, blob.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Returns the full collection in stored order (newest-first by
/// construction; the order is never re-derived from the `date` field).
/// Seeds lazily on first-ever access. A blob that fails to parse
/// propagates as `DbError::SerdeJson`.
pub fn read_all_posts(db: &Database) -> Result<Vec<Post>, DbError> {
    {
        let read_txn = db.begin_read()?;
        match read_txn.open_table(STORAGE) {
            Ok(table) => {
                if let Some(guard) = table.get(POSTS_KEY)? {
                    return Ok(serde_json::from_str(guard.value())?);
                }
            }
            Err(TableError::TableDoesNotExist(_)) => {}
            Err(e) => return Err(e.into()),
        };
    }
    initialize_store(db)?;
    Ok(seed_posts())
}

/// Linear scan by id. Absence is `None`, never an error.
pub fn read_post(db: &Database, id: &str) -> Result<Option<Post>, DbError> {
    let posts = read_all_posts(db)?;
    Ok(posts.into_iter().find(|p| p.id == id))
}

/// Positional neighbor lookup: `newer` is the entry before `id` in
/// stored order, `older` the one after. Both absent when `id` is
/// unknown. This is NOT a date comparison.
pub fn read_adjacent_posts(db: &Database, id: &str) -> Result<AdjacentPosts, DbError> {
    let mut posts = read_all_posts(db)?;
    let index = match posts.iter().position(|p| p.id == id) {
        Some(i) => i,
        None => return Ok(AdjacentPosts::default()),
    };

    // Remove the later slot first so the earlier index stays valid.
    let older = if index + 1 < posts.len() {
        Some(posts.remove(index + 1))
    } else {
        None
    };
    let newer = if index > 0 {
        Some(posts.remove(index - 1))
    } else {
        None
    };

    Ok(AdjacentPosts { newer, older })
}

/// Replaces an existing post in place (position unchanged) or inserts a
/// new one at the front, then rewrites the whole blob. Last writer wins.
pub fn save_post(db: &Database, post: &Post) -> Result<(), DbError> {
    let mut posts = read_all_posts(db)?;
    match posts.iter().position(|p| p.id == post.id) {
        Some(index) => posts[index] = post.clone(),
        None => posts.insert(0, post.clone()),
    }
    write_all_posts(db, &posts)
}

/// Removes the entry with the given id. Deleting an unknown id is a
/// silent no-op and leaves the stored blob untouched.
pub fn delete_post(db: &Database, id: &str) -> Result<(), DbError> {
    let mut posts = read_all_posts(db)?;
    let original_len = posts.len();
    posts.retain(|p| p.id != id);
    if posts.len() == original_len {
        return Ok(());
    }
    write_all_posts(db, &posts)
}
