use murmur_types::api::PageQuery;
use murmur_types::models::Micropost;

use crate::models::{MICROPOST_COLUMNS, micropost_from_row};
use crate::{Database, Result};

impl Database {
    /// Status feed: the user's own microposts plus those of everyone they
    /// follow, newest first. One query regardless of how many users are followed.
    pub fn feed(&self, user_id: i64, page: PageQuery) -> Result<Vec<Micropost>> {
        let (limit, offset) = page.limit_offset();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MICROPOST_COLUMNS}
                 FROM microposts
                 WHERE user_id = ?1
                    OR user_id IN (SELECT followed_id FROM relationships WHERE follower_id = ?1)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map((user_id, limit, offset), micropost_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
