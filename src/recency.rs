use crate::post::{Category, CategoryMap, Post, Timestamp};

/// Latest `created_at` in `posts`, or epoch 0 when empty.
pub fn latest_timestamp(posts: &[Post]) -> Timestamp {
    posts
        .iter()
        .map(|post| post.created_at)
        .max()
        .unwrap_or(Timestamp::EPOCH)
}

/// Category holding the single most recent post.
///
/// Walks categories in [`Category::ALL`] order and only replaces the running
/// best on a strictly greater timestamp, so ties resolve to the earlier
/// category. Nothing newer than epoch 0 yields `None`.
pub fn most_recent_category(lists: &CategoryMap<&[Post]>) -> Option<Category> {
    let mut best = None;
    let mut best_time = Timestamp::EPOCH;
    for (category, posts) in lists.iter() {
        let time = latest_timestamp(posts);
        if time > best_time {
            best_time = time;
            best = Some(category);
        }
    }
    best
}
