use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::post::{non_empty, AuthorRef, Category, CategoryMap, Post, Timestamp};

pub const UNKNOWN_AUTHOR_ID: &str = "unknown";
const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_INITIALS: &str = "??";

/// Display identity derived from the first post seen for an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorIdentity {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub initials: String,
    pub avatar: String,
}

impl AuthorIdentity {
    fn derive(id: &str, post: &Post) -> Self {
        let author = post.author.as_ref();
        let profile = author.and_then(AuthorRef::profile);
        let initials = initials_for(author);
        let avatar = non_empty(post.avatar.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| initials.clone());
        Self {
            id: id.to_string(),
            name: display_name(author),
            username: author.and_then(AuthorRef::username).map(str::to_string),
            first_name: profile
                .and_then(|p| p.first_name.clone())
                .unwrap_or_default(),
            last_name: profile
                .and_then(|p| p.last_name.clone())
                .unwrap_or_default(),
            initials,
            avatar,
        }
    }

    /// Handle used for deck keys and profile links.
    pub fn handle(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.id)
    }
}

/// One author's posts split by category, in the order they were folded in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorBucket {
    pub author: AuthorIdentity,
    pub posts: CategoryMap<Vec<Post>>,
    pub most_recent: Timestamp,
}

impl AuthorBucket {
    pub fn category(&self, category: Category) -> &[Post] {
        self.posts.get(category)
    }

    pub fn len(&self) -> usize {
        self.posts.iter().map(|(_, posts)| posts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Category lists concatenated in fixed category order.
    pub fn flatten(&self) -> impl Iterator<Item = &Post> {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.posts.get(category).iter())
    }
}

/// Buckets keyed by author id, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedPosts {
    buckets: Vec<AuthorBucket>,
    index: HashMap<String, usize>,
}

impl GroupedPosts {
    pub fn get(&self, author_id: &str) -> Option<&AuthorBucket> {
        self.index.get(author_id).map(|&slot| &self.buckets[slot])
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthorBucket> {
        self.buckets.iter()
    }

    /// Newest-active author first. Equal timestamps keep first-seen order.
    pub fn into_sorted(self) -> Vec<SortedBucket> {
        let mut sorted: Vec<SortedBucket> = self
            .buckets
            .into_iter()
            .map(|bucket| SortedBucket {
                date: bucket.most_recent.date_string(),
                order_id: bucket.author.id.clone(),
                most_recent: bucket.most_recent,
                data: bucket,
            })
            .collect();
        sorted.sort_by(|a, b| b.most_recent.cmp(&a.most_recent));
        sorted
    }

    fn bucket_for(&mut self, author_id: String, post: &Post) -> &mut AuthorBucket {
        let slot = match self.index.get(&author_id) {
            Some(&slot) => slot,
            None => {
                let slot = self.buckets.len();
                self.buckets.push(AuthorBucket {
                    author: AuthorIdentity::derive(&author_id, post),
                    posts: CategoryMap::default(),
                    most_recent: post.created_at,
                });
                self.index.insert(author_id, slot);
                slot
            }
        };
        &mut self.buckets[slot]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortedBucket {
    pub date: String,
    pub order_id: String,
    pub most_recent: Timestamp,
    pub data: AuthorBucket,
}

/// Folds posts into per-author category buckets.
///
/// Every post advances its author's `most_recent`, but only posts with a
/// recognized category are appended to a list.
pub fn group_posts<'a, I>(posts: I) -> GroupedPosts
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut grouped = GroupedPosts::default();
    let mut dropped = 0usize;
    for post in posts {
        let bucket = grouped.bucket_for(author_key(post), post);
        if post.created_at > bucket.most_recent {
            bucket.most_recent = post.created_at;
        }
        match post.category() {
            Some(category) => bucket.posts.get_mut(category).push(post.clone()),
            None => dropped += 1,
        }
    }
    debug!(
        authors = grouped.len(),
        dropped_uncategorized = dropped,
        "grouped posts"
    );
    grouped
}

/// Post `user_id`, then the author object's id, then a bare author handle.
pub fn author_key(post: &Post) -> String {
    if let Some(id) = non_empty(post.user_id.as_deref()) {
        return id.to_string();
    }
    match post.author.as_ref() {
        Some(AuthorRef::Profile(profile)) => non_empty(profile.id.as_deref())
            .unwrap_or(UNKNOWN_AUTHOR_ID)
            .to_string(),
        Some(AuthorRef::Handle(handle)) | Some(AuthorRef::Id(handle)) => handle.clone(),
        None => UNKNOWN_AUTHOR_ID.to_string(),
    }
}

fn display_name(author: Option<&AuthorRef>) -> String {
    match author {
        None | Some(AuthorRef::Id(_)) => UNKNOWN_NAME.to_string(),
        Some(AuthorRef::Handle(handle)) => handle.clone(),
        Some(AuthorRef::Profile(profile)) => non_empty(profile.username.as_deref())
            .unwrap_or(UNKNOWN_NAME)
            .to_string(),
    }
}

fn initials_for(author: Option<&AuthorRef>) -> String {
    let profile = match author {
        None | Some(AuthorRef::Id(_)) => return UNKNOWN_INITIALS.to_string(),
        Some(AuthorRef::Handle(handle)) => return leading_upper(handle, 2),
        Some(AuthorRef::Profile(profile)) => profile,
    };
    let first = non_empty(profile.first_name.as_deref());
    let last = non_empty(profile.last_name.as_deref());
    match (first, last) {
        (Some(first), Some(last)) => format!("{}{}", leading_upper(first, 1), leading_upper(last, 1)),
        (Some(first), None) => leading_upper(first, 2),
        _ => non_empty(profile.username.as_deref())
            .map(|username| leading_upper(username, 2))
            .filter(|initials| !initials.is_empty())
            .unwrap_or_else(|| UNKNOWN_INITIALS.to_string()),
    }
}

fn leading_upper(text: &str, count: usize) -> String {
    text.chars().take(count).collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::AuthorProfile;

    fn profile(id: &str, username: &str, first: &str, last: &str) -> AuthorRef {
        let opt = |value: &str| (!value.is_empty()).then(|| value.to_string());
        AuthorRef::Profile(AuthorProfile {
            id: opt(id),
            username: opt(username),
            first_name: opt(first),
            last_name: opt(last),
        })
    }

    fn post(id: &str, category: Category, millis: i64, author: AuthorRef) -> Post {
        Post::new(id, category, Timestamp::from_millis(millis)).by(author)
    }

    #[test]
    fn groups_by_author_and_category() {
        let ada = profile("1", "ada", "Ada", "Lovelace");
        let posts = vec![
            post("a", Category::Thoughts, 10, ada.clone()),
            post("b", Category::Media, 30, AuthorRef::handle("grace")),
            post("c", Category::Milestones, 20, ada.clone()),
            post("d", Category::Thoughts, 5, ada),
        ];
        let grouped = group_posts(&posts);
        assert_eq!(grouped.len(), 2);

        let ada = grouped.get("1").unwrap();
        let ids: Vec<&str> = ada.category(Category::Thoughts).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "d"]);
        assert_eq!(ada.category(Category::Milestones).len(), 1);
        assert_eq!(ada.most_recent, Timestamp::from_millis(20));
        assert_eq!(ada.author.initials, "AL");
        assert_eq!(ada.author.name, "ada");

        let grace = grouped.get("grace").unwrap();
        assert_eq!(grace.author.name, "grace");
        assert_eq!(grace.author.initials, "GR");
        assert_eq!(grace.author.username.as_deref(), Some("grace"));
    }

    #[test]
    fn numeric_author_keys_the_bucket_without_display_identity() {
        let posts: Vec<Post> =
            serde_json::from_str(r#"[{"id": "a", "author": 42, "type": "thoughts"}]"#).unwrap();
        let grouped = group_posts(&posts);
        let bucket = grouped.get("42").unwrap();
        assert_eq!(bucket.author.name, "Unknown");
        assert_eq!(bucket.author.initials, "??");
        assert_eq!(bucket.author.avatar, "??");
        assert_eq!(bucket.author.username, None);
        assert_eq!(bucket.author.handle(), "42");
    }

    #[test]
    fn unknown_category_is_dropped_but_advances_recency() {
        let mut odd = post("x", Category::Thoughts, 99, AuthorRef::handle("kim"));
        odd.kind = Some("poll".into());
        let posts = vec![post("a", Category::Thoughts, 10, AuthorRef::handle("kim")), odd];
        let grouped = group_posts(&posts);
        let kim = grouped.get("kim").unwrap();
        assert_eq!(kim.len(), 1);
        assert_eq!(kim.most_recent, Timestamp::from_millis(99));
    }

    #[test]
    fn identity_fallbacks() {
        let anonymous = Post::new("a", Category::Thoughts, Timestamp::EPOCH);
        let grouped = group_posts([&anonymous]);
        let bucket = grouped.get(UNKNOWN_AUTHOR_ID).unwrap();
        assert_eq!(bucket.author.name, "Unknown");
        assert_eq!(bucket.author.initials, "??");
        assert_eq!(bucket.author.avatar, "??");

        let first_only = post("b", Category::Media, 1, profile("2", "", "zoe", ""));
        let grouped = group_posts([&first_only]);
        let bucket = grouped.get("2").unwrap();
        assert_eq!(bucket.author.initials, "ZO");
        assert_eq!(bucket.author.name, "Unknown");
        assert_eq!(bucket.author.handle(), "2");

        let mut with_avatar = post("c", Category::Media, 1, profile("3", "max", "", ""));
        with_avatar.avatar = Some("https://img.example/max.png".into());
        let grouped = group_posts([&with_avatar]);
        let bucket = grouped.get("3").unwrap();
        assert_eq!(bucket.author.initials, "MA");
        assert_eq!(bucket.author.avatar, "https://img.example/max.png");
    }

    #[test]
    fn user_id_wins_over_author_id() {
        let mut tagged = post("a", Category::Thoughts, 1, profile("7", "ann", "", ""));
        tagged.user_id = Some("u-7".into());
        assert_eq!(author_key(&tagged), "u-7");
        let untagged = post("b", Category::Thoughts, 1, profile("", "ann", "", ""));
        assert_eq!(author_key(&untagged), UNKNOWN_AUTHOR_ID);
    }

    #[test]
    fn sorted_newest_author_first_with_stable_ties() {
        let posts = vec![
            post("a", Category::Thoughts, 100, AuthorRef::handle("old")),
            post("b", Category::Thoughts, 500, AuthorRef::handle("new")),
            post("c", Category::Thoughts, 100, AuthorRef::handle("tie")),
        ];
        let sorted = group_posts(&posts).into_sorted();
        let order: Vec<&str> = sorted.iter().map(|entry| entry.order_id.as_str()).collect();
        assert_eq!(order, ["new", "old", "tie"]);
        assert_eq!(sorted[0].date, "1970-01-01");
    }
}
