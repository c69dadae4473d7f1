use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Content category of a post. `ALL` is the fixed iteration order used by
/// every per-category walk in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Thoughts,
    Media,
    Milestones,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Thoughts, Category::Media, Category::Milestones];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Thoughts => "thoughts",
            Category::Media => "media",
            Category::Milestones => "milestones",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Thoughts => "Thoughts",
            Category::Media => "Media",
            Category::Milestones => "Milestones",
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            Category::Thoughts => "No thoughts yet",
            Category::Media => "No media yet",
            Category::Milestones => "No milestones yet",
        }
    }

    /// Exact, case-sensitive lookup. Anything else is not a category.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "thoughts" => Some(Category::Thoughts),
            "media" => Some(Category::Media),
            "milestones" => Some(Category::Milestones),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per category, addressed by [`Category`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryMap<T> {
    pub thoughts: T,
    pub media: T,
    pub milestones: T,
}

impl<T> CategoryMap<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            thoughts: f(Category::Thoughts),
            media: f(Category::Media),
            milestones: f(Category::Milestones),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Thoughts => &self.thoughts,
            Category::Media => &self.media,
            Category::Milestones => &self.milestones,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Thoughts => &mut self.thoughts,
            Category::Media => &mut self.media,
            Category::Milestones => &mut self.milestones,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    pub fn map<'s, U>(&'s self, mut f: impl FnMut(Category, &'s T) -> U) -> CategoryMap<U> {
        CategoryMap::from_fn(|category| f(category, self.get(category)))
    }
}

/// Milliseconds since the Unix epoch. Missing or unparsable input is epoch 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    pub fn millis(self) -> i64 {
        self.0
    }

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Timestamp::EPOCH;
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Timestamp(parsed.timestamp_millis());
        }
        for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
                return Timestamp(naive.and_utc().timestamp_millis());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Timestamp(midnight.and_utc().timestamp_millis());
            }
        }
        Timestamp::EPOCH
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    /// UTC calendar date, `YYYY-MM-DD`.
    pub fn date_string(self) -> String {
        self.to_datetime()
            .unwrap_or_default()
            .format("%Y-%m-%d")
            .to_string()
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(raw)) => Timestamp::parse(&raw),
            Some(Value::Number(number)) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f as i64))
                .map(Timestamp)
                .unwrap_or(Timestamp::EPOCH),
            _ => Timestamp::EPOCH,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Author of a post or reply: a profile object, a bare handle, or a bare
/// numeric id. A numeric id keys the author but carries no display identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Profile(AuthorProfile),
    Handle(String),
    Id(String),
}

impl AuthorRef {
    pub fn handle(name: impl Into<String>) -> Self {
        AuthorRef::Handle(name.into())
    }

    pub fn profile(&self) -> Option<&AuthorProfile> {
        match self {
            AuthorRef::Profile(profile) => Some(profile),
            AuthorRef::Handle(_) | AuthorRef::Id(_) => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            AuthorRef::Profile(profile) => profile.id.as_deref(),
            AuthorRef::Id(id) => Some(id.as_str()),
            AuthorRef::Handle(_) => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            AuthorRef::Profile(profile) => non_empty(profile.username.as_deref()),
            AuthorRef::Handle(handle) => Some(handle.as_str()),
            AuthorRef::Id(_) => None,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let text = |key: &str, alt: &str| {
                    map.get(key)
                        .or_else(|| map.get(alt))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };
                Some(AuthorRef::Profile(AuthorProfile {
                    id: map.get("id").and_then(identifier_text),
                    username: text("username", "userName"),
                    first_name: text("first_name", "firstName"),
                    last_name: text("last_name", "lastName"),
                }))
            }
            Value::Number(number) => Some(AuthorRef::Id(number.to_string())),
            other => identifier_text(&other).map(AuthorRef::Handle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPost")]
pub struct Post {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRef>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: Timestamp,
}

/// Wire shape of a post. Snake and camel spellings are read as separate
/// fields so a record carrying both still decodes; camel case wins.
#[derive(Deserialize)]
struct RawPost {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    user_id: Option<String>,
    #[serde(default, rename = "userId", deserialize_with = "deserialize_optional_id")]
    user_id_camel: Option<String>,
    #[serde(default, deserialize_with = "deserialize_author")]
    author: Option<AuthorRef>,
    #[serde(default, rename = "type", deserialize_with = "deserialize_kind")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "deserialize_kind")]
    category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    content: String,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    media_url: Option<String>,
    #[serde(default, rename = "mediaUrl", deserialize_with = "deserialize_optional_text")]
    media_url_camel: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    avatar: Option<String>,
    #[serde(default)]
    created_at: Timestamp,
    #[serde(default, rename = "createdAt")]
    created_at_camel: Timestamp,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        Self {
            id: raw.id,
            user_id: raw.user_id_camel.or(raw.user_id),
            author: raw.author,
            kind: raw.kind.or(raw.category),
            content: raw.content,
            media_url: raw.media_url_camel.or(raw.media_url),
            avatar: raw.avatar,
            created_at: prefer_set(raw.created_at_camel, raw.created_at),
        }
    }
}

fn prefer_set(primary: Timestamp, fallback: Timestamp) -> Timestamp {
    if primary == Timestamp::EPOCH {
        fallback
    } else {
        primary
    }
}

impl Post {
    pub fn new(id: impl Into<String>, category: Category, created_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            author: None,
            kind: Some(category.as_str().to_string()),
            content: String::new(),
            media_url: None,
            avatar: None,
            created_at,
        }
    }

    pub fn by(mut self, author: AuthorRef) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Missing or empty kinds count as thoughts; unrecognized kinds have no category.
    pub fn category(&self) -> Option<Category> {
        match self.kind.as_deref() {
            None | Some("") => Some(Category::Thoughts),
            Some(kind) => Category::parse(kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawReply")]
pub struct Reply {
    pub id: String,
    pub post_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRef>,
    pub content: String,
    pub created_at: Timestamp,
}

#[derive(Deserialize)]
struct RawReply {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    post_id: Option<String>,
    #[serde(default, rename = "postId", deserialize_with = "deserialize_optional_id")]
    post_id_camel: Option<String>,
    #[serde(default, deserialize_with = "deserialize_author")]
    author: Option<AuthorRef>,
    #[serde(default, deserialize_with = "deserialize_text")]
    content: String,
    #[serde(default)]
    created_at: Timestamp,
    #[serde(default, rename = "createdAt")]
    created_at_camel: Timestamp,
}

impl From<RawReply> for Reply {
    fn from(raw: RawReply) -> Self {
        Self {
            id: raw.id,
            post_id: raw.post_id_camel.or(raw.post_id).unwrap_or_default(),
            author: raw.author,
            content: raw.content,
            created_at: prefer_set(raw.created_at_camel, raw.created_at),
        }
    }
}

impl Reply {
    pub fn new(id: impl Into<String>, post_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            post_id: post_id.into(),
            author: None,
            content: content.into(),
            created_at: Timestamp::EPOCH,
        }
    }

    pub fn by(mut self, author: AuthorRef) -> Self {
        self.author = Some(author);
        self
    }

    pub fn author_id(&self) -> Option<&str> {
        self.author.as_ref().and_then(AuthorRef::id)
    }

    pub fn author_label(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|author| author.profile())
            .and_then(|profile| non_empty(profile.username.as_deref()))
            .unwrap_or("User")
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

pub(crate) fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(deserialize_optional_id(deserializer)?.unwrap_or_default())
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(identifier_text))
}

fn deserialize_author<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<AuthorRef>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(AuthorRef::from_value))
}

/// Any non-null kind is kept; non-string values become an unrecognized kind.
fn deserialize_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

fn deserialize_optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_fall_back_to_epoch() {
        assert_eq!(Timestamp::parse(""), Timestamp::EPOCH);
        assert_eq!(Timestamp::parse("yesterday-ish"), Timestamp::EPOCH);
        assert_eq!(
            Timestamp::parse("1970-01-01T00:00:01Z"),
            Timestamp::from_millis(1000)
        );
        assert_eq!(Timestamp::parse("1970-01-02"), Timestamp::from_millis(86_400_000));
        assert_eq!(Timestamp::parse("1500"), Timestamp::EPOCH);
    }

    #[test]
    fn decodes_aliases_and_loose_authors() {
        let raw = r#"{
            "id": 7,
            "userId": 42,
            "author": {"id": 42, "username": "ada", "firstName": "Ada"},
            "type": "media",
            "content": null,
            "mediaUrl": "https://img.example/1.png",
            "createdAt": "2024-03-01T10:00:00Z"
        }"#;
        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.id, "7");
        assert_eq!(post.user_id.as_deref(), Some("42"));
        assert_eq!(post.category(), Some(Category::Media));
        assert_eq!(post.content, "");
        let author = post.author.as_ref().unwrap();
        assert_eq!(author.id(), Some("42"));
        assert_eq!(author.username(), Some("ada"));
        assert_eq!(
            author.profile().unwrap().first_name.as_deref(),
            Some("Ada")
        );
        assert!(post.created_at > Timestamp::EPOCH);

        let handle: Post =
            serde_json::from_str(r#"{"id": "a", "author": "grace", "created_at": false}"#).unwrap();
        assert_eq!(handle.author, Some(AuthorRef::handle("grace")));
        assert_eq!(handle.created_at, Timestamp::EPOCH);
        assert_eq!(handle.category(), Some(Category::Thoughts));
    }

    #[test]
    fn unknown_kind_has_no_category() {
        let post: Post = serde_json::from_str(r#"{"id": "x", "type": "poll"}"#).unwrap();
        assert_eq!(post.category(), None);
        let post: Post = serde_json::from_str(r#"{"id": "x", "type": "Media"}"#).unwrap();
        assert_eq!(post.category(), None);
    }

    #[test]
    fn both_spellings_of_a_field_decode_with_camel_case_preferred() {
        let post: Post = serde_json::from_str(
            r#"{"id": "a", "author": "ada", "created_at": "2024-01-01T00:00:00Z", "createdAt": "2024-02-01T00:00:00Z", "user_id": "u1", "userId": "u2", "media_url": "a.png", "mediaUrl": "b.png"}"#,
        )
        .unwrap();
        assert_eq!(post.created_at, Timestamp::parse("2024-02-01T00:00:00Z"));
        assert_eq!(post.user_id.as_deref(), Some("u2"));
        assert_eq!(post.media_url.as_deref(), Some("b.png"));

        let fallback: Post =
            serde_json::from_str(r#"{"id": "b", "created_at": "2024-01-01", "createdAt": null}"#).unwrap();
        assert_eq!(fallback.created_at, Timestamp::parse("2024-01-01"));

        let reply: Reply = serde_json::from_str(
            r#"{"id": "r", "post_id": "p", "postId": "p", "created_at": 5, "createdAt": 9}"#,
        )
        .unwrap();
        assert_eq!(reply.post_id, "p");
        assert_eq!(reply.created_at, Timestamp::from_millis(9));
    }

    #[test]
    fn non_string_kind_is_unrecognized_not_fatal() {
        let posts: Vec<Post> = serde_json::from_str(
            r#"[{"id": "x", "type": 7}, {"id": "y", "type": "thoughts"}, {"id": "z", "type": null, "avatar": 3}]"#,
        )
        .unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].category(), None);
        assert_eq!(posts[1].category(), Some(Category::Thoughts));
        assert_eq!(posts[2].category(), Some(Category::Thoughts));
        assert_eq!(posts[2].avatar, None);
    }

    #[test]
    fn numeric_author_is_an_id_without_a_handle() {
        let post: Post = serde_json::from_str(r#"{"id": "a", "author": 42}"#).unwrap();
        let author = post.author.as_ref().unwrap();
        assert_eq!(author, &AuthorRef::Id("42".into()));
        assert_eq!(author.id(), Some("42"));
        assert_eq!(author.username(), None);
        assert!(author.profile().is_none());
    }

    #[test]
    fn reply_author_label_defaults_to_user() {
        let reply = Reply::new("r1", "p1", "hi");
        assert_eq!(reply.author_label(), "User");
        let reply = reply.by(AuthorRef::Profile(AuthorProfile {
            id: Some("9".into()),
            username: Some("lin".into()),
            ..AuthorProfile::default()
        }));
        assert_eq!(reply.author_label(), "lin");
        assert_eq!(reply.author_id(), Some("9"));
    }

    #[test]
    fn category_map_iterates_in_fixed_order() {
        let map = CategoryMap::from_fn(|category| category.as_str().len());
        let order: Vec<Category> = map.iter().map(|(category, _)| category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert_eq!(*map.get(Category::Milestones), 10);
    }
}
