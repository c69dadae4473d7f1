use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::post::{Post, Reply};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Either a bare array of posts or an export envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum PostFile {
    Bare(Vec<Post>),
    Envelope {
        #[serde(default)]
        posts: Vec<Post>,
        #[serde(default)]
        replies: Vec<Reply>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub posts: Vec<Post>,
    pub replies: Vec<Reply>,
}

impl Dataset {
    pub fn replies_for(&self, post_id: &str) -> Vec<Reply> {
        self.replies
            .iter()
            .filter(|reply| reply.post_id == post_id)
            .cloned()
            .collect()
    }
}

pub fn parse_dataset(raw: &str) -> Result<Dataset, serde_json::Error> {
    Ok(match serde_json::from_str::<PostFile>(raw)? {
        PostFile::Bare(posts) => Dataset {
            posts,
            replies: Vec::new(),
        },
        PostFile::Envelope { posts, replies } => Dataset { posts, replies },
    })
}

pub fn load_dataset(path: &Path) -> Result<Dataset, InputError> {
    let raw = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&raw).map_err(|source| InputError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Orders posts newest first, the order row chunking expects. Equal
/// timestamps keep their input order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
