use anyhow::{bail, Result};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyUpdate {
    pub content: String,
}

/// Remote reply operations. Calls block; callers run them off the UI thread.
pub trait ReplyService: Send + Sync {
    fn update_reply(&self, reply_id: &str, update: &ReplyUpdate) -> Result<()>;
    fn delete_reply(&self, reply_id: &str, post_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyCall {
    Update { reply_id: String, content: String },
    Delete { reply_id: String, post_id: String },
}

/// Records every call and answers from a scripted outcome.
#[derive(Default)]
pub struct MockReplyService {
    fail_updates: Mutex<bool>,
    calls: Mutex<Vec<ReplyCall>>,
}

impl MockReplyService {
    pub fn failing() -> Self {
        Self {
            fail_updates: Mutex::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_updates.lock() = failing;
    }

    pub fn calls(&self) -> Vec<ReplyCall> {
        self.calls.lock().clone()
    }
}

impl ReplyService for MockReplyService {
    fn update_reply(&self, reply_id: &str, update: &ReplyUpdate) -> Result<()> {
        self.calls.lock().push(ReplyCall::Update {
            reply_id: reply_id.to_string(),
            content: update.content.clone(),
        });
        if *self.fail_updates.lock() {
            bail!("reply {reply_id}: update rejected");
        }
        Ok(())
    }

    fn delete_reply(&self, reply_id: &str, post_id: &str) -> Result<()> {
        self.calls.lock().push(ReplyCall::Delete {
            reply_id: reply_id.to_string(),
            post_id: post_id.to_string(),
        });
        Ok(())
    }
}
