use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::data::{ReplyService, ReplyUpdate};
use crate::post::Reply;

/// Replies shown before the thread is expanded.
pub const PREVIEW_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPhase {
    Idle,
    Editing,
    Saving,
}

/// The single reply edit in progress. Inline and expanded editors both
/// read and write this one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    reply_id: String,
    buffer: String,
    expanded: bool,
    in_flight: Option<u64>,
}

impl EditSession {
    pub fn reply_id(&self) -> &str {
        &self.reply_id
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether a save control should be enabled.
    pub fn can_save(&self) -> bool {
        !self.is_saving() && !self.buffer.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SaveRejected {
    #[error("no reply is being edited")]
    NoSession,
    #[error("reply text is empty")]
    EmptyBuffer,
    #[error("a save is already in progress")]
    AlreadySaving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed,
}

/// A save that has been accepted and must be answered with
/// [`ThreadPaginator::finish_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub request_id: u64,
    pub reply_id: String,
    pub update: ReplyUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Escape,
    Enter { shift: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Cancel,
    Save,
    Newline,
}

pub fn command_for_key(key: EditorKey) -> EditorCommand {
    match key {
        EditorKey::Escape => EditorCommand::Cancel,
        EditorKey::Enter { shift: false } => EditorCommand::Save,
        EditorKey::Enter { shift: true } => EditorCommand::Newline,
    }
}

/// Edit and delete controls belong to the reply's author only.
pub fn can_modify(reply: &Reply, viewer_id: Option<&str>) -> bool {
    match (reply.author_id(), viewer_id) {
        (Some(author), Some(viewer)) => author == viewer,
        _ => false,
    }
}

struct SaveResponse {
    request_id: u64,
    outcome: SaveOutcome,
}

/// Reply preview and edit state for one post's thread.
pub struct ThreadPaginator {
    post_id: String,
    preview_limit: usize,
    session: Option<EditSession>,
    next_request_id: u64,
    response_tx: Sender<SaveResponse>,
    response_rx: Receiver<SaveResponse>,
}

impl ThreadPaginator {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self::with_preview_limit(post_id, PREVIEW_LIMIT)
    }

    pub fn with_preview_limit(post_id: impl Into<String>, preview_limit: usize) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            post_id: post_id.into(),
            preview_limit: if preview_limit == 0 {
                PREVIEW_LIMIT
            } else {
                preview_limit
            },
            session: None,
            next_request_id: 1,
            response_tx,
            response_rx,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn visible_replies<'r>(&self, replies: &'r [Reply], show_all: bool) -> &'r [Reply] {
        if show_all {
            replies
        } else {
            &replies[..replies.len().min(self.preview_limit)]
        }
    }

    pub fn has_more(&self, replies: &[Reply]) -> bool {
        replies.len() > self.preview_limit
    }

    /// Label for the show more / show less control, absent when every
    /// reply already fits in the preview.
    pub fn toggle_label(&self, replies: &[Reply], show_all: bool) -> Option<String> {
        if !self.has_more(replies) {
            return None;
        }
        if show_all {
            return Some("Show less".to_string());
        }
        let hidden = replies.len() - self.preview_limit;
        let noun = if hidden == 1 { "reply" } else { "replies" };
        Some(format!("Show {hidden} more {noun}"))
    }

    pub fn empty_label(replies: &[Reply]) -> Option<&'static str> {
        replies.is_empty().then_some("No replies yet")
    }

    pub fn phase(&self) -> ThreadPhase {
        match &self.session {
            None => ThreadPhase::Idle,
            Some(session) if session.is_saving() => ThreadPhase::Saving,
            Some(_) => ThreadPhase::Editing,
        }
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn is_editing(&self, reply_id: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.reply_id == reply_id)
    }

    /// Opens a session on `reply`, replacing any idle one. Ignored while a
    /// save is in flight.
    pub fn start_edit(&mut self, reply: &Reply) -> bool {
        if self.phase() == ThreadPhase::Saving {
            debug!(reply = %reply.id, "edit ignored while saving");
            return false;
        }
        debug!(post = %self.post_id, reply = %reply.id, "edit started");
        self.session = Some(EditSession {
            reply_id: reply.id.clone(),
            buffer: reply.content.clone(),
            expanded: false,
            in_flight: None,
        });
        true
    }

    /// Buffer shared by the inline and expanded editors. Locked while saving.
    pub fn buffer_mut(&mut self) -> Option<&mut String> {
        self.session
            .as_mut()
            .filter(|session| !session.is_saving())
            .map(|session| &mut session.buffer)
    }

    pub fn set_buffer(&mut self, text: impl Into<String>) -> bool {
        match self.buffer_mut() {
            Some(buffer) => {
                *buffer = text.into();
                true
            }
            None => false,
        }
    }

    /// Moves the current session into the expanded editor.
    pub fn expand(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.expanded = true;
                true
            }
            None => false,
        }
    }

    /// Ends the session. A save still in flight keeps running but its
    /// outcome is discarded.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(reply = %session.reply_id, "edit cancelled");
        }
    }

    /// Validates the session and marks it saving.
    pub fn begin_save(&mut self) -> Result<SaveRequest, SaveRejected> {
        let session = self.session.as_mut().ok_or(SaveRejected::NoSession)?;
        if session.is_saving() {
            return Err(SaveRejected::AlreadySaving);
        }
        let content = session.buffer.trim();
        if content.is_empty() {
            return Err(SaveRejected::EmptyBuffer);
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        session.in_flight = Some(request_id);
        Ok(SaveRequest {
            request_id,
            reply_id: session.reply_id.clone(),
            update: ReplyUpdate {
                content: content.to_string(),
            },
        })
    }

    /// Applies a save outcome. Outcomes for a session that has since been
    /// cancelled or replaced are dropped and `false` is returned.
    pub fn finish_save(&mut self, request_id: u64, outcome: SaveOutcome) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.in_flight != Some(request_id) {
            return false;
        }
        match outcome {
            SaveOutcome::Saved => {
                info!(post = %self.post_id, reply = %session.reply_id, "reply saved");
                self.session = None;
            }
            SaveOutcome::Failed => {
                session.in_flight = None;
            }
        }
        true
    }

    /// Dispatches the session's buffer to `service` on a worker thread.
    /// The outcome is applied by [`poll`](Self::poll).
    pub fn save(&mut self, service: Arc<dyn ReplyService>) -> Result<u64, SaveRejected> {
        let request = self.begin_save()?;
        let request_id = request.request_id;
        debug!(reply = %request.reply_id, request_id, "dispatching reply update");

        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let outcome = match service.update_reply(&request.reply_id, &request.update) {
                Ok(()) => SaveOutcome::Saved,
                Err(err) => {
                    warn!(reply = %request.reply_id, "reply update failed: {err:#}");
                    SaveOutcome::Failed
                }
            };
            let _ = tx.send(SaveResponse {
                request_id: request.request_id,
                outcome,
            });
        });
        Ok(request_id)
    }

    /// Applies every save outcome that has arrived. Returns whether state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(response) = self.response_rx.try_recv() {
            changed |= self.finish_save(response.request_id, response.outcome);
        }
        changed
    }

    /// Waits up to `timeout` for the next save outcome and applies it.
    pub fn poll_timeout(&mut self, timeout: Duration) -> bool {
        match self.response_rx.recv_timeout(timeout) {
            Ok(response) => {
                let changed = self.finish_save(response.request_id, response.outcome);
                changed | self.poll()
            }
            Err(_) => false,
        }
    }

    /// Deletes `reply_id` from this thread through `service`. An idle
    /// session on the deleted reply is closed.
    pub fn delete_reply(&mut self, service: &dyn ReplyService, reply_id: &str) -> Result<()> {
        service.delete_reply(reply_id, &self.post_id)?;
        if self.is_editing(reply_id) && self.phase() == ThreadPhase::Editing {
            self.session = None;
        }
        info!(post = %self.post_id, reply = reply_id, "reply deleted");
        Ok(())
    }
}
