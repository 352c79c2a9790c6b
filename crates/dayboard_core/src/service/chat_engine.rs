//! Chat threads and the simulated message delivery lifecycle.
//!
//! # Responsibility
//! - Own chat threads, the active selection and the pending input.
//! - Drive `sending -> sent`, typing and reply/regeneration timers.
//! - Derive the bucketed history sidebar and thread transcripts.
//!
//! # Invariants
//! - Exactly one thread is active, or none when there are no threads.
//! - Chat timers are never cancelled; each re-checks its target by id when
//!   it fires and does nothing if the target is gone.
//! - Message appends never touch `ChatThread::updated_at`.
//! - Content text is never logged.

use crate::clock::{SharedClock, Timestamp};
use crate::config::EngineConfig;
use crate::model::chat::{ChatMessage, ChatThread, MessageId, ThreadId};
use crate::port::chat::{LoopbackTransport, MessageTransport, Responder, SimulatedResponder};
use crate::timer::TimerQueue;
use crate::view::filter::thread_matches;
use crate::view::recency::{group_by_recency, BucketGroup};
use chrono::TimeDelta;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejection reasons for a send intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Content is empty after trimming.
    EmptyMessage,
    /// Content is longer than the configured limit.
    TooLong { len: usize, max: usize },
    NoActiveThread,
}

impl Display for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "message cannot be empty"),
            Self::TooLong { len, max } => {
                write!(f, "message has {len} characters; limit is {max}")
            }
            Self::NoActiveThread => write!(f, "no active chat thread"),
        }
    }
}

impl Error for SendError {}

/// Rejection reasons for a regenerate intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerateError {
    ThreadNotFound(ThreadId),
    MessageNotFound(MessageId),
    /// Only assistant messages can be regenerated.
    NotAssistantMessage(MessageId),
}

impl Display for RegenerateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThreadNotFound(id) => write!(f, "chat thread not found: {id}"),
            Self::MessageNotFound(id) => write!(f, "chat message not found: {id}"),
            Self::NotAssistantMessage(id) => {
                write!(f, "message {id} is user-authored and cannot be regenerated")
            }
        }
    }
}

impl Error for RegenerateError {}

/// Pending-input counter shown under the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputStatus {
    pub chars: usize,
    pub max: usize,
}

impl InputStatus {
    pub fn is_over_limit(&self) -> bool {
        self.chars > self.max
    }

    /// `count/limit` label.
    pub fn label(&self) -> String {
        format!("{}/{}", self.chars, self.max)
    }
}

/// Summary row of the history sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary<'a> {
    pub thread: &'a ChatThread,
    pub message_count: usize,
    pub is_active: bool,
}

/// Derived state of the chat panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView<'a> {
    pub active: Option<&'a ChatThread>,
    pub is_typing: bool,
    pub input: InputStatus,
    pub history: Vec<BucketGroup<'a, ChatThread>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatJob {
    MarkSent {
        thread_id: ThreadId,
        message_id: MessageId,
    },
    Reply {
        thread_id: ThreadId,
        prompt: String,
    },
    Regenerate {
        thread_id: ThreadId,
        target: MessageId,
    },
}

pub struct ChatEngine {
    clock: SharedClock,
    sent_delay: TimeDelta,
    reply_delay: TimeDelta,
    max_message_chars: usize,
    threads: Vec<ChatThread>,
    active: Option<ThreadId>,
    input: String,
    typing: HashSet<ThreadId>,
    timers: TimerQueue<ChatJob>,
    transport: Box<dyn MessageTransport>,
    responder: Box<dyn Responder>,
}

impl ChatEngine {
    pub fn new(clock: SharedClock) -> Self {
        Self::with_config(clock, &EngineConfig::default())
    }

    /// Engine with loopback transport and canned replies.
    pub fn with_config(clock: SharedClock, config: &EngineConfig) -> Self {
        Self {
            clock,
            sent_delay: config.sent_delay(),
            reply_delay: config.reply_delay(),
            max_message_chars: config.max_message_chars,
            threads: Vec::new(),
            active: None,
            input: String::new(),
            typing: HashSet::new(),
            timers: TimerQueue::new(),
            transport: Box::new(LoopbackTransport::default()),
            responder: Box::new(SimulatedResponder),
        }
    }

    pub fn set_transport(&mut self, transport: impl MessageTransport + 'static) {
        self.transport = Box::new(transport);
    }

    pub fn set_responder(&mut self, responder: impl Responder + 'static) {
        self.responder = Box::new(responder);
    }

    /// Creates an empty thread and makes it active.
    pub fn create_thread(&mut self, title: impl Into<String>) -> ThreadId {
        let thread = ChatThread::new(title, self.clock.now());
        let id = thread.id;
        self.threads.insert(0, thread);
        self.active = Some(id);
        info!(
            "event=thread_create module=chat status=ok thread_id={id} total={}",
            self.threads.len()
        );
        id
    }

    /// Adds an existing thread (restore or seed) at the end of the list.
    /// The first thread inserted into an empty engine becomes active.
    /// Returns `false` and keeps the list unchanged when the id is taken.
    pub fn insert_thread(&mut self, thread: ChatThread) -> bool {
        let id = thread.id;
        if self.thread(id).is_some() {
            debug!("event=thread_insert module=chat status=ignored thread_id={id}");
            return false;
        }
        self.threads.push(thread);
        if self.active.is_none() {
            self.active = Some(id);
        }
        debug!(
            "event=thread_insert module=chat status=ok thread_id={id} total={}",
            self.threads.len()
        );
        true
    }

    /// Switches the active thread. Returns `false` for an unknown id.
    pub fn select_thread(&mut self, id: ThreadId) -> bool {
        if self.thread(id).is_none() {
            debug!("event=thread_select module=chat status=ignored thread_id={id}");
            return false;
        }
        self.active = Some(id);
        true
    }

    /// Removes a thread. When it was active, the first remaining thread
    /// becomes active.
    pub fn delete_thread(&mut self, id: ThreadId) -> bool {
        let before = self.threads.len();
        self.threads.retain(|thread| thread.id != id);
        if self.threads.len() == before {
            debug!("event=thread_delete module=chat status=ignored thread_id={id}");
            return false;
        }
        self.typing.remove(&id);
        if self.active == Some(id) {
            self.active = self.threads.first().map(|thread| thread.id);
        }
        info!(
            "event=thread_delete module=chat status=ok thread_id={id} total={}",
            self.threads.len()
        );
        true
    }

    pub fn thread(&self, id: ThreadId) -> Option<&ChatThread> {
        self.threads.iter().find(|thread| thread.id == id)
    }

    pub fn threads(&self) -> &[ChatThread] {
        &self.threads
    }

    pub fn active_thread_id(&self) -> Option<ThreadId> {
        self.active
    }

    pub fn active_thread(&self) -> Option<&ChatThread> {
        self.thread(self.active?)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input_status(&self) -> InputStatus {
        InputStatus {
            chars: self.input.chars().count(),
            max: self.max_message_chars,
        }
    }

    /// Sends the pending input to the active thread and clears it.
    ///
    /// # Errors
    /// - See [`ChatEngine::send_message`]; the input is kept on rejection.
    pub fn send(&mut self) -> Result<MessageId, SendError> {
        let text = self.input.clone();
        let id = self.send_message(&text)?;
        self.input.clear();
        Ok(id)
    }

    /// Appends a user message to the active thread and schedules its
    /// delivery and the assistant reply.
    ///
    /// # Errors
    /// - `EmptyMessage` when `text` trims to empty.
    /// - `TooLong` when `text` exceeds the configured character limit.
    /// - `NoActiveThread` when there is no thread to send to.
    pub fn send_message(&mut self, text: &str) -> Result<MessageId, SendError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(SendError::EmptyMessage);
        }
        let len = text.chars().count();
        if len > self.max_message_chars {
            return Err(SendError::TooLong {
                len,
                max: self.max_message_chars,
            });
        }
        let thread_id = self.active.ok_or(SendError::NoActiveThread)?;
        let now = self.clock.now();
        let mut message = ChatMessage::user(content, now);
        let message_id = message.id;

        if let Err(err) = self.transport.send(thread_id, &message) {
            warn!(
                "event=message_transport module=chat status=error thread_id={thread_id} message_id={message_id} error={err}"
            );
            message.mark_failed();
        }

        let Some(thread) = self.thread_mut(thread_id) else {
            return Err(SendError::NoActiveThread);
        };
        thread.messages.push(message);
        let count = thread.message_count();

        self.timers.schedule(
            now + self.sent_delay,
            ChatJob::MarkSent {
                thread_id,
                message_id,
            },
        );
        self.typing.insert(thread_id);
        self.timers.schedule(
            now + self.reply_delay,
            ChatJob::Reply {
                thread_id,
                prompt: content.to_string(),
            },
        );
        info!(
            "event=message_send module=chat status=ok thread_id={thread_id} message_id={message_id} messages={count}"
        );
        Ok(message_id)
    }

    /// Schedules a replacement for an assistant message. When it lands the
    /// old message is removed and the new one is appended at the end.
    ///
    /// # Errors
    /// - `ThreadNotFound` / `MessageNotFound` for unknown ids.
    /// - `NotAssistantMessage` when `message_id` is user-authored.
    pub fn regenerate(
        &mut self,
        thread_id: ThreadId,
        message_id: MessageId,
    ) -> Result<(), RegenerateError> {
        let thread = self
            .thread(thread_id)
            .ok_or(RegenerateError::ThreadNotFound(thread_id))?;
        let message = thread
            .message(message_id)
            .ok_or(RegenerateError::MessageNotFound(message_id))?;
        if message.is_user() {
            return Err(RegenerateError::NotAssistantMessage(message_id));
        }

        let now = self.clock.now();
        self.typing.insert(thread_id);
        self.timers.schedule(
            now + self.reply_delay,
            ChatJob::Regenerate {
                thread_id,
                target: message_id,
            },
        );
        info!(
            "event=message_regenerate module=chat status=scheduled thread_id={thread_id} message_id={message_id}"
        );
        Ok(())
    }

    /// Marks a still-sending user message as failed. Used by external
    /// backends reporting delivery errors.
    pub fn mark_failed(&mut self, thread_id: ThreadId, message_id: MessageId) -> bool {
        let changed = self
            .thread_mut(thread_id)
            .and_then(|thread| thread.message_mut(message_id))
            .is_some_and(ChatMessage::mark_failed);
        if changed {
            info!(
                "event=message_failed module=chat status=ok thread_id={thread_id} message_id={message_id}"
            );
        }
        changed
    }

    /// Typing indicator of the active thread.
    pub fn is_typing(&self) -> bool {
        self.active.is_some_and(|id| self.typing.contains(&id))
    }

    pub fn is_typing_in(&self, thread_id: ThreadId) -> bool {
        self.typing.contains(&thread_id)
    }

    pub fn has_pending_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn next_timer_due(&self) -> Option<Timestamp> {
        self.timers.next_due()
    }

    /// Fires every chat timer due at the clock's current time. Replies are
    /// stamped with their timer's deadline. Returns the number of fired
    /// timers.
    pub fn tick(&mut self) -> usize {
        let due = self.timers.drain_due(self.clock.now());
        let fired = due.len();
        for timer in due {
            self.fire(timer.job, timer.due_at);
        }
        fired
    }

    fn fire(&mut self, job: ChatJob, at: Timestamp) {
        match job {
            ChatJob::MarkSent {
                thread_id,
                message_id,
            } => {
                let changed = self
                    .thread_mut(thread_id)
                    .and_then(|thread| thread.message_mut(message_id))
                    .is_some_and(ChatMessage::mark_sent);
                if changed {
                    debug!(
                        "event=message_sent module=chat status=ok thread_id={thread_id} message_id={message_id}"
                    );
                } else {
                    debug!(
                        "event=message_sent module=chat status=ignored thread_id={thread_id} message_id={message_id}"
                    );
                }
            }
            ChatJob::Reply { thread_id, prompt } => {
                self.typing.remove(&thread_id);
                let Some(index) = self.thread_index(thread_id) else {
                    debug!("event=message_reply module=chat status=ignored thread_id={thread_id}");
                    return;
                };
                let content = self.responder.reply(&self.threads[index], &prompt);
                let reply = ChatMessage::assistant(content, at);
                let reply_id = reply.id;
                self.threads[index].messages.push(reply);
                info!(
                    "event=message_reply module=chat status=ok thread_id={thread_id} message_id={reply_id}"
                );
            }
            ChatJob::Regenerate { thread_id, target } => {
                self.typing.remove(&thread_id);
                let Some(index) = self.thread_index(thread_id) else {
                    debug!(
                        "event=message_regenerate module=chat status=ignored thread_id={thread_id}"
                    );
                    return;
                };
                let Some(previous) = self.threads[index].message(target).cloned() else {
                    debug!(
                        "event=message_regenerate module=chat status=ignored thread_id={thread_id} message_id={target}"
                    );
                    return;
                };
                let content = self.responder.regenerate(&self.threads[index], &previous);
                let thread = &mut self.threads[index];
                thread.remove_message(target);
                let replacement = ChatMessage::assistant(content, at);
                let replacement_id = replacement.id;
                thread.messages.push(replacement);
                info!(
                    "event=message_regenerate module=chat status=ok thread_id={thread_id} replaced={target} message_id={replacement_id}"
                );
            }
        }
    }

    /// Threads whose title matches `search`, in storage order.
    pub fn search_threads(&self, search: &str) -> Vec<&ChatThread> {
        self.threads
            .iter()
            .filter(|thread| thread_matches(thread, search))
            .collect()
    }

    /// History sidebar: matching threads grouped by recency of `updated_at`.
    pub fn grouped_threads(&self, search: &str) -> Vec<BucketGroup<'_, ChatThread>> {
        group_by_recency(self.search_threads(search), self.clock.now(), |thread| {
            thread.updated_at
        })
    }

    pub fn summaries(&self, search: &str) -> Vec<ThreadSummary<'_>> {
        self.search_threads(search)
            .into_iter()
            .map(|thread| ThreadSummary {
                thread,
                message_count: thread.message_count(),
                is_active: self.active == Some(thread.id),
            })
            .collect()
    }

    pub fn view(&self, search: &str) -> ChatView<'_> {
        ChatView {
            active: self.active_thread(),
            is_typing: self.is_typing(),
            input: self.input_status(),
            history: self.grouped_threads(search),
        }
    }

    /// Pretty JSON transcript of one thread, or `None` for an unknown id.
    pub fn export_thread(&self, id: ThreadId) -> Option<Result<String, serde_json::Error>> {
        let thread = self.thread(id)?;
        info!(
            "event=thread_export module=chat status=ok thread_id={id} messages={}",
            thread.message_count()
        );
        Some(serde_json::to_string_pretty(thread))
    }

    fn thread_index(&self, id: ThreadId) -> Option<usize> {
        self.threads.iter().position(|thread| thread.id == id)
    }

    fn thread_mut(&mut self, id: ThreadId) -> Option<&mut ChatThread> {
        self.threads.iter_mut().find(|thread| thread.id == id)
    }
}
