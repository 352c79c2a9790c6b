//! Chat transport and reply-generation ports.
//!
//! # Responsibility
//! - Let an external backend receive user messages and produce replies.
//! - Provide loopback and canned-reply defaults for the simulated flow.

use crate::model::chat::{ChatMessage, ChatThread, ThreadId};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

const SIMULATED_REPLY: &str = "This is a simulated AI response. In a real implementation, this would be replaced with actual AI-generated content based on the user's message.";
const SIMULATED_REGENERATION: &str = "This is a regenerated AI response with different content to demonstrate the regeneration feature.";

/// Failure reported by a message transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Offline,
    Rejected(String),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => write!(f, "message transport is offline"),
            Self::Rejected(reason) => write!(f, "message rejected by transport: {reason}"),
        }
    }
}

impl Error for TransportError {}

/// Outbound delivery of user messages.
pub trait MessageTransport {
    fn send(&mut self, thread_id: ThreadId, message: &ChatMessage) -> Result<(), TransportError>;
}

/// Accepts every message without leaving the process.
#[derive(Debug, Default, Clone)]
pub struct LoopbackTransport {
    delivered: usize,
}

impl LoopbackTransport {
    /// Shared handle, so callers can read `delivered` while an engine sends
    /// through it.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl MessageTransport for LoopbackTransport {
    fn send(&mut self, _thread_id: ThreadId, _message: &ChatMessage) -> Result<(), TransportError> {
        self.delivered += 1;
        Ok(())
    }
}

impl<T: MessageTransport> MessageTransport for Rc<RefCell<T>> {
    fn send(&mut self, thread_id: ThreadId, message: &ChatMessage) -> Result<(), TransportError> {
        self.borrow_mut().send(thread_id, message)
    }
}

/// Produces assistant message content.
pub trait Responder {
    /// Reply to `prompt`, the latest user message in `thread`.
    fn reply(&mut self, thread: &ChatThread, prompt: &str) -> String;
    /// Replacement content for the assistant message `previous`.
    fn regenerate(&mut self, thread: &ChatThread, previous: &ChatMessage) -> String;
}

/// Fixed replies standing in for an inference backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedResponder;

impl Responder for SimulatedResponder {
    fn reply(&mut self, _thread: &ChatThread, _prompt: &str) -> String {
        SIMULATED_REPLY.to_string()
    }

    fn regenerate(&mut self, _thread: &ChatThread, _previous: &ChatMessage) -> String {
        SIMULATED_REGENERATION.to_string()
    }
}
