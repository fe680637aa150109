//! Outgoing message queue.
//!
//! Insertion order is arrival order from the chat backend. Every message may
//! be resolved regardless of its position, but only the head is ever removed.

use std::collections::VecDeque;

use uuid::Uuid;

use parley_core::types::Message;

#[derive(Debug, Default)]
pub struct OutgoingQueue {
    messages: VecDeque<Message>,
}

impl OutgoingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        tracing::debug!(
            message_id = %message.id,
            emoji = message.is_emoji(),
            queued = self.messages.len() + 1,
            "Message queued"
        );
        self.messages.push_back(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.push(message);
        }
    }

    pub fn head(&self) -> Option<&Message> {
        self.messages.front()
    }

    /// Remove the head. This is the only way a message leaves the queue.
    pub fn pop_head(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Message> {
        self.messages.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
