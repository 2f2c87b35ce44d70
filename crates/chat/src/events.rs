use std::time::Duration;

use tokio::sync::mpsc;

use crate::load::LoadTicket;
use crate::message::Message;

/// Render events emitted towards the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    SessionCreated { index: usize, id: String },
    /// Clear the list and show a loading indicator.
    LoadStarted { index: usize },
    /// Render the full ordered history of `index`.
    LoadFinished {
        index: usize,
        messages: Vec<Message>,
    },
    MessageAdded { index: usize, message: Message },
}

/// Receives events from the controller.
pub trait ChatEventSink {
    fn emit(&mut self, event: ChatEvent);
}

impl ChatEventSink for Vec<ChatEvent> {
    fn emit(&mut self, event: ChatEvent) {
        self.push(event);
    }
}

impl ChatEventSink for mpsc::UnboundedSender<ChatEvent> {
    fn emit(&mut self, event: ChatEvent) {
        if self.send(event).is_err() {
            tracing::debug!("chat event dropped, view receiver is closed");
        }
    }
}

/// Arms the delayed completion of a session load.
///
/// Arming a ticket replaces whatever was armed before, so at most one timer is
/// live. When the delay elapses the owner must route the ticket back to
/// [`ChatController::finish_load`](crate::ChatController::finish_load) on the
/// controller's own task.
pub trait LoadScheduler {
    fn schedule(&mut self, ticket: LoadTicket, delay: Duration);
}

/// Scheduler that only records what was armed; the caller finishes loads by hand.
#[derive(Debug, Default)]
pub struct ManualLoadScheduler {
    armed: Option<(LoadTicket, Duration)>,
}

impl ManualLoadScheduler {
    pub fn armed(&self) -> Option<(LoadTicket, Duration)> {
        self.armed
    }

    pub fn take(&mut self) -> Option<LoadTicket> {
        self.armed.take().map(|(ticket, _)| ticket)
    }
}

impl LoadScheduler for ManualLoadScheduler {
    fn schedule(&mut self, ticket: LoadTicket, delay: Duration) {
        self.armed = Some((ticket, delay));
    }
}
