use std::sync::Arc;
use std::time::Duration;

use snafu::OptionExt;

use crate::error::{ChatResult, NoActiveSessionSnafu};
use crate::events::{ChatEvent, ChatEventSink, LoadScheduler};
use crate::load::{LoadState, LoadTicket, LoadTransition};
use crate::message::Message;
use crate::reply::{EchoResponder, ReplyGenerator};
use crate::store::{SessionStore, SessionSummary};

pub const DEFAULT_LOAD_DELAY_MS: u64 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Simulated latency before a selected session's history is shown.
    pub load_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            load_delay: Duration::from_millis(DEFAULT_LOAD_DELAY_MS),
        }
    }
}

impl ControllerConfig {
    pub fn with_load_delay(mut self, load_delay: Duration) -> Self {
        self.load_delay = load_delay;
        self
    }
}

/// Owns the session store and drives the view through emitted events.
///
/// Every mutation of the store goes through here. Operations either succeed
/// fully or return an error with state and emissions untouched.
pub struct ChatController<S, T> {
    store: SessionStore,
    reply: Arc<dyn ReplyGenerator>,
    config: ControllerConfig,
    load_state: LoadState,
    next_load_generation: u64,
    sink: S,
    scheduler: T,
}

impl<S, T> ChatController<S, T>
where
    S: ChatEventSink,
    T: LoadScheduler,
{
    pub fn new(
        store: SessionStore,
        config: ControllerConfig,
        reply: Arc<dyn ReplyGenerator>,
        sink: S,
        scheduler: T,
    ) -> Self {
        Self {
            store,
            reply,
            config,
            load_state: LoadState::Idle,
            next_load_generation: 1,
            sink,
            scheduler,
        }
    }

    /// Controller with the echo responder and default delay.
    pub fn with_defaults(store: SessionStore, sink: S, scheduler: T) -> Self {
        Self::new(
            store,
            ControllerConfig::default(),
            Arc::new(EchoResponder::new()),
            sink,
            scheduler,
        )
    }

    pub fn create_session(&mut self, id: impl Into<String>) -> ChatResult<usize> {
        let id = id.into();
        let index = self.store.create_session(id.clone())?;
        tracing::info!(index, id = %id, "created session");
        self.sink.emit(ChatEvent::SessionCreated { index, id });
        Ok(index)
    }

    /// Selects `index` and starts its simulated load.
    ///
    /// Any load still pending for an earlier selection is superseded and will
    /// never emit.
    pub fn select_session(&mut self, index: usize) -> ChatResult<LoadTicket> {
        self.store.select_session(index)?;

        let ticket = LoadTicket::new(index, self.alloc_load_generation());
        if let Some(previous) = self.load_state.pending() {
            tracing::debug!(?previous, ?ticket, "superseding pending session load");
        }
        self.apply_load_transition(LoadTransition::Start(ticket));

        tracing::info!(index, "selected session");
        self.sink.emit(ChatEvent::LoadStarted { index });
        self.scheduler.schedule(ticket, self.config.load_delay);
        Ok(ticket)
    }

    /// Completes the load identified by `ticket`.
    ///
    /// Returns `false` without emitting when the ticket is stale or nothing is
    /// loading.
    pub fn finish_load(&mut self, ticket: LoadTicket) -> bool {
        let Some(LoadState::Loaded(index)) =
            self.apply_load_transition(LoadTransition::Finish(ticket))
        else {
            return false;
        };

        let messages = self
            .store
            .session(index)
            .map(|session| session.messages().to_vec())
            .unwrap_or_default();
        self.sink.emit(ChatEvent::LoadFinished { index, messages });
        true
    }

    /// Appends the trimmed user text and its generated reply to the active session.
    ///
    /// Blank input is ignored.
    pub fn submit_message(&mut self, text: &str) -> ChatResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let index = self.store.active_index().context(NoActiveSessionSnafu {
            stage: "controller-submit-message",
        })?;

        let user_message = Message::user(text);
        self.store.append_message(index, user_message.clone())?;
        self.sink.emit(ChatEvent::MessageAdded {
            index,
            message: user_message,
        });

        let reply_message = Message::ai(self.reply.reply(text));
        self.store.append_message(index, reply_message.clone())?;
        self.sink.emit(ChatEvent::MessageAdded {
            index,
            message: reply_message,
        });
        Ok(())
    }

    /// Swaps the load delay and reply generator for later operations.
    ///
    /// A load that is already armed keeps the delay it was armed with.
    pub fn reconfigure(&mut self, config: ControllerConfig, reply: Arc<dyn ReplyGenerator>) {
        tracing::info!(load_delay = ?config.load_delay, "reconfigured controller");
        self.config = config;
        self.reply = reply;
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.store.summaries()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn scheduler_mut(&mut self) -> &mut T {
        &mut self.scheduler
    }

    fn apply_load_transition(&mut self, transition: LoadTransition) -> Option<LoadState> {
        match self.load_state.apply(transition) {
            Ok(next_state) => {
                self.load_state = next_state;
                Some(next_state)
            }
            Err(rejection) => {
                tracing::debug!(?rejection, "ignored session load transition");
                None
            }
        }
    }

    fn alloc_load_generation(&mut self) -> u64 {
        let generation = self.next_load_generation;
        self.next_load_generation = self.next_load_generation.saturating_add(1);
        generation
    }
}
