use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::controller::{ChatController, ControllerConfig};
use snafu::OptionExt;

use crate::error::{ChatResult, ControllerClosedSnafu};
use crate::events::{ChatEvent, LoadScheduler};
use crate::load::{LoadState, LoadTicket};
use crate::reply::ReplyGenerator;
use crate::store::{SessionStore, SessionSummary};

enum Command {
    CreateSession {
        id: String,
        reply: oneshot::Sender<ChatResult<usize>>,
    },
    SelectSession {
        index: usize,
        reply: oneshot::Sender<ChatResult<()>>,
    },
    SubmitMessage {
        text: String,
        reply: oneshot::Sender<ChatResult<()>>,
    },
    ListSessions {
        reply: oneshot::Sender<Vec<SessionSummary>>,
    },
    QueryLoadState {
        reply: oneshot::Sender<LoadState>,
    },
    Reconfigure {
        config: ControllerConfig,
        generator: Arc<dyn ReplyGenerator>,
        reply: oneshot::Sender<()>,
    },
    LoadElapsed(LoadTicket),
    Shutdown,
}

/// Load timer backed by a spawned tokio sleep.
///
/// The timer task never touches controller state; on expiry it posts the
/// ticket back into the command channel. A weak sender keeps the command loop
/// from being held open by a pending timer.
struct TokioLoadScheduler {
    commands: mpsc::WeakUnboundedSender<Command>,
    pending: Option<JoinHandle<()>>,
}

impl TokioLoadScheduler {
    fn new(commands: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self {
            commands,
            pending: None,
        }
    }
}

impl LoadScheduler for TokioLoadScheduler {
    fn schedule(&mut self, ticket: LoadTicket, delay: Duration) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }

        let commands = self.commands.clone();
        tracing::debug!(?ticket, ?delay, "armed session load timer");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(Command::LoadElapsed(ticket));
            }
        }));
    }
}

impl Drop for TokioLoadScheduler {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

type RuntimeController = ChatController<mpsc::UnboundedSender<ChatEvent>, TokioLoadScheduler>;

/// Receiving half of the controller's render events.
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<ChatEvent>,
}

impl EventStream {
    /// Waits for the next event; `None` once the runtime has stopped.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChatEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Cloneable command side used by the view.
#[derive(Clone)]
pub struct ChatHandle {
    commands: mpsc::UnboundedSender<Command>,
}

pub struct ChatRuntime;

impl ChatRuntime {
    /// Moves the store into a controller task on the current tokio runtime.
    ///
    /// All state mutation happens on that one task, in command order.
    pub fn spawn(
        store: SessionStore,
        config: ControllerConfig,
        reply: Arc<dyn ReplyGenerator>,
    ) -> (ChatHandle, EventStream) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let scheduler = TokioLoadScheduler::new(command_tx.downgrade());
        let controller = ChatController::new(store, config, reply, event_tx, scheduler);
        tokio::spawn(run_controller(controller, command_rx));

        (
            ChatHandle {
                commands: command_tx,
            },
            EventStream { receiver: event_rx },
        )
    }
}

async fn run_controller(
    mut controller: RuntimeController,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    tracing::debug!(
        sessions = controller.store().len(),
        "chat runtime started"
    );

    while let Some(command) = commands.recv().await {
        match command {
            Command::CreateSession { id, reply } => {
                let _ = reply.send(controller.create_session(id));
            }
            Command::SelectSession { index, reply } => {
                let _ = reply.send(controller.select_session(index).map(|_| ()));
            }
            Command::SubmitMessage { text, reply } => {
                let _ = reply.send(controller.submit_message(&text));
            }
            Command::ListSessions { reply } => {
                let _ = reply.send(controller.summaries());
            }
            Command::QueryLoadState { reply } => {
                let _ = reply.send(controller.load_state());
            }
            Command::Reconfigure {
                config,
                generator,
                reply,
            } => {
                controller.reconfigure(config, generator);
                let _ = reply.send(());
            }
            Command::LoadElapsed(ticket) => {
                if !controller.finish_load(ticket) {
                    tracing::debug!(?ticket, "dropped stale session load");
                }
            }
            Command::Shutdown => break,
        }
    }

    tracing::debug!("chat runtime stopped");
}

impl ChatHandle {
    pub async fn create_session(&self, id: impl Into<String>) -> ChatResult<usize> {
        let id = id.into();
        self.request("handle-create-session", |reply| Command::CreateSession {
            id,
            reply,
        })
        .await?
    }

    pub async fn select_session(&self, index: usize) -> ChatResult<()> {
        self.request("handle-select-session", |reply| Command::SelectSession {
            index,
            reply,
        })
        .await?
    }

    pub async fn submit_message(&self, text: impl Into<String>) -> ChatResult<()> {
        let text = text.into();
        self.request("handle-submit-message", |reply| Command::SubmitMessage {
            text,
            reply,
        })
        .await?
    }

    pub async fn sessions(&self) -> ChatResult<Vec<SessionSummary>> {
        self.request("handle-list-sessions", |reply| Command::ListSessions {
            reply,
        })
        .await
    }

    pub async fn load_state(&self) -> ChatResult<LoadState> {
        self.request("handle-load-state", |reply| Command::QueryLoadState { reply })
            .await
    }

    /// Applies a new load delay and reply generator to later commands.
    pub async fn reconfigure(
        &self,
        config: ControllerConfig,
        generator: Arc<dyn ReplyGenerator>,
    ) -> ChatResult<()> {
        self.request("handle-reconfigure", |reply| Command::Reconfigure {
            config,
            generator,
            reply,
        })
        .await
    }

    /// Stops the controller task. Pending loads are dropped.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    async fn request<R>(
        &self,
        stage: &'static str,
        build: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> ChatResult<R> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .ok()
            .context(ControllerClosedSnafu { stage })?;
        reply_rx.await.ok().context(ControllerClosedSnafu { stage })
    }
}
