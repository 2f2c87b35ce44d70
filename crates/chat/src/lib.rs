#![deny(unsafe_code)]

//! Multi-session chat state machine.
//!
//! A [`ChatController`] owns the [`SessionStore`], applies view commands and
//! emits [`ChatEvent`]s. [`ChatRuntime`] runs a controller on one tokio task and
//! drives the cancellable load timer.

pub mod controller;
pub mod error;
/// Event contract between the controller and the view.
pub mod events;
pub mod load;
pub mod message;
pub mod reply;
pub mod runtime;
pub mod store;

pub use controller::{ChatController, ControllerConfig, DEFAULT_LOAD_DELAY_MS};
pub use error::{ChatError, ChatResult};
pub use events::{ChatEvent, ChatEventSink, LoadScheduler, ManualLoadScheduler};
pub use load::{LoadState, LoadTicket, LoadTransition, LoadTransitionRejection};
pub use message::{ConversationSession, Message, Sender};
pub use reply::{DEFAULT_ECHO_PREFIX, EchoResponder, ReplyGenerator};
pub use runtime::{ChatHandle, ChatRuntime, EventStream};
pub use store::{SessionStore, SessionSummary};
