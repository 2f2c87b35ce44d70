use snafu::Snafu;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ChatError {
    #[snafu(display("session id '{id}' already exists"))]
    DuplicateId { stage: &'static str, id: String },
    #[snafu(display("session index {index} is out of range for {len} session(s)"))]
    IndexOutOfRange {
        stage: &'static str,
        index: usize,
        len: usize,
    },
    #[snafu(display("no session is active on `{stage}`"))]
    NoActiveSession { stage: &'static str },
    #[snafu(display("chat runtime is no longer running on `{stage}`"))]
    ControllerClosed { stage: &'static str },
}

pub type ChatResult<T> = Result<T, ChatError>;
