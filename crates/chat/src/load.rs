/// Identifies one simulated session load.
///
/// `generation` increases on every selection so a timer that fires after a newer
/// selection can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub index: usize,
    pub generation: u64,
}

impl LoadTicket {
    pub const fn new(index: usize, generation: u64) -> Self {
        Self { index, generation }
    }
}

/// View binding state for the selected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading(LoadTicket),
    Loaded(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTransition {
    Start(LoadTicket),
    Finish(LoadTicket),
}

/// Why a load transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTransitionRejection {
    NoPendingLoad {
        attempted: LoadTicket,
    },
    Superseded {
        active: LoadTicket,
        attempted: LoadTicket,
    },
}

pub type LoadTransitionResult = Result<LoadState, LoadTransitionRejection>;

impl LoadState {
    /// Returns the pending ticket if and only if state is `Loading`.
    pub fn pending(&self) -> Option<LoadTicket> {
        match self {
            Self::Loading(ticket) => Some(*ticket),
            Self::Idle | Self::Loaded(_) => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    /// Applies one transition.
    ///
    /// `Start` is accepted from every state and replaces any pending ticket.
    /// `Finish` must match the pending ticket exactly.
    pub fn apply(&self, transition: LoadTransition) -> LoadTransitionResult {
        match transition {
            LoadTransition::Start(ticket) => Ok(Self::Loading(ticket)),
            LoadTransition::Finish(ticket) => self.apply_finish(ticket),
        }
    }

    fn apply_finish(&self, ticket: LoadTicket) -> LoadTransitionResult {
        match self {
            Self::Loading(active) if *active == ticket => Ok(Self::Loaded(ticket.index)),
            Self::Loading(active) => Err(LoadTransitionRejection::Superseded {
                active: *active,
                attempted: ticket,
            }),
            Self::Idle | Self::Loaded(_) => {
                Err(LoadTransitionRejection::NoPendingLoad { attempted: ticket })
            }
        }
    }
}
