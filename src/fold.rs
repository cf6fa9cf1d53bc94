//! Collapsed/expanded presentation mode.
//!
//! The engine only *requests* transitions. The renderer owns the geometry
//! and reports back through [`FoldStateMachine::confirm`], which is the only
//! way the confirmed state changes.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FoldState {
    #[default]
    Collapsed,
    Expanded,
}

impl FoldState {
    pub fn toggled(self) -> Self {
        match self {
            FoldState::Collapsed => FoldState::Expanded,
            FoldState::Expanded => FoldState::Collapsed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FoldState::Collapsed => "collapsed",
            FoldState::Expanded => "expanded",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldStateMachine {
    state: FoldState,
    requested: Option<FoldState>,
}

impl FoldStateMachine {
    pub fn state(&self) -> FoldState {
        self.state
    }

    pub fn requested(&self) -> Option<FoldState> {
        self.requested
    }

    /// Stage the opposite of the confirmed state.
    pub fn request_toggle(&mut self) -> FoldState {
        let next = self.state.toggled();
        self.requested = Some(next);
        next
    }

    /// Hand out the pending request once.
    pub fn take_requested(&mut self) -> Option<FoldState> {
        self.requested.take()
    }

    /// Returns whether the confirmed state changed.
    pub fn confirm(&mut self, state: FoldState) -> bool {
        self.requested = None;
        let changed = self.state != state;
        self.state = state;
        changed
    }
}
