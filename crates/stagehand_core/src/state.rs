//! Lifecycle of a single conversion request.

use std::fmt;

/// Where a conversion currently is.
///
/// `Idle → ProbingEntry → Resolving → Parsed → Exporting → Packaged`, with
/// `Failed` reachable from every non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionState {
    Idle,
    ProbingEntry,
    Resolving,
    Parsed,
    Exporting,
    Packaged,
    Failed,
}

impl ConversionState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Packaged | Self::Failed)
    }

    /// Move to `next`, logging the transition.
    pub fn advance(&mut self, next: ConversionState, detail: &str) {
        debug_assert!(!self.is_terminal(), "transition out of terminal state {self}");
        log::debug!("{} -> {} ({})", self, next, detail);
        *self = next;
    }
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::ProbingEntry => "ProbingEntry",
            Self::Resolving => "Resolving",
            Self::Parsed => "Parsed",
            Self::Exporting => "Exporting",
            Self::Packaged => "Packaged",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}
