/// Entry state definitions for tracking pipeline progress
///
/// Every entry starts at `Discovered` and moves forward one stage at a time
/// until it reaches `Indexed`, `SkippedNoZip` or `Failed`.
use std::fmt;

/// Represents the current state of an entry in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    // ===== Active States =====
    /// Found on the listing page
    Discovered,

    /// Author name and archive link resolved from the detail page
    DetailResolved,

    /// Archive downloaded and its text decoded
    Extracted,

    // ===== Terminal States =====
    /// Stored and searchable
    Indexed,

    /// Detail page carried no archive link
    SkippedNoZip,

    /// Any other stage error
    Failed,
}

impl EntryState {
    /// Returns true if no further processing happens from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Indexed | Self::SkippedNoZip | Self::Failed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Indexed)
    }

    /// Returns true if the transition `self -> next` is allowed
    ///
    /// Stages advance one at a time; any active state may end in `Failed`,
    /// and only `DetailResolved` may end in `SkippedNoZip`.
    pub fn can_transition_to(&self, next: EntryState) -> bool {
        match (self, next) {
            (Self::Discovered, Self::DetailResolved) => true,
            (Self::DetailResolved, Self::Extracted) => true,
            (Self::DetailResolved, Self::SkippedNoZip) => true,
            (Self::Extracted, Self::Indexed) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::DetailResolved => "detail_resolved",
            Self::Extracted => "extracted",
            Self::Indexed => "indexed",
            Self::SkippedNoZip => "skipped_no_zip",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "discovered" => Some(Self::Discovered),
            "detail_resolved" => Some(Self::DetailResolved),
            "extracted" => Some(Self::Extracted),
            "indexed" => Some(Self::Indexed),
            "skipped_no_zip" => Some(Self::SkippedNoZip),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EntryState; 6] = [
        EntryState::Discovered,
        EntryState::DetailResolved,
        EntryState::Extracted,
        EntryState::Indexed,
        EntryState::SkippedNoZip,
        EntryState::Failed,
    ];

    #[test]
    fn test_db_string_roundtrip() {
        for state in ALL {
            assert_eq!(EntryState::from_db_string(state.to_db_string()), Some(state));
        }
        assert_eq!(EntryState::from_db_string("bogus"), None);
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(EntryState::Discovered.can_transition_to(EntryState::DetailResolved));
        assert!(EntryState::DetailResolved.can_transition_to(EntryState::Extracted));
        assert!(EntryState::Extracted.can_transition_to(EntryState::Indexed));
    }

    #[test]
    fn test_skip_only_after_detail() {
        assert!(EntryState::DetailResolved.can_transition_to(EntryState::SkippedNoZip));
        assert!(!EntryState::Discovered.can_transition_to(EntryState::SkippedNoZip));
        assert!(!EntryState::Extracted.can_transition_to(EntryState::SkippedNoZip));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_no_skipping_stages() {
        assert!(!EntryState::Discovered.can_transition_to(EntryState::Extracted));
        assert!(!EntryState::Discovered.can_transition_to(EntryState::Indexed));
        assert!(!EntryState::DetailResolved.can_transition_to(EntryState::Indexed));
    }

    #[test]
    fn test_only_indexed_is_success() {
        let successes: Vec<_> = ALL.iter().filter(|s| s.is_success()).collect();
        assert_eq!(successes, vec![&EntryState::Indexed]);
    }
}
