//! Lineage-case flags carried by every tree node.
//!
//! [`TreeCase`] is a fixed-width flag set. The raw bits travel through the
//! linkage files unchanged, so unknown bits are retained rather than
//! truncated. Code outside this module never does bit arithmetic on a
//! case: it uses the named predicates and mutators below, which keep the
//! two documented groupings intact:
//!
//! - **Terminal states** (`UNPROCESSED`, `INVALID`,
//!   `MATCHED_TO_BRIDGE_UNPROCESSED`, `BRIDGE_FINALIZE`) are mutually
//!   exclusive and must all be clear before fragmentation classification.
//! - **Fragment outcomes** (`FRAGMENTED_STRAYED`, `FRAGMENTED_RETURNED`,
//!   `FRAGMENTED_EXCHANGED`) combine with `FRAGMENTED_NEW`, at most one at
//!   a time.

use bitflags::bitflags;

bitflags! {
    /// Lineage-case bitmask of a halo.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct TreeCase: u32 {
        /// The halo has no progenitors.
        const NO_PROGENITORS                = 1 << 0;
        /// The halo is the main progenitor of its descendant.
        const MAIN_PROGENITOR               = 1 << 1;
        /// The halo merges into a descendant it is not the main progenitor of.
        const MERGER                        = 1 << 2;
        /// The halo has no descendant match at all.
        const STRAYED                       = 1 << 4;
        /// The halo has no progenitor and awaits back-match validation.
        const EMERGED_CANDIDATE             = 1 << 7;
        /// Fragment outcome: the fragment could not be matched.
        const FRAGMENTED_STRAYED            = 1 << 8;
        /// Fragment outcome: the fragment rejoined its own prior lineage.
        const FRAGMENTED_RETURNED           = 1 << 9;
        /// Fragment outcome: the fragment joined a different lineage.
        const FRAGMENTED_EXCHANGED          = 1 << 10;
        /// The halo's descendant is a bridge; its forematch is the true match.
        const MATCHED_TO_BRIDGE             = 1 << 11;
        /// The halo emerged from a validated back-match.
        const EMERGED                       = 1 << 17;
        /// The halo appeared by fragmenting off a bridge.
        const FRAGMENTED_NEW                = 1 << 18;
        /// Terminal state: bridge match found but never processed.
        const MATCHED_TO_BRIDGE_UNPROCESSED = 1 << 19;
        /// Terminal state: bridge awaiting finalization.
        const BRIDGE_FINALIZE               = 1 << 20;
        /// Terminal state: never processed by the matcher.
        const UNPROCESSED                   = 1 << 21;
        /// Terminal state: marked invalid by the matcher.
        const INVALID                       = 1 << 22;
    }
}

impl TreeCase {
    /// The mutually exclusive terminal-state group.
    pub const TERMINAL_STATES: TreeCase = TreeCase::UNPROCESSED
        .union(TreeCase::INVALID)
        .union(TreeCase::MATCHED_TO_BRIDGE_UNPROCESSED)
        .union(TreeCase::BRIDGE_FINALIZE);

    /// The fragment outcome group; at most one is ever set.
    pub const FRAGMENT_OUTCOMES: TreeCase = TreeCase::FRAGMENTED_STRAYED
        .union(TreeCase::FRAGMENTED_RETURNED)
        .union(TreeCase::FRAGMENTED_EXCHANGED);

    /// Build a case from raw file bits, keeping bits this build does not name.
    pub fn from_raw(bits: i32) -> Self {
        Self::from_bits_retain(bits as u32)
    }

    /// Raw bits as stored in the linkage files.
    pub fn raw(self) -> i32 {
        self.bits() as i32
    }

    /// Terminal-state bits that are still set, if any.
    pub fn unresolved_state(self) -> Option<TreeCase> {
        let set = self.intersection(Self::TERMINAL_STATES);
        (!set.is_empty()).then_some(set)
    }

    /// Whether the halo appeared by fragmenting off a bridge.
    pub fn is_fragmented_new(self) -> bool {
        self.contains(Self::FRAGMENTED_NEW)
    }

    /// Whether the halo is independently flagged as strayed.
    pub fn is_strayed(self) -> bool {
        self.contains(Self::STRAYED)
    }

    /// Whether the halo matched onto a bridge.
    pub fn is_matched_to_bridge(self) -> bool {
        self.contains(Self::MATCHED_TO_BRIDGE)
    }

    /// Whether the halo is an emerged halo or still a candidate for one.
    ///
    /// A candidate loses `EMERGED_CANDIDATE` once it is confirmed, so
    /// both bits have to be checked.
    pub fn is_emerged_or_candidate(self) -> bool {
        self.intersects(Self::EMERGED_CANDIDATE.union(Self::EMERGED))
    }

    /// The classified fragment outcome, if exactly one is set.
    pub fn fragment_outcome(self) -> Option<FragmentOutcome> {
        let set = self.intersection(Self::FRAGMENT_OUTCOMES);
        FragmentOutcome::ALL.into_iter().find(|o| set == o.flag())
    }

    /// Replace any fragment outcome with `outcome`.
    pub fn set_fragment_outcome(&mut self, outcome: FragmentOutcome) {
        self.remove(Self::FRAGMENT_OUTCOMES);
        self.insert(outcome.flag());
    }

    /// Promote an emerged candidate to a confirmed emerged halo.
    pub fn confirm_emerged(&mut self) {
        self.remove(Self::EMERGED_CANDIDATE);
        self.insert(Self::EMERGED);
    }

    /// Mark the halo as the main progenitor of its descendant.
    pub fn mark_main_progenitor(&mut self) {
        self.remove(Self::MERGER);
        self.insert(Self::MAIN_PROGENITOR);
    }

    /// Mark the halo as a non-main progenitor of its descendant.
    pub fn mark_merger(&mut self) {
        self.remove(Self::MAIN_PROGENITOR);
        self.insert(Self::MERGER);
    }

    /// Mark the halo as having no progenitors.
    pub fn mark_no_progenitors(&mut self) {
        self.insert(Self::NO_PROGENITORS);
    }
}

/// Result of fragmentation classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FragmentOutcome {
    /// The fragment could not be matched at all.
    Strayed,
    /// The fragment rejoined its own prior lineage.
    Returned,
    /// The fragment joined a different lineage than its own history.
    Exchanged,
}

impl FragmentOutcome {
    /// All outcomes, in tie-break order.
    pub const ALL: [FragmentOutcome; 3] = [
        FragmentOutcome::Strayed,
        FragmentOutcome::Returned,
        FragmentOutcome::Exchanged,
    ];

    /// The flag bit recording this outcome.
    pub fn flag(self) -> TreeCase {
        match self {
            FragmentOutcome::Strayed => TreeCase::FRAGMENTED_STRAYED,
            FragmentOutcome::Returned => TreeCase::FRAGMENTED_RETURNED,
            FragmentOutcome::Exchanged => TreeCase::FRAGMENTED_EXCHANGED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn raw_round_trip_keeps_unknown_bits() {
        let raw = (1 << 30) | TreeCase::STRAYED.bits() as i32;
        let case = TreeCase::from_raw(raw);
        assert!(case.is_strayed());
        assert_eq!(case.raw(), raw);
    }

    #[test]
    fn unresolved_state_reports_terminal_bits_only() {
        let case = TreeCase::INVALID | TreeCase::STRAYED;
        assert_eq!(case.unresolved_state(), Some(TreeCase::INVALID));
        assert_eq!(TreeCase::STRAYED.unresolved_state(), None);
    }

    #[test]
    fn emerged_checks_both_bits() {
        assert!(TreeCase::EMERGED_CANDIDATE.is_emerged_or_candidate());
        assert!(TreeCase::EMERGED.is_emerged_or_candidate());
        assert!(!TreeCase::FRAGMENTED_NEW.is_emerged_or_candidate());
    }

    #[test]
    fn confirm_emerged_swaps_candidate_bit() {
        let mut case = TreeCase::EMERGED_CANDIDATE;
        case.confirm_emerged();
        assert_eq!(case, TreeCase::EMERGED);
        assert!(case.is_emerged_or_candidate());
    }

    #[test]
    fn progenitor_marks_are_exclusive() {
        let mut case = TreeCase::empty();
        case.mark_merger();
        case.mark_main_progenitor();
        assert!(case.contains(TreeCase::MAIN_PROGENITOR));
        assert!(!case.contains(TreeCase::MERGER));
    }

    #[test]
    fn ambiguous_outcome_is_none() {
        let case = TreeCase::FRAGMENTED_RETURNED | TreeCase::FRAGMENTED_EXCHANGED;
        assert_eq!(case.fragment_outcome(), None);
    }

    fn arb_case() -> impl Strategy<Value = TreeCase> {
        any::<u32>().prop_map(TreeCase::from_bits_retain)
    }

    fn arb_outcome() -> impl Strategy<Value = FragmentOutcome> {
        prop::sample::select(FragmentOutcome::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn set_outcome_leaves_exactly_one(start in arb_case(), outcome in arb_outcome()) {
            let mut case = start;
            let others = case.difference(TreeCase::FRAGMENT_OUTCOMES);
            case.set_fragment_outcome(outcome);
            prop_assert_eq!(case.fragment_outcome(), Some(outcome));
            prop_assert_eq!(case.difference(TreeCase::FRAGMENT_OUTCOMES), others);
        }

        #[test]
        fn raw_is_lossless(bits in any::<i32>()) {
            prop_assert_eq!(TreeCase::from_raw(bits).raw(), bits);
        }
    }
}
