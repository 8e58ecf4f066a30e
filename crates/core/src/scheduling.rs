//! Job scheduling constants and state machine.
//!
//! This module lives in `core` (zero internal deps) so it can be used by both
//! the store layer and the execution engine without either depending on the
//! other's types.

// ---------------------------------------------------------------------------
// Priority constants
// ---------------------------------------------------------------------------

/// Priority value for low-urgency jobs. Claimed last.
pub const PRIORITY_LOW: i16 = 1;

/// Priority value for normal jobs. Default.
pub const PRIORITY_NORMAL: i16 = 2;

/// Priority value for high-urgency jobs. Claimed before all others.
pub const PRIORITY_HIGH: i16 = 3;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Job status IDs matching the `job_statuses` seed data (1-based SMALLSERIAL).
///
/// The state machine is intentionally duplicated from the `store` crate's
/// `JobStatus` enum because `core` must have zero internal deps.
pub mod state_machine {
    /// Returns the set of valid target status IDs reachable from `from_status`.
    ///
    /// Terminal states (Completed=3, Dead=4) return an empty slice because no
    /// further transitions are allowed. A failure is recorded on the record
    /// while it is still Processing; the attempt-count decision then routes it
    /// back to Pending (retry, or visibility-timeout reclaim) or to Dead.
    pub fn valid_transitions(from_status: i16) -> &'static [i16] {
        match from_status {
            // Pending -> Processing (claim)
            1 => &[2],
            // Processing -> Completed, Dead, Pending (retry / reclaim)
            2 => &[3, 4, 1],
            // Terminal states: Completed, Dead
            3 | 4 => &[],
            // Unknown status: no transitions allowed
            _ => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: i16, to: i16) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: i16, to: i16) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            let from_name = status_name(from);
            let to_name = status_name(to);
            Err(format!(
                "Invalid transition: {from_name} ({from}) -> {to_name} ({to})"
            ))
        }
    }

    /// True when `status` is a resting point from which no transition exists.
    pub fn is_terminal(status: i16) -> bool {
        matches!(status, 3 | 4) // Completed, Dead
    }

    /// Human-readable name for a status ID (for error messages).
    pub fn status_name(id: i16) -> &'static str {
        match id {
            1 => "Pending",
            2 => "Processing",
            3 => "Completed",
            4 => "Dead",
            _ => "Unknown",
        }
    }
}
