//! Field-set state machine
//!
//! Reconstructs "what is currently happening on the field set" from the
//! ordered notice stream. The server does not say whether an empty
//! assignment means "nothing queued" or "a timeout is about to run", so
//! classification is deferred: an empty match payload with a field id
//! present becomes an unplayed timeout slot, and with no field id the slot
//! clears entirely. Treat that rule as the protocol contract.

use crate::types::{
    FieldsetMatch, FieldsetNotice, FieldsetState, MatchState,
};

/// Apply one notice to a state, producing the next state.
///
/// Pure and total: every (state, notice) combination is defined and
/// nothing here can fail.
pub fn reduce(state: &FieldsetState, notice: &FieldsetNotice) -> FieldsetState {
    match notice {
        FieldsetNotice::AudienceDisplayChanged { display } => FieldsetState {
            current_match: state.current_match.clone(),
            audience_display: *display,
        },

        FieldsetNotice::FieldMatchAssigned {
            field_id,
            match_tuple,
        } => {
            let current_match = match (match_tuple, field_id) {
                (Some(tuple), field_id) => FieldsetMatch::Match {
                    state: MatchState::Unplayed,
                    tuple: tuple.clone(),
                    field_id: *field_id,
                    active: false,
                },
                (None, Some(field_id)) => FieldsetMatch::Timeout {
                    state: MatchState::Unplayed,
                    field_id: *field_id,
                    active: false,
                },
                (None, None) => FieldsetMatch::None,
            };
            FieldsetState {
                current_match,
                audience_display: state.audience_display,
            }
        }

        FieldsetNotice::FieldActivated { field_id } => {
            let current_match = match &state.current_match {
                FieldsetMatch::None => FieldsetMatch::Timeout {
                    state: MatchState::Unplayed,
                    field_id: *field_id,
                    active: true,
                },
                FieldsetMatch::Timeout { state, .. } => FieldsetMatch::Timeout {
                    state: *state,
                    field_id: *field_id,
                    active: true,
                },
                FieldsetMatch::Match { state, tuple, .. } => FieldsetMatch::Match {
                    state: *state,
                    tuple: tuple.clone(),
                    field_id: Some(*field_id),
                    active: true,
                },
            };
            FieldsetState {
                current_match,
                audience_display: state.audience_display,
            }
        }

        FieldsetNotice::MatchStarted { field_id } => {
            let current_match = match &state.current_match {
                FieldsetMatch::None => FieldsetMatch::Timeout {
                    state: MatchState::Running,
                    field_id: *field_id,
                    active: false,
                },
                FieldsetMatch::Timeout { active, .. } => FieldsetMatch::Timeout {
                    state: MatchState::Running,
                    field_id: *field_id,
                    active: *active,
                },
                FieldsetMatch::Match { tuple, active, .. } => FieldsetMatch::Match {
                    state: MatchState::Running,
                    tuple: tuple.clone(),
                    field_id: Some(*field_id),
                    active: *active,
                },
            };
            FieldsetState {
                current_match,
                audience_display: state.audience_display,
            }
        }

        FieldsetNotice::MatchStopped { .. } => {
            let current_match = match &state.current_match {
                // Nothing queued; nothing to stop.
                FieldsetMatch::None => FieldsetMatch::None,
                FieldsetMatch::Timeout {
                    field_id, active, ..
                } => FieldsetMatch::Timeout {
                    state: MatchState::Stopped,
                    field_id: *field_id,
                    active: *active,
                },
                FieldsetMatch::Match {
                    tuple,
                    field_id,
                    active,
                    ..
                } => FieldsetMatch::Match {
                    state: MatchState::Stopped,
                    tuple: tuple.clone(),
                    field_id: *field_id,
                    active: *active,
                },
            };
            FieldsetState {
                current_match,
                audience_display: state.audience_display,
            }
        }
    }
}

impl FieldsetState {
    /// Fold one notice into this state in place.
    pub fn apply(&mut self, notice: &FieldsetNotice) {
        *self = reduce(self, notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AudienceDisplay, MatchRound, MatchTuple};

    fn tuple() -> MatchTuple {
        MatchTuple {
            session: 1,
            division: 1,
            round: MatchRound::Qualification,
            instance: 1,
            match_num: 12,
        }
    }

    fn run(notices: &[FieldsetNotice]) -> FieldsetState {
        let mut state = FieldsetState::default();
        for notice in notices {
            state.apply(notice);
        }
        state
    }

    #[test]
    fn initial_state() {
        let state = FieldsetState::default();
        assert_eq!(state.current_match, FieldsetMatch::None);
        assert_eq!(state.audience_display, AudienceDisplay::Blank);
    }

    #[test]
    fn full_match_lifecycle() {
        // Queue, activate, start, stop a real match on field 2.
        let state = run(&[
            FieldsetNotice::FieldMatchAssigned {
                field_id: Some(2),
                match_tuple: Some(tuple()),
            },
            FieldsetNotice::FieldActivated { field_id: 2 },
            FieldsetNotice::MatchStarted { field_id: 2 },
            FieldsetNotice::MatchStopped { field_id: 2 },
        ]);

        assert_eq!(
            state.current_match,
            FieldsetMatch::Match {
                state: MatchState::Stopped,
                tuple: tuple(),
                field_id: Some(2),
                active: true,
            }
        );
    }

    #[test]
    fn activation_from_idle_is_a_timeout() {
        let state = run(&[FieldsetNotice::FieldActivated { field_id: 5 }]);
        assert_eq!(
            state.current_match,
            FieldsetMatch::Timeout {
                state: MatchState::Unplayed,
                field_id: 5,
                active: true,
            }
        );
    }

    #[test]
    fn empty_assignment_without_field_clears() {
        let state = run(&[
            FieldsetNotice::FieldMatchAssigned {
                field_id: Some(1),
                match_tuple: Some(tuple()),
            },
            FieldsetNotice::FieldMatchAssigned {
                field_id: None,
                match_tuple: None,
            },
        ]);
        assert_eq!(state.current_match, FieldsetMatch::None);
    }

    #[test]
    fn empty_assignment_with_field_queues_timeout() {
        let state = run(&[FieldsetNotice::FieldMatchAssigned {
            field_id: Some(3),
            match_tuple: None,
        }]);
        assert_eq!(
            state.current_match,
            FieldsetMatch::Timeout {
                state: MatchState::Unplayed,
                field_id: 3,
                active: false,
            }
        );
    }

    #[test]
    fn start_from_idle_runs_a_timeout() {
        let state = run(&[FieldsetNotice::MatchStarted { field_id: 4 }]);
        assert_eq!(
            state.current_match,
            FieldsetMatch::Timeout {
                state: MatchState::Running,
                field_id: 4,
                active: false,
            }
        );
    }

    #[test]
    fn stop_on_idle_is_a_noop() {
        let state = run(&[FieldsetNotice::MatchStopped { field_id: 1 }]);
        assert_eq!(state.current_match, FieldsetMatch::None);
    }

    #[test]
    fn start_updates_field_and_preserves_active() {
        let state = run(&[
            FieldsetNotice::FieldMatchAssigned {
                field_id: Some(1),
                match_tuple: Some(tuple()),
            },
            FieldsetNotice::MatchStarted { field_id: 2 },
        ]);
        assert_eq!(
            state.current_match,
            FieldsetMatch::Match {
                state: MatchState::Running,
                tuple: tuple(),
                field_id: Some(2),
                active: false,
            }
        );
    }

    #[test]
    fn display_change_leaves_match_untouched() {
        let state = run(&[
            FieldsetNotice::FieldMatchAssigned {
                field_id: Some(1),
                match_tuple: Some(tuple()),
            },
            FieldsetNotice::AudienceDisplayChanged {
                display: AudienceDisplay::InMatch,
            },
        ]);

        assert_eq!(state.audience_display, AudienceDisplay::InMatch);
        assert!(matches!(state.current_match, FieldsetMatch::Match { .. }));
    }

    #[test]
    fn display_change_is_idempotent() {
        let notice = FieldsetNotice::AudienceDisplayChanged {
            display: AudienceDisplay::SavedMatchResults,
        };
        let once = run(std::slice::from_ref(&notice));
        let twice = run(&[notice.clone(), notice]);
        assert_eq!(once, twice);
    }

    #[test]
    fn reduce_is_total_over_all_combinations() {
        let bases = [
            FieldsetMatch::None,
            FieldsetMatch::Timeout {
                state: MatchState::Running,
                field_id: 1,
                active: true,
            },
            FieldsetMatch::Match {
                state: MatchState::Unplayed,
                tuple: tuple(),
                field_id: None,
                active: false,
            },
        ];
        let notices = [
            FieldsetNotice::FieldMatchAssigned {
                field_id: None,
                match_tuple: None,
            },
            FieldsetNotice::FieldMatchAssigned {
                field_id: Some(1),
                match_tuple: None,
            },
            FieldsetNotice::FieldMatchAssigned {
                field_id: Some(1),
                match_tuple: Some(tuple()),
            },
            FieldsetNotice::FieldActivated { field_id: 1 },
            FieldsetNotice::MatchStarted { field_id: 1 },
            FieldsetNotice::MatchStopped { field_id: 1 },
            FieldsetNotice::AudienceDisplayChanged {
                display: AudienceDisplay::Awards,
            },
        ];

        for base in &bases {
            for notice in &notices {
                let state = FieldsetState {
                    current_match: base.clone(),
                    audience_display: AudienceDisplay::Blank,
                };
                // Must not panic, and the match variant never gains fields
                // of another tag.
                let next = reduce(&state, notice);
                if let FieldsetNotice::AudienceDisplayChanged { display } = notice {
                    assert_eq!(next.audience_display, *display);
                    assert_eq!(next.current_match, state.current_match);
                } else {
                    assert_eq!(next.audience_display, state.audience_display);
                }
            }
        }
    }
}
