//! Quote lifecycle state machine.
//!
//! Every state transition in the service goes through [`can_transition`]
//! before any write happens; role checks do not live anywhere else.

use serde::{Deserialize, Serialize};

use crate::model::quote::Entry;
use crate::model::user::Role;

/// Lifecycle states of a quote record.
///
/// `DraftSubmitted → PendingApproval → (Accepted | Rejected) → Finalized`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteState {
    DraftSubmitted,
    PendingApproval,
    Accepted,
    Rejected,
    Finalized,
}

impl QuoteState {
    /// States in which the current revision is still under review
    pub fn is_reviewable(&self) -> bool {
        matches!(self, QuoteState::DraftSubmitted | QuoteState::PendingApproval)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QuoteState::Finalized)
    }
}

impl std::fmt::Display for QuoteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuoteState::DraftSubmitted => "DRAFT_SUBMITTED",
            QuoteState::PendingApproval => "PENDING_APPROVAL",
            QuoteState::Accepted => "ACCEPTED",
            QuoteState::Rejected => "REJECTED",
            QuoteState::Finalized => "FINALIZED",
        };
        f.write_str(s)
    }
}

/// Actions a caller may attempt against an existing quote record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteAction {
    Accept,
    Reject,
    Finalize,
    SubmitProviderRevision,
    SelectProviderQuote,
}

impl std::fmt::Display for QuoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuoteAction::Accept => "accept",
            QuoteAction::Reject => "reject",
            QuoteAction::Finalize => "finalize",
            QuoteAction::SubmitProviderRevision => "submit_provider_revision",
            QuoteAction::SelectProviderQuote => "select_provider_quote",
        };
        f.write_str(s)
    }
}

/// Single policy gate for every transition. Evaluated against the
/// session-derived role, never a client-submitted one.
pub fn can_transition(role: Role, state: QuoteState, action: QuoteAction) -> bool {
    if state.is_terminal() {
        return false;
    }
    match action {
        QuoteAction::Accept | QuoteAction::Reject => {
            role == Role::Validator && state.is_reviewable()
        }
        QuoteAction::Finalize => role == Role::Validator && state != QuoteState::Rejected,
        QuoteAction::SubmitProviderRevision => role == Role::Provider && state.is_reviewable(),
        QuoteAction::SelectProviderQuote => {
            role == Role::Petitioner && state != QuoteState::Rejected
        }
    }
}

/// Only petitioners open new quote records
pub fn can_create(role: Role) -> bool {
    role == Role::Petitioner
}

/// The active dashboard is visible to petitioners and supervisors
pub fn can_view_dashboard(role: Role) -> bool {
    matches!(role, Role::Petitioner | Role::Supervisor)
}

/// Role that authors the replacement revision after a rejection: rejecting
/// bounces the current revision back to the counterpart side.
pub fn counter_role(rejecting_role: Role, provider_bound: bool) -> Role {
    match rejecting_role {
        Role::Validator => {
            if provider_bound {
                Role::Provider
            } else {
                Role::Petitioner
            }
        }
        _ => Role::Validator,
    }
}

/// Finalization precondition: at least one entry, and every entry fully priced
pub fn entries_ready_for_finalize(entries: &[Entry]) -> bool {
    !entries.is_empty()
        && entries.iter().all(|e| {
            e.unitary_cost != 0.0 && e.unitary_price != 0.0 && e.unitary_final_price != 0.0
        })
}
