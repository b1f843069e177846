//! Blood request lifecycle.
//!
//! ```text
//!            ┌──────────► fulfilled   (requester | administrator)
//!            │
//!   open ────┼──────────► cancelled   (requester | administrator)
//!            │
//!            └──────────► expired     (sweeper | administrator)
//! ```
//!
//! All states except `open` are terminal. This module only decides whether a
//! transition is allowed; persisting it goes through the conditional update in
//! [`crate::db`] so that a stale read can never overwrite a newer status.

use thiserror::Error;

use crate::models::{Actor, BloodRequest, RequestStatus};

/// Lifecycle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

pub type TransitionResult<T> = Result<T, TransitionError>;

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy)]
pub enum Initiator<'a> {
    /// A user or administrator acting through the API
    Actor(&'a Actor),
    /// The expiration sweeper
    Sweeper,
}

/// An approved status change, to be applied with a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub request_id: String,
    pub from: RequestStatus,
    pub to: RequestStatus,
}

/// Whether the state graph has an edge `from -> to`.
pub fn is_allowed(from: RequestStatus, to: RequestStatus) -> bool {
    matches!(
        (from, to),
        (RequestStatus::Open, RequestStatus::Fulfilled)
            | (RequestStatus::Open, RequestStatus::Cancelled)
            | (RequestStatus::Open, RequestStatus::Expired)
    )
}

/// Check that `initiator` may move `request` to `to`.
///
/// Authority is checked before the state graph, so an outsider gets
/// `Forbidden` even for a request that is already closed.
pub fn plan(
    request: &BloodRequest,
    to: RequestStatus,
    initiator: Initiator<'_>,
) -> TransitionResult<Transition> {
    authorize(request, to, initiator)?;

    if !is_allowed(request.status, to) {
        return Err(TransitionError::InvalidTransition {
            from: request.status,
            to,
        });
    }

    Ok(Transition {
        request_id: request.id.clone(),
        from: request.status,
        to,
    })
}

fn authorize(
    request: &BloodRequest,
    to: RequestStatus,
    initiator: Initiator<'_>,
) -> TransitionResult<()> {
    match initiator {
        Initiator::Sweeper => {
            if to != RequestStatus::Expired {
                return Err(TransitionError::Forbidden(format!(
                    "sweeper cannot move requests to {}",
                    to
                )));
            }
            Ok(())
        }
        Initiator::Actor(actor) if actor.is_administrator() => Ok(()),
        Initiator::Actor(actor) => match to {
            RequestStatus::Fulfilled | RequestStatus::Cancelled
                if request.is_owned_by(&actor.id) =>
            {
                Ok(())
            }
            // No state has an edge back to open
            RequestStatus::Open if request.is_owned_by(&actor.id) => {
                Err(TransitionError::InvalidTransition {
                    from: request.status,
                    to,
                })
            }
            RequestStatus::Expired => Err(TransitionError::Forbidden(
                "only administrators may expire a request manually".into(),
            )),
            _ => Err(TransitionError::Forbidden(format!(
                "actor {} does not own request {}",
                actor.id, request.id
            ))),
        },
    }
}

/// Check that `actor` may hard-delete `request`. Deletion bypasses the
/// state graph and is reserved for administrators.
pub fn authorize_delete(actor: &Actor, request: &BloodRequest) -> TransitionResult<()> {
    if actor.is_administrator() {
        return Ok(());
    }
    Err(TransitionError::Forbidden(format!(
        "only administrators may delete request {}",
        request.id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodType, NewBloodRequest};
    use chrono::Utc;

    fn open_request(owner: Option<&str>) -> BloodRequest {
        let mut input =
            NewBloodRequest::new(BloodType::APositive, 1, "Taiz", "Hospital", "+967777123456");
        input.requester_id = owner.map(String::from);
        input.validate(Utc::now()).unwrap()
    }

    #[test]
    fn test_owner_can_fulfill_and_cancel() {
        let request = open_request(Some("user-1"));
        let owner = Actor::requester("user-1");

        for to in [RequestStatus::Fulfilled, RequestStatus::Cancelled] {
            let transition = plan(&request, to, Initiator::Actor(&owner)).unwrap();
            assert_eq!(transition.from, RequestStatus::Open);
            assert_eq!(transition.to, to);
        }
    }

    #[test]
    fn test_owner_cannot_expire() {
        let request = open_request(Some("user-1"));
        let owner = Actor::requester("user-1");

        let err = plan(&request, RequestStatus::Expired, Initiator::Actor(&owner)).unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden(_)));
    }

    #[test]
    fn test_other_requester_forbidden() {
        let request = open_request(Some("user-1"));
        let other = Actor::requester("user-2");

        let err = plan(&request, RequestStatus::Cancelled, Initiator::Actor(&other)).unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden(_)));

        // Unowned requests are administrator-only
        let unowned = open_request(None);
        assert!(plan(&unowned, RequestStatus::Fulfilled, Initiator::Actor(&other)).is_err());
    }

    #[test]
    fn test_administrator_may_do_anything_from_open() {
        let request = open_request(Some("user-1"));
        let admin = Actor::administrator("admin");

        for to in [RequestStatus::Fulfilled, RequestStatus::Cancelled, RequestStatus::Expired] {
            assert!(plan(&request, to, Initiator::Actor(&admin)).is_ok());
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        let admin = Actor::administrator("admin");

        for from in [RequestStatus::Fulfilled, RequestStatus::Cancelled, RequestStatus::Expired] {
            let mut request = open_request(Some("user-1"));
            request.status = from;

            for to in RequestStatus::ALL {
                let err = plan(&request, to, Initiator::Actor(&admin)).unwrap_err();
                assert_eq!(err, TransitionError::InvalidTransition { from, to });
            }
        }
    }

    #[test]
    fn test_reopening_is_invalid() {
        let request = open_request(Some("user-1"));
        let admin = Actor::administrator("admin");

        let err = plan(&request, RequestStatus::Open, Initiator::Actor(&admin)).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn test_owner_reopening_is_invalid_not_forbidden() {
        let request = open_request(Some("user-1"));
        let owner = Actor::requester("user-1");

        let err = plan(&request, RequestStatus::Open, Initiator::Actor(&owner)).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: RequestStatus::Open,
                to: RequestStatus::Open,
            }
        );

        // Outsiders are still turned away before the graph is consulted
        let other = Actor::requester("user-2");
        let err = plan(&request, RequestStatus::Open, Initiator::Actor(&other)).unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden(_)));
    }

    #[test]
    fn test_sweeper_only_expires() {
        let request = open_request(None);
        assert!(plan(&request, RequestStatus::Expired, Initiator::Sweeper).is_ok());
        assert!(matches!(
            plan(&request, RequestStatus::Fulfilled, Initiator::Sweeper),
            Err(TransitionError::Forbidden(_))
        ));
    }

    #[test]
    fn test_delete_is_admin_only() {
        let request = open_request(Some("user-1"));
        assert!(authorize_delete(&Actor::administrator("admin"), &request).is_ok());
        assert!(authorize_delete(&Actor::requester("user-1"), &request).is_err());
    }
}
