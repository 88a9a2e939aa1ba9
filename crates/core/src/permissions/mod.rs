use serde::{Deserialize, Serialize};

use crate::domain::actor::Actor;
use crate::domain::request::{ProjectRequest, RequestStatus};

/// Capability set for one (request, actor) pair, serialized in the camelCase
/// shape the console consumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    pub can_edit: bool,
    pub can_change_status: bool,
    pub can_view_document: bool,
    pub can_delete: bool,
    pub can_approve: bool,
    pub can_reject: bool,
    pub is_read_only: bool,
    pub show_admin_badge: bool,
    pub is_owner: bool,
}

impl PermissionSet {
    /// The most restrictive set: everything denied, read-only display.
    pub fn read_only() -> Self {
        PermissionSet { is_read_only: true, ..PermissionSet::default() }
    }
}

/// Computes what `actor` may do to `request`. Pure; never fails. A missing
/// request or actor, or a soft-deleted request, yields the restrictive
/// read-only set.
///
/// Approval is near-terminal: once a request is approved only an admin keeps
/// edit and status-change rights. Rejection blocks the submitter from
/// further edits while mentors-or-higher may still revise the decision; the
/// asymmetry is intentional.
pub fn evaluate(request: Option<&ProjectRequest>, actor: Option<&Actor>) -> PermissionSet {
    let (Some(request), Some(actor)) = (request, actor) else {
        return PermissionSet::read_only();
    };

    if request.is_deleted {
        return PermissionSet::read_only();
    }

    let is_owner = !actor.id.is_empty() && actor.id == request.submitter_id;
    let is_admin = actor.role.is_admin();
    let is_mentor_or_higher = actor.role.is_mentor_or_higher();
    let is_approved = request.is_approved();
    let is_rejected = request.status == Some(RequestStatus::Rejected);
    let is_under_review = request.status == Some(RequestStatus::UnderReview);

    PermissionSet {
        can_edit: is_admin
            || (is_owner && !is_approved && !is_rejected)
            || (is_mentor_or_higher && !is_approved),
        can_change_status: is_admin || (is_mentor_or_higher && !is_approved),
        can_view_document: is_admin || is_owner || is_mentor_or_higher,
        can_delete: is_admin || (is_owner && !is_approved && !is_under_review),
        can_approve: is_mentor_or_higher && !is_approved,
        can_reject: is_mentor_or_higher && !is_approved,
        is_read_only: is_approved && !is_admin,
        show_admin_badge: is_approved && is_admin,
        is_owner,
    }
}
