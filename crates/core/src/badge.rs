//! Display metadata for request statuses. The console renders these tuples
//! verbatim; the color values are the utility classes its stylesheet ships.

use serde::Serialize;

use crate::domain::request::RequestStatus;

pub const ADMIN_ONLY_EDITING_BADGE: &str = "Admin-Only Editing";
pub const READ_ONLY_BADGE: &str = "Read-Only";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub color: &'static str,
    pub text: &'static str,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<&'static str>,
}

impl StatusBadge {
    /// Maps a status to its display tuple. A missing status renders the
    /// neutral "Unknown" tuple instead of failing. Approved requests carry
    /// an extra badge describing the remaining editability: admin-only when
    /// the caller can still edit, read-only otherwise.
    pub fn for_status(status: Option<RequestStatus>, can_edit: bool) -> Self {
        match status {
            Some(RequestStatus::Pending) => StatusBadge {
                color: "bg-yellow-100 text-yellow-800",
                text: "Pending",
                icon: "clock",
                badge: None,
            },
            Some(RequestStatus::UnderReview) => StatusBadge {
                color: "bg-blue-100 text-blue-800",
                text: "Under Review",
                icon: "search",
                badge: None,
            },
            Some(RequestStatus::Approved) => StatusBadge {
                color: "bg-green-100 text-green-800",
                text: "Approved",
                icon: "check-circle",
                badge: Some(if can_edit { ADMIN_ONLY_EDITING_BADGE } else { READ_ONLY_BADGE }),
            },
            Some(RequestStatus::Rejected) => StatusBadge {
                color: "bg-red-100 text-red-800",
                text: "Rejected",
                icon: "x-circle",
                badge: None,
            },
            Some(RequestStatus::OnHold) => StatusBadge {
                color: "bg-orange-100 text-orange-800",
                text: "On Hold",
                icon: "pause-circle",
                badge: None,
            },
            None => StatusBadge {
                color: "bg-gray-100 text-gray-800",
                text: "Unknown",
                icon: "help-circle",
                badge: None,
            },
        }
    }
}
