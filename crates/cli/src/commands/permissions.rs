use clap::Args;
use serde_json::json;

use portico_core::badge::StatusBadge;
use portico_core::domain::actor::Actor;
use portico_core::domain::request::{ProjectRequest, RequestId, RequestStatus};
use portico_core::permissions::evaluate;

use super::CommandResult;

#[derive(Debug, Args)]
pub struct PermissionsArgs {
    #[arg(long, help = "Actor role, e.g. student, mentor, researcher, admin")]
    pub role: String,
    #[arg(long = "actor-id", help = "Actor identifier")]
    pub actor_id: String,
    #[arg(long, help = "Request status (pending, under_review, approved, rejected, on_hold)")]
    pub status: Option<String>,
    #[arg(long = "submitted-by", help = "Request submitter identifier")]
    pub submitted_by: Option<String>,
    #[arg(long, help = "Treat the request as soft-deleted")]
    pub deleted: bool,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

pub fn run(args: PermissionsArgs) -> CommandResult {
    let status = match args.status.as_deref() {
        None => None,
        Some(raw) => match RequestStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                let allowed = RequestStatus::ALL.map(|status| status.as_str()).join(", ");
                return CommandResult::failure(
                    2,
                    format!("unknown status `{raw}` (expected one of: {allowed})"),
                );
            }
        },
    };

    let request = ProjectRequest {
        id: RequestId("cli-probe".to_string()),
        status,
        submitter_id: args.submitted_by.clone().unwrap_or_default(),
        document: None,
        is_deleted: args.deleted,
    };
    let actor = Actor::new(args.actor_id.clone(), args.role.clone());

    let permissions = evaluate(Some(&request), Some(&actor));
    let badge = StatusBadge::for_status(status, permissions.can_edit);

    if args.json {
        let payload = json!({ "permissions": permissions, "badge": badge });
        let output = serde_json::to_string_pretty(&payload)
            .unwrap_or_else(|error| format!("{{\"error\":\"serialization failed: {error}\"}}"));
        return CommandResult::success(output);
    }

    let status_label = status.map(|status| status.as_str()).unwrap_or("unknown");
    let mut lines = vec![format!(
        "capability evaluation for role `{}` on a {} request:",
        args.role, status_label
    )];
    lines.push(format!("- canEdit = {}", permissions.can_edit));
    lines.push(format!("- canChangeStatus = {}", permissions.can_change_status));
    lines.push(format!("- canViewDocument = {}", permissions.can_view_document));
    lines.push(format!("- canDelete = {}", permissions.can_delete));
    lines.push(format!("- canApprove = {}", permissions.can_approve));
    lines.push(format!("- canReject = {}", permissions.can_reject));
    lines.push(format!("- isReadOnly = {}", permissions.is_read_only));
    lines.push(format!("- showAdminBadge = {}", permissions.show_admin_badge));
    lines.push(format!("- isOwner = {}", permissions.is_owner));

    let badge_suffix =
        badge.badge.map(|label| format!(", {label}")).unwrap_or_default();
    lines.push(format!(
        "badge: {} ({}, icon {}{badge_suffix})",
        badge.text, badge.color, badge.icon
    ));

    CommandResult::success(lines.join("\n"))
}
