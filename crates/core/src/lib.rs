pub mod badge;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod permissions;

pub use badge::StatusBadge;
pub use config::{
    AppConfig, ConfigError, ConfigOverrides, ListingConfig, LoadOptions, LogFormat, LoggingConfig,
    ServerConfig, UpstreamConfig,
};
pub use domain::actor::{Actor, BearerToken, Role, REVIEWER_ROLES};
pub use domain::request::{DocumentRef, ProjectRequest, RequestId, RequestStatus, SubmittedBy};
pub use envelope::{is_success_status, message_for_status, Envelope};
pub use permissions::{evaluate, PermissionSet};
