//! Platform Backend Integration - outbound HTTP client for the gateway
//!
//! This crate is everything Portico knows about talking to the remote
//! platform backend:
//! - **Transport** (`transport`) - one reqwest client behind the
//!   `PlatformTransport` trait so handlers and tests share a seam
//! - **Normalization** (`normalize`) - turns whatever the backend sent
//!   (JSON, HTML error pages, empty bodies) into the gateway envelope
//! - **Client** (`client`) - typed resource calls (users, subroles,
//!   project-requests, notifications) over the transport
//! - **Drain** (`drain`) - sequential whole-listing pagination
//!
//! # Key Types
//!
//! - `PlatformClient` - cloneable facade shared by every route handler
//! - `UpstreamRequest` / `RawResponse` - one call and its untranslated reply
//! - `NormalizedResponse` - status code plus envelope, ready to return
//! - `DrainOutcome` - items gathered by a drain and whether it finished

pub mod client;
pub mod drain;
pub mod normalize;
pub mod transport;
