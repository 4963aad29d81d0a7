//! Identity-linking and federation-resolution core.
//!
//! Reconciles two independent identity providers, a corporate directory
//! identity (AAD-style object-id, UPN, display name) and a code-hosting
//! platform identity (GitHub-style numeric id, login, avatar, OAuth tokens),
//! into a single authoritative [`models::IdentityLink`] record, and exposes
//! cached, batch-efficient lookups of users, teams, and organizations built
//! on top of that link.
//!
//! The entry point is [`context::ResolutionContext`]: one per inbound
//! authenticated request, constructed from the request's dual-provider
//! claims (or from an already-known link), holding per-request handle caches
//! and the batch/aggregation operations.
//!
//! HTTP routing, view rendering, session-cookie transport, and OAuth
//! handshakes are external collaborators. The persistence layer and the
//! platform API are consumed through the [`store::LinkStore`] and
//! [`gateway::PlatformGateway`] traits; this crate implements neither
//! transport.

pub mod config;
pub mod context;
pub mod gateway;
pub mod models;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use config::{AuthScheme, PortalConfig};
pub use context::{ContextError, ContextOptions, ResolutionContext};
pub use models::{IdentityLink, RequestClaims};
