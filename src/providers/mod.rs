//! Upstream LLM providers: the static registry, credential resolution, the
//! per-dialect normalizer and the shared client that ties them together.

mod client;
mod credentials;
mod models;
mod normalizer;
mod policy;
mod provider_endpoints;
mod registry;

pub use client::{ProviderClient, WORKBENCH_USER_AGENT};
pub use credentials::ProviderAccess;
pub(crate) use credentials::resolve_access;
pub use models::merged_model_list;
pub use policy::UPSTREAM_BODY_PREVIEW_CHARS;
pub(crate) use policy::success_bytes;
pub use registry::{AuthScheme, Capability, Dialect, ProviderKind, ProviderSpec};
