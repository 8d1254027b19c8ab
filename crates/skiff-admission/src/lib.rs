//! skiff-admission — the deployment gate.
//!
//! Given a recipe, a target device, and an operator-supplied
//! configuration, the admission service decides whether the deployment
//! may proceed. Three conditions stop everything immediately (unknown
//! recipe, unknown device, device offline); every other finding
//! accumulates so the operator sees the complete list of blockers in
//! one round trip.
//!
//! Device state is reached through two seams: a remote executor (runs
//! a command on the device, deadline-bounded) and a resource probe
//! (live RAM/storage/port snapshot). A probe that fails or times out
//! records a warning and assumes sufficiency — the fail-open policy —
//! while a probe that succeeds turns every insufficiency into an
//! error.

pub mod config;
pub mod exec;
pub mod service;

pub use config::{ConfigValidationError, validate_config};
pub use exec::{DeviceStore, ProbeReport, RemoteExecutor, ResourceProbe};
pub use service::MarketplaceService;
