//! Signature and container extension.

pub mod chain;
pub mod errors;
pub mod policy;
pub mod service;
pub mod transition;

pub use chain::{extend_to_lta, ArchiveChainBuilder, ExtensionOutcome};
pub use errors::{ExtensionError, IllegalInput};
pub use policy::{ExtensionPolicy, ExtensionPolicyConfig, PolicyViolation, StatusAlert};
pub use service::ExtensionService;
pub use transition::{check_transition, ContainerState, DetectedLevel, SignatureState};
