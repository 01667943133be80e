//! Certificate tokens, chain reordering and trust decisions.

pub mod certificate;
pub mod reorder;
pub mod verifier;

pub use certificate::{CertificateError, CertificateToken};
pub use reorder::{reorder, CertificateChain, ReorderError, ReorderOutcome, ReorderWarning};
pub use verifier::{CertificateVerifier, TrustAnchors, TrustResult};
