//! Certificate chain reordering.

use asic_evidence::x509::{reorder, ReorderError, ReorderWarning};
use asic_evidence::CertificateToken;
use proptest::prelude::*;

/// root <- intermediate <- leaf, linked by key identifiers.
fn chain_with_key_ids() -> Vec<CertificateToken> {
    vec![
        CertificateToken::from_fields("root", "CN=Root", "CN=Root")
            .with_key_ids(Some(b"k-root".as_slice()), Some(b"k-root".as_slice())),
        CertificateToken::from_fields("ca", "CN=Issuing CA", "CN=Root")
            .with_key_ids(Some(b"k-ca".as_slice()), Some(b"k-root".as_slice())),
        CertificateToken::from_fields("leaf", "CN=Signer", "CN=Issuing CA")
            .with_key_ids(Some(b"k-leaf".as_slice()), Some(b"k-ca".as_slice())),
    ]
}

fn ids(chain: &[CertificateToken]) -> Vec<&str> {
    chain.iter().map(|c| c.id()).collect()
}

#[test]
fn test_orders_leaf_to_root() {
    let outcome = reorder(&chain_with_key_ids(), None).unwrap();
    assert_eq!(ids(outcome.chain.leaf_to_root()), vec!["leaf", "ca", "root"]);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_duplicates_are_ignored() {
    let mut candidates = chain_with_key_ids();
    candidates.extend(chain_with_key_ids());
    let outcome = reorder(&candidates, None).unwrap();
    assert_eq!(outcome.chain.len(), 3);
}

/// Two unrelated end-entity certificates: the hint decides, with a warning.
#[test]
fn test_hint_resolves_ambiguous_signer() {
    let a = CertificateToken::from_fields("a", "CN=A", "CN=Root");
    let b = CertificateToken::from_fields("b", "CN=B", "CN=Root");
    let root = CertificateToken::from_fields("root", "CN=Root", "CN=Root");
    let candidates = vec![a.clone(), b.clone(), root];

    let hinted = reorder(&candidates, Some(&b)).unwrap();
    assert_eq!(hinted.chain.leaf().map(|c| c.id()), Some("b"));
    assert!(matches!(
        hinted.warnings.as_slice(),
        [ReorderWarning::AmbiguousSigner { chosen, .. }] if chosen == "b"
    ));

    let unhinted = reorder(&candidates, None).unwrap();
    assert_eq!(unhinted.chain.leaf().map(|c| c.id()), Some("a"));
    assert_eq!(ids(unhinted.chain.leaf_to_root()), vec!["a", "root"]);
}

/// Mutual issuers leave no signing certificate.
#[test]
fn test_cycle_without_leaf_is_an_error() {
    let x = CertificateToken::from_fields("x", "CN=X", "CN=Y");
    let y = CertificateToken::from_fields("y", "CN=Y", "CN=X");
    let err = reorder(&[x, y], None).unwrap_err();
    assert!(matches!(err, ReorderError::NoSigningCertificate { candidates: 2 }));
}

/// A cycle above the leaf stops the walk instead of looping.
#[test]
fn test_cycle_above_leaf_terminates() {
    let leaf = CertificateToken::from_fields("leaf", "CN=Leaf", "CN=X");
    let x = CertificateToken::from_fields("x", "CN=X", "CN=Y");
    let y = CertificateToken::from_fields("y", "CN=Y", "CN=X");
    let outcome = reorder(&[leaf, x, y], None).unwrap();
    assert_eq!(ids(outcome.chain.leaf_to_root()), vec!["leaf", "x", "y"]);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, ReorderWarning::CycleDetected { .. })));
}

#[test]
fn test_empty_input() {
    assert!(matches!(
        reorder(&[], None),
        Err(ReorderError::NoSigningCertificate { candidates: 0 })
    ));
}

proptest! {
    #[test]
    fn test_order_does_not_depend_on_input_order(
        shuffled in Just(chain_with_key_ids()).prop_shuffle()
    ) {
        let outcome = reorder(&shuffled, None).unwrap();
        prop_assert_eq!(ids(outcome.chain.leaf_to_root()), vec!["leaf", "ca", "root"]);
        let root_first: Vec<&str> = outcome.chain.root_to_leaf().iter().map(|c| c.id()).collect();
        prop_assert_eq!(root_first, vec!["root", "ca", "leaf"]);
    }
}
