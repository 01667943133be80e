//! Level transition matrix, driven through `ExtensionService`.
//!
//! Every rejected transition must carry its exact message and leave the
//! input container byte-identical.

mod common;

use asic_evidence::manifest::{self, ManifestEntry, ManifestFile};
use asic_evidence::{
    BaselineLevel, ContainerContent, ContainerType, DigestAlgorithm, Document, ExtensionError,
    ExtensionPolicy, ExtensionService, IllegalInput, SignatureForm, SignatureLevel,
};
use common::{
    signed_container, signed_container_with, timestamp_only_container, FakeAnalyzer,
    FakeExtender, FakeTsp, SIGNATURE,
};

fn extend(
    content: &ContainerContent,
    target: SignatureLevel,
) -> Result<ContainerContent, ExtensionError> {
    let analyzer = FakeAnalyzer::new();
    let tsp = FakeTsp::new();
    let extender = FakeExtender::default();
    ExtensionService::new(&analyzer, &tsp)
        .with_extender(&extender)
        .extend(content, target, &ExtensionPolicy::default())
        .map(|outcome| outcome.content)
}

fn rejected(content: &ContainerContent, target: SignatureLevel) -> IllegalInput {
    let before = content.to_zip_bytes(None).unwrap();
    let err = extend(content, target).unwrap_err();
    assert_eq!(
        content.to_zip_bytes(None).unwrap(),
        before,
        "input must stay byte-identical"
    );
    err.illegal_input()
        .cloned()
        .unwrap_or_else(|| panic!("expected illegal input, got {err}"))
}

fn cades(level: BaselineLevel) -> SignatureLevel {
    SignatureLevel::cades(level)
}

/// A CAdES signature at `level`, extended to LTA once.
fn archived(level: BaselineLevel) -> ContainerContent {
    extend(&signed_container(level), cades(BaselineLevel::Lta)).unwrap()
}

// =============================================================================
// Allowed
// =============================================================================

/// Proves: strictly increasing and re-affirming transitions are accepted.
#[test]
fn test_allowed_transitions() {
    let cases = [
        (BaselineLevel::B, BaselineLevel::T),
        (BaselineLevel::T, BaselineLevel::T),
        (BaselineLevel::T, BaselineLevel::Lt),
        (BaselineLevel::Lt, BaselineLevel::Lt),
        (BaselineLevel::Lt, BaselineLevel::Lta),
        (BaselineLevel::B, BaselineLevel::Lta),
    ];
    for (from, to) in cases {
        let result = extend(&signed_container(from), cades(to));
        assert!(result.is_ok(), "{from:?} -> {to:?}: {:?}", result.err());
    }
}

/// Proves: LTA to LTA appends another archive pair.
#[test]
fn test_lta_to_lta_is_allowed() {
    let once = archived(BaselineLevel::Lt);
    let twice = extend(&once, cades(BaselineLevel::Lta)).unwrap();
    assert_eq!(twice.archive_manifest_documents().len(), 2);
}

// =============================================================================
// Rejected
// =============================================================================

/// Proves: no level can be downgraded to B.
#[test]
fn test_any_to_b_is_unsupported() {
    for from in [BaselineLevel::B, BaselineLevel::T, BaselineLevel::Lt] {
        let err = rejected(&signed_container(from), cades(BaselineLevel::B));
        assert_eq!(
            err.to_string(),
            "Unsupported signature format 'CAdES-BASELINE-B' for extension."
        );
    }
}

/// Proves: LT to T names the target and the LT reason.
#[test]
fn test_lt_to_t_is_rejected() {
    let err = rejected(&signed_container(BaselineLevel::Lt), cades(BaselineLevel::T));
    assert_eq!(
        err,
        IllegalInput::AlreadyExtendedWithLt {
            level: cades(BaselineLevel::T)
        }
    );
    assert_eq!(
        err.to_string(),
        "Cannot extend signature to 'CAdES-BASELINE-T'. The signedData is already extended with LT level."
    );
}

/// Proves: once archived, T and LT targets fail with the archive reason,
/// never with the LT reason.
#[test]
fn test_archived_signature_rejects_t_and_lt() {
    for base in [BaselineLevel::T, BaselineLevel::Lt] {
        let container = archived(base);
        for target in [BaselineLevel::T, BaselineLevel::Lt] {
            let err = rejected(&container, cades(target));
            assert_eq!(err, IllegalInput::CoveredByArchiveManifest, "{base:?} -> {target:?}");
            assert_eq!(
                err.to_string(),
                "The signature is already covered by an archive manifest."
            );
        }
    }
}

/// Proves: a signature form the container does not hold is unsupported.
#[test]
fn test_form_mismatch_is_unsupported() {
    let target = SignatureLevel::xades(BaselineLevel::Lta);
    let err = rejected(&signed_container(BaselineLevel::Lt), target);
    assert_eq!(err, IllegalInput::UnsupportedFormat { level: target });
}

/// Proves: an evidence-record manifest covering the signature blocks every target.
#[test]
fn test_evidence_record_manifest_blocks_extension() {
    let mut container = signed_container(BaselineLevel::Lt);
    let signature = container.find(SIGNATURE).unwrap().clone();
    let mut er = ManifestFile::new(
        "META-INF/ASiCEvidenceRecordManifest001.xml",
        "META-INF/evidencerecord001.ers",
    );
    er.add_entry(ManifestEntry::for_document(&signature, DigestAlgorithm::Sha256))
        .unwrap();
    container.insert(Document::new(er.filename.clone(), manifest::encode(&er)));
    container.insert(Document::new("META-INF/evidencerecord001.ers", b"ers".to_vec()));

    for target in [BaselineLevel::T, BaselineLevel::Lt, BaselineLevel::Lta] {
        let err = rejected(&container, cades(target));
        assert_eq!(err, IllegalInput::CoveredByManifestFile);
        assert_eq!(
            err.to_string(),
            "The signature is already covered by a manifest file."
        );
    }
}

/// Proves: a last timestamp already covered by another manifest cannot be
/// extended again.
#[test]
fn test_covered_last_timestamp_is_rejected() {
    let mut container = timestamp_only_container();
    let timestamp = container.find("META-INF/timestamp001.tst").unwrap().clone();
    let mut covering =
        ManifestFile::new("META-INF/ASiCManifest002.xml", "META-INF/timestamp000.tst");
    covering
        .add_entry(ManifestEntry::for_document(&timestamp, DigestAlgorithm::Sha256))
        .unwrap();
    container.insert(Document::new(covering.filename.clone(), manifest::encode(&covering)));

    let err = rejected(&container, cades(BaselineLevel::Lta));
    assert_eq!(err, IllegalInput::LastTimestampCovered);
    assert_eq!(
        err.to_string(),
        "Cannot extend the last timestamp. The timestamp is already covered by a manifest file."
    );
}

/// Proves: without signatures only LTA is reachable, and without any
/// evidence nothing is.
#[test]
fn test_unsigned_containers() {
    let timestamped = timestamp_only_container();
    assert!(extend(&timestamped, cades(BaselineLevel::Lta)).is_ok());
    assert_eq!(
        rejected(&timestamped, cades(BaselineLevel::Lt)),
        IllegalInput::NoSupportedSignature
    );

    let mut bare = ContainerContent::new(ContainerType::AsicE);
    bare.insert(Document::new("doc.txt", b"unsigned".to_vec()));
    let err = rejected(&bare, cades(BaselineLevel::Lta));
    assert_eq!(
        err.to_string(),
        "No supported signature documents found! Unable to extend the container."
    );
}

/// Proves: the T/LT path delegates to the extender and fails without one.
#[test]
fn test_t_and_lt_need_an_extender() {
    let analyzer = FakeAnalyzer::new();
    let tsp = FakeTsp::new();
    let container = signed_container(BaselineLevel::T);

    let err = ExtensionService::new(&analyzer, &tsp)
        .extend(&container, cades(BaselineLevel::Lt), &ExtensionPolicy::default())
        .unwrap_err();
    assert!(matches!(err, ExtensionError::MissingExtender { .. }));

    let extender = FakeExtender::default();
    let outcome = ExtensionService::new(&analyzer, &tsp)
        .with_extender(&extender)
        .extend(&container, cades(BaselineLevel::Lt), &ExtensionPolicy::default())
        .unwrap();
    assert_eq!(extender.calls.borrow().len(), 1);
    assert_eq!(tsp.calls.get(), 0);
    assert!(outcome.archive_manifest.is_none());
    assert_eq!(
        outcome.content.find(SIGNATURE).unwrap().content().as_ref(),
        b"CAdES|LT|1"
    );
}

/// Proves: XAdES LTA is embedded in the signature, not written as an archive manifest.
#[test]
fn test_xades_lta_goes_through_the_extender() {
    let analyzer = FakeAnalyzer::new();
    let tsp = FakeTsp::new();
    let extender = FakeExtender::default();
    let container = signed_container_with(SignatureForm::XAdES, BaselineLevel::Lt);

    let outcome = ExtensionService::new(&analyzer, &tsp)
        .with_extender(&extender)
        .extend(
            &container,
            SignatureLevel::xades(BaselineLevel::Lta),
            &ExtensionPolicy::default(),
        )
        .unwrap();
    assert!(outcome.content.archive_manifest_documents().is_empty());
    assert_eq!(tsp.calls.get(), 0);
    assert_eq!(extender.calls.borrow().len(), 1);
}
