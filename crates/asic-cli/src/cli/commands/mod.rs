pub mod inspect;
pub mod verify;

use super::args::{Command, ContainerArgs};
use crate::exit_codes::{UNSAFE_CONTAINER, VERIFY_FAILED};
use anyhow::{Context, Result};
use asic_evidence::{
    extract_with, ContainerContent, Document, ErrorClass, ExtractLimits, ExtractLimitsOverrides,
    SecureZipHandler, SignatureAnalyzer, SignatureEvidence,
};
use std::fs;
use std::io::{self, Read};

pub fn dispatch(cli: super::args::Cli) -> Result<i32> {
    match cli.cmd {
        Command::Inspect(args) => inspect::run(args),
        Command::Verify(args) => verify::run(args),
    }
}

/// Signature cryptography is not available from the command line; signatures
/// are listed but never assigned a level.
pub(crate) struct StructuralAnalyzer;

impl SignatureAnalyzer for StructuralAnalyzer {
    fn analyze(&self, _signature: &Document) -> Option<SignatureEvidence> {
        None
    }
}

/// Parse `--limits`: inline JSON or `@path`.
pub(crate) fn parse_limits(limits: Option<&str>) -> Result<ExtractLimits> {
    let defaults = ExtractLimits::default();
    let Some(s) = limits else {
        return Ok(defaults);
    };
    let overrides = if s.starts_with('@') {
        let path = s.trim_start_matches('@').trim();
        if path.is_empty() {
            anyhow::bail!("--limits @path: path cannot be empty");
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("limits file not found: {}", path))?;
        serde_json::from_str::<ExtractLimitsOverrides>(&content)
            .with_context(|| format!("invalid limits JSON in {}", path))?
    } else {
        serde_json::from_str::<ExtractLimitsOverrides>(s)
            .context("invalid --limits JSON (use --limits @path for file)")?
    };
    Ok(defaults.apply(overrides))
}

/// Read and extract the container named by `args`.
///
/// `Ok(Err(code))` means the bytes were read but do not form an acceptable
/// container; the error has already been reported on stderr.
pub(crate) fn load_container(args: &ContainerArgs) -> Result<Result<ContainerContent, i32>> {
    let limits = parse_limits(args.limits.as_deref())?;
    let raw = if args.container == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read container from stdin")?;
        buf
    } else {
        fs::read(&args.container)
            .with_context(|| format!("failed to open container {}", args.container))?
    };

    match extract_with(&raw, &SecureZipHandler::new(limits)) {
        Ok(content) => Ok(Ok(content)),
        Err(err) => {
            tracing::debug!(code = %err.code(), "container rejected");
            eprintln!("Container rejected ({}): {err}", args.container);
            let code = match err.code().class() {
                ErrorClass::Limits | ErrorClass::Security => UNSAFE_CONTAINER,
                ErrorClass::Integrity | ErrorClass::Contract => VERIFY_FAILED,
            };
            Ok(Err(code))
        }
    }
}
