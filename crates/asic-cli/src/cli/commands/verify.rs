use super::{load_container, StructuralAnalyzer};
use crate::cli::args::ContainerArgs;
use crate::exit_codes::{SUCCESS, VERIFY_FAILED};
use anyhow::Result;
use asic_evidence::validate_container;

pub fn run(args: ContainerArgs) -> Result<i32> {
    let content = match load_container(&args)? {
        Ok(content) => content,
        Err(code) => return Ok(code),
    };
    let validation = validate_container(&content, &StructuralAnalyzer);
    let code = if validation.is_valid() {
        SUCCESS
    } else {
        VERIFY_FAILED
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&validation)?);
        return Ok(code);
    }

    for manifest in &validation.manifests {
        let status = match (manifest.error, manifest.intact) {
            (Some(error), _) => format!("ERROR {error}"),
            (None, true) => "OK".to_string(),
            (None, false) => "FAILED".to_string(),
        };
        println!("{:<8} {}", status, manifest.manifest);
    }
    for finding in &validation.findings {
        eprintln!("  [{}] {}: {}", finding.code, finding.subject, finding.message);
    }

    if code == SUCCESS {
        eprintln!(
            "Container verified ({}): OK, {} manifest(s)",
            args.container,
            validation.manifests.len()
        );
    } else {
        eprintln!(
            "Container verification FAILED ({}): {} finding(s)",
            args.container,
            validation.findings.len()
        );
    }
    Ok(code)
}
