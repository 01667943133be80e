use super::{load_container, StructuralAnalyzer};
use crate::cli::args::ContainerArgs;
use crate::exit_codes::SUCCESS;
use anyhow::Result;
use asic_evidence::{validate_container, EntryKind};
use serde::Serialize;

#[derive(Serialize)]
struct EntryView<'a> {
    name: &'a str,
    kind: EntryKind,
    mime_type: &'a str,
    size: usize,
}

pub fn run(args: ContainerArgs) -> Result<i32> {
    let content = match load_container(&args)? {
        Ok(content) => content,
        Err(code) => return Ok(code),
    };
    let validation = validate_container(&content, &StructuralAnalyzer);

    let entries: Vec<EntryView<'_>> = content
        .all_documents()
        .map(|doc| EntryView {
            name: doc.name(),
            kind: EntryKind::of(doc.name()),
            mime_type: doc.mime_type().as_str(),
            size: doc.len(),
        })
        .collect();

    if args.format == "json" {
        let view = serde_json::json!({
            "container_type": content.container_type(),
            "zip_comment": content.zip_comment(),
            "entries": entries,
            "manifests": validation.manifests,
            "archive_chain": validation.archive_chain,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(SUCCESS);
    }

    println!("ASiC Container Inspector");
    println!("========================");
    println!("Type:        {}", content.container_type());
    println!("Entries:     {}", content.len());
    if let Some(comment) = content.zip_comment() {
        println!("Comment:     {}", comment);
    }
    println!();
    println!("{:<26} {:>10}  Name", "Kind", "Bytes");
    for entry in &entries {
        println!(
            "{:<26} {:>10}  {}",
            format!("{:?}", entry.kind),
            entry.size,
            entry.name
        );
    }

    if !validation.manifests.is_empty() {
        println!();
        println!("Manifests");
        for manifest in &validation.manifests {
            let reference = manifest.sig_reference.as_deref().unwrap_or("<unparsed>");
            println!(
                "  {} -> {} ({} entries)",
                manifest.manifest,
                reference,
                manifest.entries.len()
            );
        }
    }
    if !validation.archive_chain.is_empty() {
        println!();
        println!("Archive chain: {}", validation.archive_chain.join(" -> "));
    }
    Ok(SUCCESS)
}
