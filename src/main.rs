use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use defo::convert::{convert_document, ConversionResult, Warning, CELL_ID_ATTR};
use defo::dom::{Document, NamespaceConfig};

/// draw.io SVG to dashboard-ready SVG converter
#[derive(Parser, Debug)]
#[command(name = "defo")]
#[command(version)]
#[command(about = "Replace foreignObject labels with native SVG text", long_about = None)]
struct Args {
    /// Input SVG file
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output SVG path (defaults to INPUT with a .converted.svg suffix)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Print the conversion report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let Some(input) = args.input else {
        Args::command().print_help().ok();
        return Err("missing input file".to_string());
    };

    if !input.exists() {
        return Err(format!("'{}' not found", input.display()));
    }
    let is_svg = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);
    if !is_svg {
        return Err("Input must be a .svg file".to_string());
    }

    let output = args
        .output
        .unwrap_or_else(|| input.with_extension("converted.svg"));
    if output.exists() {
        eprintln!("Warning: overwriting '{}'", output.display());
    }

    let xml = std::fs::read_to_string(&input)
        .map_err(|e| format!("Failed to read '{}': {}", input.display(), e))?;
    let mut doc = Document::parse(&xml).map_err(|e| format!("Invalid SVG: {}", e))?;
    if doc.get(doc.root()).local_name() != "svg" {
        return Err(format!("'{}' is not an SVG document", input.display()));
    }

    eprintln!("Processing {}...", input.display());
    let result = convert_document(&mut doc);
    report(&result);

    let svg = doc.to_svg(&NamespaceConfig::for_document(&doc))?;
    std::fs::write(&output, svg)
        .map_err(|e| format!("Failed to write '{}': {}", output.display(), e))?;

    if result.removed_empty > 0 {
        eprintln!(
            "Converted {} labels, removed {} empty containers -> {}",
            result.converted(),
            result.removed_empty,
            output.display()
        );
    } else {
        eprintln!(
            "Converted {} labels -> {}",
            result.converted(),
            output.display()
        );
    }

    if args.json {
        let report = serde_json::json!({
            "converted": result.converted(),
            "removed_empty": result.removed_empty,
            "labels": result.labels,
            "warnings": result.warnings,
            "errors": result.errors,
        });
        let encoded = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to encode report: {}", e))?;
        println!("{}", encoded);
    }

    Ok(())
}

fn report(result: &ConversionResult) {
    for label in &result.labels {
        eprintln!(
            "  {}: '{}' at ({:.1}, {:.1})",
            label.id, label.text, label.x, label.y
        );
    }
    for warning in &result.warnings {
        match warning {
            Warning::FallbackId { text, id } => eprintln!(
                "  Warning: no {} for '{}', using {}",
                CELL_ID_ATTR,
                truncate(text, 30),
                id
            ),
            Warning::ZeroAnchor { text, x, y } => eprintln!(
                "  Warning: zero coordinate for '{}' (x={:.1}, y={:.1})",
                truncate(text, 20),
                x,
                y
            ),
            Warning::Orphaned { text } => {
                eprintln!("  Warning: orphaned container '{}'", truncate(text, 20))
            }
        }
    }
    for error in &result.errors {
        eprintln!(
            "  Error: failed to replace '{}': {}",
            truncate(&error.text, 30),
            error.message
        );
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let head: String = text.chars().take(limit).collect();
        format!("{}...", head)
    }
}
