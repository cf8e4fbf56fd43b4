//! Override command - generate image override values for a chart
//!
//! The override document goes to stdout (or --output-file) so it can be
//! piped straight into `helm install -f -`; all status output goes to
//! stderr.

use console::style;
use helmport_core::LoadedChart;
use helmport_engine::{
    strategy, MappingConfig, OverrideEngine, OverrideOutcome, Resolver, RunContext,
};
use std::fs;
use std::path::Path;

use crate::commands::{finish_document, OutputFormat};
use crate::error::{CliError, Result};

pub fn run(
    chart_path: &Path,
    target_registry: Option<&str>,
    source_registries: &[String],
    exclude_registries: &[String],
    config: Option<&Path>,
    path_strategy: &str,
    strict: bool,
    disable_rules: bool,
    output_file: Option<&Path>,
    output_format: &str,
    dry_run: bool,
    debug: bool,
) -> Result<()> {
    if target_registry.is_none() && config.is_none() {
        return Err(CliError::usage_with_help(
            "--target-registry or --config is required",
            "Pass --target-registry for a single target registry, or --config for \
             per-source mappings",
        ));
    }

    let format = OutputFormat::parse(output_format)?;
    let strategy = strategy::from_name(path_strategy)?;

    let mapping = match config {
        Some(path) => Some(MappingConfig::load(path)?),
        None => None,
    };

    if debug {
        eprintln!(
            "{} Loading chart from {}",
            style("DEBUG").dim(),
            chart_path.display()
        );
    }

    let chart = LoadedChart::load(chart_path)?;

    eprintln!(
        "{} Scanning {} for images from {} source registr{}",
        style("→").blue(),
        chart.metadata.name,
        source_registries.len(),
        if source_registries.len() == 1 { "y" } else { "ies" }
    );

    let context = RunContext::new(source_registries, exclude_registries)
        .with_strict(strict)
        .with_rules(!disable_rules);

    let resolver = Resolver::new(mapping, target_registry.map(str::to_string));
    let engine = OverrideEngine::new(resolver).with_strategy(strategy);

    let outcome = engine.run(&chart, &context)?;

    report(&outcome, debug);

    let document = finish_document(match format {
        OutputFormat::Yaml => outcome.to_yaml()?,
        OutputFormat::Json => outcome.to_json()?,
    });

    if dry_run {
        eprintln!("{} Dry run, no files written", style("⚠").yellow());
        print!("{document}");
        return Ok(());
    }

    match output_file {
        Some(path) => {
            fs::write(path, &document).map_err(|e| CliError::io_at(path, e))?;
            eprintln!(
                "{} Wrote overrides to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => print!("{document}"),
    }

    Ok(())
}

fn report(outcome: &OverrideOutcome, debug: bool) {
    if outcome.is_empty() {
        eprintln!("{} No images required rewriting", style("⚠").yellow());
    } else {
        eprintln!(
            "{} Rewrote {} of {} image reference(s)",
            style("✓").green(),
            outcome.images_rewritten,
            outcome.images_found
        );
    }

    if !outcome.skipped.is_empty() {
        eprintln!(
            "  {} {} image(s) outside the source registries left untouched",
            style("⚠").yellow(),
            outcome.skipped.len()
        );
        if debug {
            for pattern in &outcome.skipped {
                eprintln!(
                    "{} skipped {} at {}",
                    style("DEBUG").dim(),
                    pattern.reference,
                    pattern.path
                );
            }
        }
    }

    if !outcome.unsupported.is_empty() {
        eprintln!(
            "  {} {} unsupported value(s) skipped:",
            style("⚠").yellow(),
            outcome.unsupported.len()
        );
        for finding in &outcome.unsupported {
            eprintln!("    {} {}", style("✗").red(), finding);
        }
    }

    for rule in &outcome.rules_applied {
        eprintln!("  {} Applied rule {}", style("→").blue(), rule);
    }
}
