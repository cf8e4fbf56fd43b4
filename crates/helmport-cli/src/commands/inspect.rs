//! Inspect command - list chart images without rewriting anything

use console::style;
use helmport_core::LoadedChart;
use helmport_engine::{inspect_chart, render_config_skeleton, RunContext};
use std::fs;
use std::path::Path;

use crate::commands::{finish_document, OutputFormat};
use crate::error::{CliError, Result};

pub fn run(
    chart_path: &Path,
    source_registries: &[String],
    exclude_registries: &[String],
    output_file: Option<&Path>,
    output_format: &str,
    generate_config_skeleton: Option<&Path>,
    overwrite_skeleton: bool,
    debug: bool,
) -> Result<()> {
    let format = OutputFormat::parse(output_format)?;

    let chart = LoadedChart::load(chart_path)?;

    let context = if source_registries.is_empty() && exclude_registries.is_empty() {
        None
    } else {
        Some(RunContext::new(source_registries, exclude_registries))
    };

    let report = inspect_chart(&chart, context.as_ref());

    if debug {
        eprintln!(
            "{} Found {} image(s) across {} registr{}",
            style("DEBUG").dim(),
            report.images.len(),
            report.registries.len(),
            if report.registries.len() == 1 { "y" } else { "ies" }
        );
    }

    if let Some(path) = generate_config_skeleton {
        return write_skeleton(&report.registries, path, overwrite_skeleton);
    }

    let document = finish_document(match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(&report).map_err(|e| CliError::processing(e.to_string()))?
        }
        OutputFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::processing(e.to_string()))?,
    });

    match output_file {
        Some(path) => {
            fs::write(path, &document).map_err(|e| CliError::io_at(path, e))?;
            eprintln!(
                "{} Wrote inspection report to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => print!("{document}"),
    }

    Ok(())
}

fn write_skeleton(registries: &[String], path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(CliError::Io {
            message: format!(
                "refusing to overwrite '{}'; pass --overwrite-skeleton to replace it",
                path.display()
            ),
        });
    }

    let skeleton = render_config_skeleton(registries)?;
    fs::write(path, skeleton).map_err(|e| CliError::io_at(path, e))?;

    eprintln!(
        "{} Wrote mappings skeleton to {}",
        style("✓").green(),
        path.display()
    );
    eprintln!(
        "  {} Edit the target values, then re-run with --config {}",
        style("→").blue(),
        path.display()
    );

    Ok(())
}
