//! Helmport CLI - rewrite Helm chart images onto private registries

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "helmport")]
#[command(author = "Helmport Contributors")]
#[command(version)]
#[command(about = "Rewrite Helm chart images onto private registries", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate override values that point chart images at a new registry
    Override {
        /// Unpacked chart directory containing Chart.yaml
        #[arg(short = 'c', long)]
        chart_path: PathBuf,

        /// Registry rewritten images are pulled from
        #[arg(short = 't', long)]
        target_registry: Option<String>,

        /// Registries whose images should be rewritten (comma-separated)
        #[arg(short = 's', long, value_delimiter = ',', required = true)]
        source_registries: Vec<String>,

        /// Registries to leave untouched even when listed as sources (comma-separated)
        #[arg(short = 'e', long, value_delimiter = ',')]
        exclude_registries: Vec<String>,

        /// Registry mappings file
        #[arg(short = 'f', long, alias = "registry-file")]
        config: Option<PathBuf>,

        /// Repository layout under the target registry
        #[arg(long, default_value = helmport_engine::DEFAULT_STRATEGY)]
        path_strategy: String,

        /// Fail instead of skipping values the scanner cannot rewrite
        #[arg(long)]
        strict: bool,

        /// Skip chart-specific compatibility rules
        #[arg(long)]
        disable_rules: bool,

        /// Write the override document here instead of stdout
        #[arg(short = 'o', long)]
        output_file: Option<PathBuf>,

        /// Output format: yaml or json
        #[arg(long, default_value = "yaml")]
        output_format: String,

        /// Print the override document without writing any file
        #[arg(long)]
        dry_run: bool,
    },

    /// List the images a chart's values reference
    Inspect {
        /// Unpacked chart directory containing Chart.yaml
        #[arg(short = 'c', long)]
        chart_path: PathBuf,

        /// Only report images from these registries (comma-separated)
        #[arg(short = 's', long, value_delimiter = ',')]
        source_registries: Vec<String>,

        /// Registries to drop from the report (comma-separated)
        #[arg(short = 'e', long, value_delimiter = ',')]
        exclude_registries: Vec<String>,

        /// Write the report here instead of stdout
        #[arg(short = 'o', long)]
        output_file: Option<PathBuf>,

        /// Output format: yaml or json
        #[arg(long, default_value = "yaml")]
        output_format: String,

        /// Write a registry mappings skeleton instead of the report
        #[arg(
            long,
            num_args = 0..=1,
            default_missing_value = "registry-mappings.yaml",
            value_name = "PATH"
        )]
        generate_config_skeleton: Option<PathBuf>,

        /// Replace the skeleton file if it already exists
        #[arg(long)]
        overwrite_skeleton: bool,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // clap formats its own usage errors; keep that output but exit
        // with the documented code instead of clap's default
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                exit_codes::MISSING_FLAGS
            } else {
                exit_codes::SUCCESS
            };
            std::process::exit(code);
        }
    };

    if cli.debug {
        // SAFETY: We're the only thread at this point (start of main)
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }

    let result = match cli.command {
        Commands::Override {
            chart_path,
            target_registry,
            source_registries,
            exclude_registries,
            config,
            path_strategy,
            strict,
            disable_rules,
            output_file,
            output_format,
            dry_run,
        } => commands::override_cmd::run(
            &chart_path,
            target_registry.as_deref(),
            &source_registries,
            &exclude_registries,
            config.as_deref(),
            &path_strategy,
            strict,
            disable_rules,
            output_file.as_deref(),
            &output_format,
            dry_run,
            cli.debug,
        ),

        Commands::Inspect {
            chart_path,
            source_registries,
            exclude_registries,
            output_file,
            output_format,
            generate_config_skeleton,
            overwrite_skeleton,
        } => commands::inspect::run(
            &chart_path,
            &source_registries,
            &exclude_registries,
            output_file.as_deref(),
            &output_format,
            generate_config_skeleton.as_deref(),
            overwrite_skeleton,
            cli.debug,
        ),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
