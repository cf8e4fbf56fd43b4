//! Integration tests for CLI commands

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper to run helmport
fn helmport(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_helmport"))
        .args(args)
        .output()
        .expect("Failed to execute helmport")
}

/// Helper to run helmport with a working directory
fn helmport_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_helmport"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to execute helmport")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Create a chart directory with the given values.yaml
fn create_chart(values: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let chart = dir.path().join("testchart");
    fs::create_dir_all(&chart).unwrap();
    fs::write(
        chart.join("Chart.yaml"),
        "apiVersion: v2\nname: testchart\nversion: 1.0.0\n",
    )
    .unwrap();
    fs::write(chart.join("values.yaml"), values).unwrap();
    (dir, chart)
}

const BASIC_VALUES: &str = r#"image:
  registry: docker.io
  repository: nginx
  tag: "1.25"
worker:
  image: quay.io/prometheus/node-exporter:v1.7.0
"#;

mod override_command {
    use super::*;

    #[test]
    fn test_rewrites_map_form_image() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
        ]);

        assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
        let doc = stdout(&output);
        assert!(doc.contains("registry: registry.local"), "got: {doc}");
        assert!(doc.contains("repository: dockerio/library/nginx"));
        assert!(doc.contains("tag: '1.25'"));
        // quay.io is not a source, so the worker image stays untouched
        assert!(!doc.contains("node-exporter"));
        assert!(stderr(&output).contains("Rewrote 1 of 2"));
    }

    #[test]
    fn test_rewrites_string_form_image() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io,quay.io",
        ]);

        assert_eq!(output.status.code(), Some(0));
        let doc = stdout(&output);
        assert!(
            doc.contains("image: registry.local/quayio/prometheus/node-exporter:v1.7.0"),
            "got: {doc}"
        );
        assert!(stderr(&output).contains("Rewrote 2 of 2"));
    }

    #[test]
    fn test_writes_output_file() {
        let (dir, _chart) = create_chart(BASIC_VALUES);

        let output = helmport_in(
            dir.path(),
            &[
                "override",
                "-c",
                "testchart",
                "-t",
                "registry.local",
                "-s",
                "docker.io",
                "-o",
                "overrides.yaml",
            ],
        );

        assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
        assert!(stdout(&output).is_empty(), "document must not hit stdout");
        let written = fs::read_to_string(dir.path().join("overrides.yaml")).unwrap();
        assert!(written.contains("registry: registry.local"));
        assert!(stderr(&output).contains("Wrote overrides to"));
    }

    #[test]
    fn test_dry_run_never_writes() {
        let (dir, _chart) = create_chart(BASIC_VALUES);

        let output = helmport_in(
            dir.path(),
            &[
                "override",
                "-c",
                "testchart",
                "-t",
                "registry.local",
                "-s",
                "docker.io",
                "-o",
                "overrides.yaml",
                "--dry-run",
            ],
        );

        assert_eq!(output.status.code(), Some(0));
        assert!(stdout(&output).contains("registry: registry.local"));
        assert!(!dir.path().join("overrides.yaml").exists());
    }

    #[test]
    fn test_json_output() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
            "--output-format",
            "json",
        ]);

        assert_eq!(output.status.code(), Some(0));
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["image"]["registry"], "registry.local");
        assert_eq!(json["image"]["repository"], "dockerio/library/nginx");
    }

    #[test]
    fn test_missing_source_registries_is_exit_1() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
        ]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("--source-registries"));
    }

    #[test]
    fn test_missing_target_and_config_is_exit_1() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&["override", "-c", chart.to_str().unwrap(), "-s", "docker.io"]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("--target-registry or --config"));
    }

    #[test]
    fn test_missing_chart_is_exit_4() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-chart");

        let output = helmport(&[
            "override",
            "-c",
            missing.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
        ]);

        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains("Chart not found"));
    }

    #[test]
    fn test_strict_mode_fails_on_template_expression() {
        let (_dir, chart) = create_chart(
            "image:\n  repository: nginx\n  tag: \"{{ .Chart.AppVersion }}\"\n",
        );

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
            "--strict",
        ]);

        assert_eq!(output.status.code(), Some(12), "{}", stderr(&output));
        assert!(stderr(&output).contains("unsupported"));
    }

    #[test]
    fn test_template_expression_skipped_without_strict() {
        let values = format!("{BASIC_VALUES}extra:\n  image: \"{{{{ .Values.tag }}}}\"\n");
        let (_dir, chart) = create_chart(&values);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
        ]);

        assert_eq!(output.status.code(), Some(0));
        assert!(stdout(&output).contains("registry: registry.local"));
        assert!(stderr(&output).contains("unsupported"));
    }

    #[test]
    fn test_legacy_mappings_file_is_exit_2() {
        let (dir, chart) = create_chart(BASIC_VALUES);
        let mappings = dir.path().join("mappings.yaml");
        fs::write(&mappings, "docker.io: registry.local\n").unwrap();

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-s",
            "docker.io",
            "-f",
            mappings.to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(2));
        // miette wraps long messages, so match a single word
        assert!(stderr(&output).contains("legacy"));
    }

    #[test]
    fn test_mappings_file_routes_sources() {
        let (dir, chart) = create_chart(BASIC_VALUES);
        let mappings = dir.path().join("mappings.yaml");
        fs::write(
            &mappings,
            "version: \"1.0\"\nregistries:\n  mappings:\n    - source: docker.io\n      target: mirror.example.com\n",
        )
        .unwrap();

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-s",
            "docker.io",
            "-f",
            mappings.to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
        assert!(stdout(&output).contains("registry: mirror.example.com"));
    }

    #[test]
    fn test_unresolved_registry_is_exit_2() {
        let (dir, chart) = create_chart(BASIC_VALUES);
        let mappings = dir.path().join("mappings.yaml");
        fs::write(
            &mappings,
            "version: \"1.0\"\nregistries:\n  mappings:\n    - source: quay.io\n      target: mirror.example.com\n",
        )
        .unwrap();

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-s",
            "docker.io",
            "-f",
            mappings.to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(2));
        assert!(stderr(&output).contains("docker.io"));
    }

    #[test]
    fn test_exclude_registries() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io,quay.io",
            "-e",
            "quay.io",
        ]);

        assert_eq!(output.status.code(), Some(0));
        let doc = stdout(&output);
        assert!(doc.contains("repository: dockerio/library/nginx"));
        assert!(!doc.contains("node-exporter"));
        assert!(stderr(&output).contains("left untouched"));
    }

    #[test]
    fn test_unknown_strategy_is_exit_1() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
            "--path-strategy",
            "bogus",
        ]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("bogus"));
    }

    #[test]
    fn test_flat_strategy() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
            "--path-strategy",
            "flat",
        ]);

        assert_eq!(output.status.code(), Some(0));
        assert!(stdout(&output).contains("repository: dockerio-library-nginx"));
    }

    #[test]
    fn test_no_images_is_success_with_empty_document() {
        let (_dir, chart) = create_chart("replicas: 3\nservice:\n  port: 8080\n");

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
        ]);

        assert_eq!(output.status.code(), Some(0));
        assert_eq!(stdout(&output).trim(), "{}");
        assert!(stderr(&output).contains("No images required rewriting"));
    }

    #[test]
    fn test_debug_flag_logs_to_stderr() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
            "--debug",
        ]);

        assert_eq!(output.status.code(), Some(0));
        assert!(stderr(&output).contains("DEBUG"));
        // status output must never contaminate the document
        assert!(!stdout(&output).contains("DEBUG"));
    }

    #[test]
    fn test_chart_path_must_be_directory() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.join("values.yaml").to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
        ]);

        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains("Chart not found"));
    }
}

mod inspect_command {
    use super::*;

    #[test]
    fn test_lists_images_and_registries() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&["inspect", "-c", chart.to_str().unwrap()]);

        assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
        let doc = stdout(&output);
        assert!(doc.contains("name: testchart"));
        assert!(doc.contains("- docker.io"));
        assert!(doc.contains("- quay.io"));
        assert!(doc.contains("repository: library/nginx"));
        assert!(doc.contains("repository: prometheus/node-exporter"));
    }

    #[test]
    fn test_json_report() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "inspect",
            "-c",
            chart.to_str().unwrap(),
            "--output-format",
            "json",
        ]);

        assert_eq!(output.status.code(), Some(0));
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["chart"]["name"], "testchart");
        let registries = json["registries"].as_array().unwrap();
        assert!(registries.iter().any(|r| r == "docker.io"));
        assert!(registries.iter().any(|r| r == "quay.io"));
    }

    #[test]
    fn test_source_filter() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "inspect",
            "-c",
            chart.to_str().unwrap(),
            "-s",
            "quay.io",
        ]);

        assert_eq!(output.status.code(), Some(0));
        let doc = stdout(&output);
        assert!(doc.contains("quay.io"));
        assert!(!doc.contains("docker.io"));
    }

    #[test]
    fn test_exclude_filter() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "inspect",
            "-c",
            chart.to_str().unwrap(),
            "-e",
            "quay.io",
        ]);

        assert_eq!(output.status.code(), Some(0));
        assert!(!stdout(&output).contains("quay.io"));
    }

    #[test]
    fn test_report_output_file() {
        let (dir, _chart) = create_chart(BASIC_VALUES);

        let output = helmport_in(
            dir.path(),
            &["inspect", "-c", "testchart", "-o", "report.yaml"],
        );

        assert_eq!(output.status.code(), Some(0));
        assert!(stdout(&output).is_empty());
        let report = fs::read_to_string(dir.path().join("report.yaml")).unwrap();
        assert!(report.contains("name: testchart"));
    }

    #[test]
    fn test_missing_chart_is_exit_4() {
        let output = helmport(&["inspect", "-c", "/definitely/not/a/chart"]);

        assert_eq!(output.status.code(), Some(4));
    }
}

mod skeleton_generation {
    use super::*;

    #[test]
    fn test_writes_default_skeleton_file() {
        let (dir, _chart) = create_chart(BASIC_VALUES);

        let output = helmport_in(
            dir.path(),
            &["inspect", "-c", "testchart", "--generate-config-skeleton"],
        );

        assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
        let skeleton = fs::read_to_string(dir.path().join("registry-mappings.yaml")).unwrap();
        assert!(skeleton.contains("source: quay.io"));
        assert!(skeleton.contains("target: registry.local/quay-io"));
        assert!(skeleton.contains("defaultTarget: registry.local/default"));
        // the default public registry is left out of generated mappings
        assert!(!skeleton.contains("source: docker.io"));
        assert!(stderr(&output).contains("skeleton"));
    }

    #[test]
    fn test_skeleton_custom_path() {
        let (dir, _chart) = create_chart(BASIC_VALUES);

        let output = helmport_in(
            dir.path(),
            &[
                "inspect",
                "-c",
                "testchart",
                "--generate-config-skeleton",
                "custom-mappings.yaml",
            ],
        );

        assert_eq!(output.status.code(), Some(0));
        assert!(dir.path().join("custom-mappings.yaml").exists());
        assert!(!dir.path().join("registry-mappings.yaml").exists());
    }

    #[test]
    fn test_skeleton_refuses_overwrite() {
        let (dir, _chart) = create_chart(BASIC_VALUES);
        fs::write(dir.path().join("registry-mappings.yaml"), "keep me\n").unwrap();

        let output = helmport_in(
            dir.path(),
            &["inspect", "-c", "testchart", "--generate-config-skeleton"],
        );

        assert_eq!(output.status.code(), Some(20));
        assert!(stderr(&output).contains("--overwrite-skeleton"));
        let untouched = fs::read_to_string(dir.path().join("registry-mappings.yaml")).unwrap();
        assert_eq!(untouched, "keep me\n");
    }

    #[test]
    fn test_skeleton_overwrite_flag() {
        let (dir, _chart) = create_chart(BASIC_VALUES);
        fs::write(dir.path().join("registry-mappings.yaml"), "old\n").unwrap();

        let output = helmport_in(
            dir.path(),
            &[
                "inspect",
                "-c",
                "testchart",
                "--generate-config-skeleton",
                "--overwrite-skeleton",
            ],
        );

        assert_eq!(output.status.code(), Some(0));
        let skeleton = fs::read_to_string(dir.path().join("registry-mappings.yaml")).unwrap();
        assert!(skeleton.contains("source: quay.io"));
    }

    #[test]
    fn test_skeleton_round_trips_as_config() {
        let (dir, _chart) = create_chart(BASIC_VALUES);

        let generate = helmport_in(
            dir.path(),
            &["inspect", "-c", "testchart", "--generate-config-skeleton"],
        );
        assert_eq!(generate.status.code(), Some(0));

        let output = helmport_in(
            dir.path(),
            &[
                "override",
                "-c",
                "testchart",
                "-s",
                "quay.io",
                "-f",
                "registry-mappings.yaml",
            ],
        );

        assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
        assert!(stdout(&output).contains("image: registry.local/quay-io/quayio/prometheus/node-exporter:v1.7.0"));
    }
}

mod cli_surface {
    use super::*;

    #[test]
    fn test_version() {
        let output = helmport(&["--version"]);

        assert_eq!(output.status.code(), Some(0));
        assert!(stdout(&output).contains("helmport"));
    }

    #[test]
    fn test_help_lists_subcommands() {
        let output = helmport(&["--help"]);

        assert_eq!(output.status.code(), Some(0));
        let help = stdout(&output);
        assert!(help.contains("override"));
        assert!(help.contains("inspect"));
    }

    #[test]
    fn test_no_subcommand_is_exit_1() {
        let output = helmport(&[]);

        assert_eq!(output.status.code(), Some(1));
    }

    #[test]
    fn test_unknown_output_format_is_exit_1() {
        let (_dir, chart) = create_chart(BASIC_VALUES);

        let output = helmport(&[
            "override",
            "-c",
            chart.to_str().unwrap(),
            "-t",
            "registry.local",
            "-s",
            "docker.io",
            "--output-format",
            "toml",
        ]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("yaml, json"));
    }
}
