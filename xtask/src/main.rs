//! Developer tasks (schema generation, fixture conformance).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    // If we're in the xtask directory, go up one level
    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(manifest_dir)
    } else {
        manifest_dir
    }
}

/// Get the schemas directory path.
fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_response_schema() -> schemars::Schema {
    schema_for!(mapdebug_types::DiagnosisResponse)
}

fn generate_frames_schema() -> schemars::Schema {
    schema_for!(mapdebug_types::FramesResponse)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(mapdebug_settings::MapdebugConfigV1)
}

/// List of schemas to generate.
fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "mapdebug.response.v1.json",
            generate: generate_response_schema,
        },
        SchemaSpec {
            filename: "mapdebug.frames.v1.json",
            generate: generate_frames_schema,
        },
        SchemaSpec {
            filename: "mapdebug.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

/// Emit schemas to the schemas/ directory.
fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Validate fixture responses and configs against the schemas");
    eprintln!("  conform-full      Full conformance: fixtures + mapdebug binary output");
    eprintln!("  explain-coverage  Validate all issue codes have explanations");
}

fn compile(schema: schemars::Schema) -> anyhow::Result<jsonschema::Validator> {
    let value = serde_json::to_value(schema).context("Failed to serialize schema")?;
    jsonschema::validator_for(&value).map_err(|e| anyhow::anyhow!("Failed to compile schema: {e}"))
}

/// Fixture directories (store roots) that carry an `expected.response.json`.
fn response_fixtures() -> anyhow::Result<Vec<(String, PathBuf)>> {
    let dir = fixtures_dir();
    let mut out = Vec::new();
    for entry in fs::read_dir(&dir).context("Failed to read tests/fixtures/")? {
        let path = entry?.path();
        if !path.join("expected.response.json").exists() {
            continue;
        }
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        out.push((name, path));
    }
    out.sort();
    Ok(out)
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Validate fixture conformance.
///
/// This checks:
/// 1. Every `expected.response.json` validates against the response schema
/// 2. Every issue uses a known code with its registered message
/// 3. Every fixture `mapdebug.toml` parses and resolves
fn conform() -> anyhow::Result<()> {
    let compiled = compile(generate_response_schema())?;
    println!("✓ response schema compiles");

    let fixtures = response_fixtures()?;
    if fixtures.is_empty() {
        bail!("No fixtures found in {}", fixtures_dir().display());
    }

    let mut errors = Vec::new();
    for (name, dir) in &fixtures {
        let value = read_json(&dir.join("expected.response.json"))?;

        for err in compiled.iter_errors(&value) {
            errors.push(format!("{name}: schema validation: {err}"));
        }

        let issues = value
            .get("errors")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        if issues.len() > 1 {
            errors.push(format!("{name}: more than one issue reported"));
        }
        for issue in issues {
            let code = issue.get("type").and_then(|v| v.as_str()).unwrap_or_default();
            let message = issue.get("message").and_then(|v| v.as_str());
            match mapdebug_types::ids::message_for(code) {
                None => errors.push(format!("{name}: unknown issue code '{code}'")),
                Some(expected) if message != Some(expected) => {
                    errors.push(format!("{name}: message for '{code}' does not match registry"));
                }
                Some(_) => {}
            }
        }

        let config = dir.join("mapdebug.toml");
        if config.exists() {
            let text = fs::read_to_string(&config)?;
            if let Err(err) = mapdebug_settings::parse_config_toml(&text)
                .and_then(|cfg| mapdebug_settings::resolve_config(cfg, Default::default()))
            {
                errors.push(format!("{name}: mapdebug.toml: {err:#}"));
            }
        }

        println!("  ✓ {name} checked");
    }

    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ All {} fixtures pass conformance checks!", fixtures.len());
    Ok(())
}

/// Full conformance: run the built binary on every fixture and compare with the
/// expected response.
fn conform_full() -> anyhow::Result<()> {
    conform()?;

    println!("\n--- Full conformance: mapdebug binary output ---\n");

    let compiled = compile(generate_response_schema())?;
    let bin = project_root().join("target").join("debug").join("mapdebug");
    #[cfg(target_os = "windows")]
    let bin = bin.with_extension("exe");

    if !bin.exists() {
        bail!(
            "mapdebug binary not found at {}.\n\
            Run `cargo build -p mapdebug-cli` first.",
            bin.display()
        );
    }

    let mut errors = Vec::new();
    for (name, dir) in response_fixtures()? {
        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let out = temp_dir.path().join("response.json");

        let output = std::process::Command::new(&bin)
            .arg("--store")
            .arg(&dir)
            .args([
                "diagnose",
                "--project-id",
                "1",
                "--event-id",
                "evt1",
                "--exception-idx",
                "0",
                "--frame-idx",
                "0",
                "--out",
            ])
            .arg(&out)
            .output()
            .with_context(|| format!("Failed to run mapdebug on fixture '{name}'"))?;

        if !matches!(output.status.code(), Some(0 | 2)) {
            errors.push(format!(
                "fixture '{name}': mapdebug exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
            continue;
        }

        let actual = read_json(&out)?;
        for err in compiled.iter_errors(&actual) {
            errors.push(format!("fixture '{name}': schema validation: {err}"));
        }
        if actual != read_json(&dir.join("expected.response.json"))? {
            errors.push(format!(
                "fixture '{name}': output differs from expected.response.json"
            ));
        } else {
            println!("  ✓ fixture '{name}' matches expected response");
        }
    }

    if !errors.is_empty() {
        eprintln!("\nFull conformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!(
            "Full conformance validation failed with {} errors",
            errors.len()
        );
    }

    println!("\n✓ Full conformance checks passed!");
    Ok(())
}

/// Validate that all issue codes have explanations.
fn explain_coverage() -> anyhow::Result<()> {
    let codes = mapdebug_types::explain::all_codes();
    let mut errors = Vec::new();

    for code in codes {
        match mapdebug_types::explain::lookup_explanation(code) {
            Some(exp) => {
                if exp.title.is_empty() {
                    errors.push(format!("Code '{}' has empty title", code));
                }
                if exp.description.is_empty() {
                    errors.push(format!("Code '{}' has empty description", code));
                }
                if exp.remediation.is_empty() {
                    errors.push(format!("Code '{}' has empty remediation", code));
                }
            }
            None => errors.push(format!("Code '{}' has no explanation", code)),
        }
        if mapdebug_types::ids::message_for(code).is_none() {
            errors.push(format!("Code '{}' has no message", code));
        }
    }

    if errors.is_empty() {
        println!("✓ {} codes have explanations", codes.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!(
            "Explain coverage validation failed with {} errors",
            errors.len()
        )
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "conform" => conform(),
        "conform-full" => conform_full(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
