//! CLI entry point for mapdebug.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, logging setup and
//! exit codes. All business logic lives in the `mapdebug-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use mapdebug_app::{
    DiagnoseInput, ExplainOutput, FramesInput, diagnosis_exit_code, error_exit_code,
    run_diagnose, run_diagnose_frames, run_explain, serialize_response, write_output,
};
use mapdebug_settings::Overrides;
use tracing_subscriber::EnvFilter;

/// Exit code for arguments that cannot be parsed.
const EXIT_BAD_REQUEST: i32 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "mapdebug",
    version,
    about = "Diagnose why error event frames do not resolve to source maps"
)]
struct Cli {
    /// Store directory (events/, releases/, blobs/).
    #[arg(long, default_value = ".")]
    store: Utf8PathBuf,

    /// Path to mapdebug config TOML, relative to the store directory.
    #[arg(long, default_value = "mapdebug.toml")]
    config: Utf8PathBuf,

    /// Override the organization releases are looked up in.
    #[arg(long)]
    organization_id: Option<u64>,

    /// Override how many artifact names are carried as evidence.
    #[arg(long)]
    max_artifact_names: Option<u32>,

    /// Log diagnosis steps to stderr.
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Diagnose one frame of an event.
    Diagnose {
        #[arg(long)]
        project_id: u64,
        #[arg(long)]
        event_id: String,
        #[arg(long)]
        exception_idx: usize,
        #[arg(long)]
        frame_idx: usize,

        /// Where to write the JSON response (stdout if not specified).
        #[arg(long)]
        out: Option<Utf8PathBuf>,
    },

    /// Diagnose every frame of one exception.
    Frames {
        #[arg(long)]
        project_id: u64,
        #[arg(long)]
        event_id: String,
        #[arg(long)]
        exception_idx: usize,

        /// Where to write the JSON response (stdout if not specified).
        #[arg(long)]
        out: Option<Utf8PathBuf>,
    },

    /// Explain an issue code with remediation guidance.
    Explain {
        /// The issue code (e.g., "partial_match") to explain.
        code: String,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // `--help` and `--version` are reported as errors too.
            let code = if err.use_stderr() { EXIT_BAD_REQUEST } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    let result = match &cli.cmd {
        Commands::Diagnose {
            project_id,
            event_id,
            exception_idx,
            frame_idx,
            out,
        } => cmd_diagnose(
            &cli,
            *project_id,
            event_id,
            *exception_idx,
            *frame_idx,
            out.as_deref(),
        ),
        Commands::Frames {
            project_id,
            event_id,
            exception_idx,
            out,
        } => cmd_frames(&cli, *project_id, event_id, *exception_idx, out.as_deref()),
        Commands::Explain { code } => Ok(cmd_explain(code)),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("mapdebug error: {err:#}");
            std::process::exit(error_exit_code(&err));
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        organization_id: cli.organization_id,
        max_artifact_names: cli.max_artifact_names,
    }
}

/// Load config if present; a missing file is allowed (defaults apply).
fn read_config(cli: &Cli) -> String {
    let path = cli.store.join(&cli.config);
    match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(%path, error = %err, "no config file; using defaults");
            String::new()
        }
    }
}

fn emit(out: Option<&Utf8Path>, bytes: &[u8]) -> anyhow::Result<()> {
    match out {
        Some(path) => write_output(path, bytes).context("write response"),
        None => {
            print!("{}", String::from_utf8_lossy(bytes));
            Ok(())
        }
    }
}

fn cmd_diagnose(
    cli: &Cli,
    project_id: u64,
    event_id: &str,
    exception_idx: usize,
    frame_idx: usize,
    out: Option<&Utf8Path>,
) -> anyhow::Result<i32> {
    let config_text = read_config(cli);
    let output = run_diagnose(DiagnoseInput {
        store_root: &cli.store,
        config_text: &config_text,
        overrides: overrides(cli),
        project_id,
        event_id,
        exception_idx,
        frame_idx,
    })?;

    let bytes = serialize_response(&output.response)?;
    emit(out, &bytes)?;
    Ok(diagnosis_exit_code(&output.diagnosis))
}

fn cmd_frames(
    cli: &Cli,
    project_id: u64,
    event_id: &str,
    exception_idx: usize,
    out: Option<&Utf8Path>,
) -> anyhow::Result<i32> {
    let config_text = read_config(cli);
    let output = run_diagnose_frames(FramesInput {
        store_root: &cli.store,
        config_text: &config_text,
        overrides: overrides(cli),
        project_id,
        event_id,
        exception_idx,
    })?;

    let bytes = serialize_response(&output.response)?;
    emit(out, &bytes)?;
    Ok(if output.response.issue_count() > 0 { 2 } else { 0 })
}

fn cmd_explain(code: &str) -> i32 {
    match run_explain(code) {
        ExplainOutput::Found(doc) => {
            print!("{}", mapdebug_app::format_explanation(&doc));
            0
        }
        ExplainOutput::NotFound {
            identifier,
            available_codes,
        } => {
            eprint!(
                "{}",
                mapdebug_app::format_not_found(&identifier, available_codes)
            );
            1
        }
    }
}
