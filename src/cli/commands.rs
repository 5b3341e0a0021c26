use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use std::path::{Path, PathBuf};

use crate::config;
use crate::logic::{parse_timestamp, Timestamp};

use super::exit_codes;
use super::output::{self, CheckData, EvalData, EvalResult, OutputMode};

#[derive(Parser)]
#[command(name = "lifecourse")]
#[command(about = "Build and evaluate life-course transition conditions")]
#[command(version)]
pub struct Cli {
    /// Output in JSON format (auto-enabled when stdout is piped)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Force text output even when stdout is piped
    #[arg(long, global = true, conflicts_with = "json")]
    pub no_json: bool,

    /// Suppress all output on success (errors still go to stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every definition in a file and report errors
    Check {
        /// Definition file (JSON or JSON5): one definition or an object of named definitions
        file: PathBuf,
    },

    /// Evaluate definitions against a subject snapshot
    Eval {
        /// Definition file (JSON or JSON5)
        file: PathBuf,

        /// Subject file (overrides LIFECOURSE_SUBJECT env var)
        #[arg(short, long)]
        subject: Option<PathBuf>,

        /// Evaluation time: epoch millis, RFC 3339 or YYYY-MM-DD (defaults to now)
        #[arg(long)]
        at: Option<String>,

        /// Only evaluate the named definition
        #[arg(short, long)]
        name: Option<String>,
    },
}

pub fn execute(cli: Cli) -> Result<()> {
    let output_mode = OutputMode::from_flags(cli.json, cli.no_json, cli.quiet);

    match cli.command {
        Commands::Check { file } => check(&file, output_mode),
        Commands::Eval {
            file,
            subject,
            at,
            name,
        } => eval(&file, subject, at.as_deref(), name.as_deref(), output_mode),
    }
}

/// report a failure: JSON-RPC error and exit code in JSON mode, error otherwise
fn fail(output_mode: OutputMode, code: i32, message: String) -> Result<()> {
    if output_mode.is_json() {
        output::print_json_error(code, &message);
        std::process::exit(code);
    }
    Err(anyhow!("{}", message))
}

fn check(path: &Path, output_mode: OutputMode) -> Result<()> {
    let errors = match config::verify(path) {
        Ok(errors) => errors,
        Err(e) => return fail(output_mode, exit_codes::CONFIG_ERROR, format!("{:#}", e)),
    };

    if !errors.is_empty() {
        let message = format!(
            "definition file has {} error(s): {}",
            errors.len(),
            path.display()
        );
        if output_mode.is_json() {
            output::print_json_error_with_errors(exit_codes::CONFIG_ERROR, &message, errors);
            std::process::exit(exit_codes::CONFIG_ERROR);
        }

        println!("✗ {}", message);
        println!();
        for error in &errors {
            println!("  - {}", error);
        }
        return Err(anyhow!("definition validation failed"));
    }

    let library = config::load_definitions(path)?;
    let definitions: Vec<String> = library.keys().cloned().collect();

    match output_mode {
        OutputMode::Json => output::print_json(&CheckData {
            path: path.display().to_string(),
            definitions,
        }),
        OutputMode::Text => println!(
            "✓ {} definition(s) valid: {}",
            definitions.len(),
            path.display()
        ),
        OutputMode::Quiet => {}
    }
    Ok(())
}

fn resolve_time(at: Option<&str>) -> Option<Timestamp> {
    match at {
        Some(s) => parse_timestamp(s),
        None => Some(chrono::Utc::now().timestamp_millis()),
    }
}

fn eval(
    path: &Path,
    subject_path: Option<PathBuf>,
    at: Option<&str>,
    name: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    let Some(time) = resolve_time(at) else {
        return fail(
            output_mode,
            exit_codes::INVALID_ARGS,
            format!(
                "invalid time '{}': expected epoch millis, RFC 3339 or YYYY-MM-DD",
                at.unwrap_or_default()
            ),
        );
    };

    let library = match config::load_definitions(path) {
        Ok(library) => library,
        Err(e) => return fail(output_mode, exit_codes::CONFIG_ERROR, format!("{:#}", e)),
    };

    let subject = match config::get_subject_path(subject_path)
        .and_then(|subject_path| config::load_subject(&subject_path))
    {
        Ok(subject) => subject,
        Err(e) => return fail(output_mode, exit_codes::SUBJECT_ERROR, format!("{:#}", e)),
    };

    if let Some(name) = name {
        if !library.contains_key(name) {
            let available: Vec<&str> = library.keys().map(String::as_str).collect();
            return fail(
                output_mode,
                exit_codes::NOT_FOUND,
                format!(
                    "no definition named '{}' in {} (available: {})",
                    name,
                    path.display(),
                    available.join(", ")
                ),
            );
        }
    }

    let results: Vec<EvalResult> = library
        .iter()
        .filter(|(key, _)| name.map_or(true, |n| n == key.as_str()))
        .map(|(key, condition)| {
            let result = condition.test(&subject, time);
            debug!(definition = %key, result, "evaluated");
            EvalResult {
                name: key.clone(),
                condition: condition.to_string(),
                result,
            }
        })
        .collect();

    match output_mode {
        OutputMode::Json => output::print_json(&EvalData {
            at: time,
            subject: subject.id.clone(),
            results,
        }),
        OutputMode::Text => {
            for r in &results {
                println!("{}: {}", r.name, r.result);
            }
        }
        OutputMode::Quiet => {}
    }
    Ok(())
}
