// xtask - Development tasks for gb-canvas
//
// Every task is a list of cargo invocations. The argument lists are built by
// plain functions so they can be checked without spawning cargo.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

const WASM_TARGET: &str = "wasm32-unknown-unknown";

#[derive(Parser)]
#[command(name = "x", about = "Development tasks for gb-canvas")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Task {
    /// Formatting, lints for both targets, tests and the browser build
    Ci,
    /// Format the workspace
    Fmt {
        /// Only report unformatted files
        #[arg(long)]
        check: bool,
    },
    /// Lint the native build, or the browser build with --wasm
    Clippy {
        #[arg(long)]
        wasm: bool,
    },
    /// Run tests, optionally limited to library modules
    Test {
        /// Library module to test, e.g. `session` (repeatable)
        #[arg(long = "module", value_name = "NAME")]
        modules: Vec<String>,
    },
    /// Run the criterion benchmarks
    Bench {
        /// Only run benchmarks whose name contains this
        filter: Option<String>,
    },
    /// Build the cdylib for the browser
    Wasm {
        #[arg(long)]
        release: bool,
    },
    /// Draw frames without a window and save the last one as PNG
    Headless {
        /// ROM file to submit before the first frame
        rom: Option<String>,
        #[arg(short = 'n', long, default_value_t = 120)]
        frames: u64,
        /// Snapshot file or directory
        #[arg(long, default_value = "target/snapshots")]
        snapshot: String,
        #[arg(long)]
        release: bool,
    },
}

/// One cargo invocation with a label for the progress line
#[derive(Debug, PartialEq)]
struct Step {
    label: String,
    args: Vec<String>,
}

impl Step {
    fn new(label: impl Into<String>, args: &[&str]) -> Self {
        Self {
            label: label.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn run(&self) -> Result<()> {
        println!("{} {}", "→".blue(), self.label.bold());
        let started = Instant::now();

        let status = Command::new("cargo")
            .args(&self.args)
            .status()
            .with_context(|| format!("could not run cargo {}", self.args.join(" ")))?;
        if !status.success() {
            println!("{} {}", "✗".red().bold(), self.label);
            bail!("`cargo {}` failed ({})", self.args.join(" "), status);
        }

        println!(
            "{} {} {}",
            "✓".green().bold(),
            self.label,
            format!("({:.1}s)", started.elapsed().as_secs_f64()).dimmed()
        );
        Ok(())
    }
}

fn fmt_step(check: bool) -> Step {
    let step = Step::new("fmt", &["fmt", "--all"]);
    if check {
        step.arg("--").arg("--check")
    } else {
        step
    }
}

fn clippy_step(wasm: bool) -> Step {
    if wasm {
        Step::new(
            "clippy (wasm)",
            &["clippy", "--lib", "--target", WASM_TARGET, "--", "-D", "warnings"],
        )
    } else {
        Step::new(
            "clippy",
            &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        )
    }
}

fn test_steps(modules: &[String]) -> Vec<Step> {
    if modules.is_empty() {
        return vec![Step::new("tests", &["test", "--workspace"])];
    }
    modules
        .iter()
        .map(|module| {
            Step::new(format!("{} tests", module), &["test", "--lib"]).arg(format!("{}::", module))
        })
        .collect()
}

fn bench_step(filter: Option<&str>) -> Step {
    let step = Step::new("benchmarks", &["bench"]);
    match filter {
        Some(filter) => step.arg("--").arg(filter),
        None => step,
    }
}

fn wasm_step(release: bool) -> Step {
    let step = Step::new("wasm build", &["build", "--lib", "--target", WASM_TARGET]);
    if release {
        step.arg("--release")
    } else {
        step
    }
}

fn headless_step(rom: Option<&str>, frames: u64, snapshot: &str, release: bool) -> Step {
    let mut step = Step::new("headless run", &["run"]);
    if release {
        step = step.arg("--release");
    }
    step = step
        .arg("--")
        .arg("--headless")
        .arg("--frames")
        .arg(frames.to_string())
        .arg("--snapshot")
        .arg(snapshot);
    match rom {
        Some(rom) => step.arg(rom),
        None => step,
    }
}

fn ci_steps() -> Vec<Step> {
    let mut steps = vec![fmt_step(true), clippy_step(false), clippy_step(true)];
    steps.extend(test_steps(&[]));
    steps.push(wasm_step(false));
    steps
}

fn run_all(steps: &[Step]) -> Result<()> {
    let started = Instant::now();
    for step in steps {
        step.run()?;
    }
    if steps.len() > 1 {
        println!(
            "\n{} {} steps in {:.1}s",
            "done:".green().bold(),
            steps.len(),
            started.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let steps = match Cli::parse().task {
        Task::Ci => ci_steps(),
        Task::Fmt { check } => vec![fmt_step(check)],
        Task::Clippy { wasm } => vec![clippy_step(wasm)],
        Task::Test { modules } => test_steps(&modules),
        Task::Bench { filter } => vec![bench_step(filter.as_deref())],
        Task::Wasm { release } => {
            run_all(&[wasm_step(release)])?;
            let profile = if release { "release" } else { "debug" };
            println!(
                "module: {}",
                format!("target/{}/{}/gb_canvas.wasm", WASM_TARGET, profile).cyan()
            );
            println!(
                "bindings: {}",
                "wasm-bindgen --target web --out-dir web/pkg <module>".bold()
            );
            return Ok(());
        }
        Task::Headless {
            rom,
            frames,
            snapshot,
            release,
        } => {
            if let Some(rom) = &rom {
                if !Path::new(rom).is_file() {
                    bail!("ROM file not found: {}", rom);
                }
            }
            std::fs::create_dir_all(&snapshot)
                .with_context(|| format!("could not create {}", snapshot))?;
            vec![headless_step(rom.as_deref(), frames, &snapshot, release)]
        }
    };
    run_all(&steps)
}
