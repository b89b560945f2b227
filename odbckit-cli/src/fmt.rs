//! Runs a source formatter over the workspace, one file at a time, stopping
//! at the first failure.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::opt::FmtOpt;

const DEFAULT_PATTERNS: &[&str] = &[
    "src/**/*.rs",
    "odbckit-core/src/**/*.rs",
    "odbckit-cli/src/**/*.rs",
    "odbckit-cli/benches/**/*.rs",
    "tests/**/*.rs",
];

pub fn run(opt: FmtOpt) -> Result<()> {
    let patterns: Vec<String> = if opt.patterns.is_empty() {
        DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect()
    } else {
        opt.patterns.clone()
    };

    // BTreeSet gives a stable order and folds overlapping patterns together
    let mut files = BTreeSet::new();
    for pattern in &patterns {
        let matches =
            glob::glob(pattern).with_context(|| format!("invalid glob pattern `{}`", pattern))?;
        for entry in matches {
            files.insert(entry?);
        }
    }

    for file in &files {
        println!("Formatting {}", file_name(file));
        let status = format_command(&opt.formatter, opt.check, file)
            .status()
            .with_context(|| format!("failed to run `{}`", opt.formatter))?;
        if !status.success() {
            bail!("`{}` exited with {} on {}", opt.formatter, status, file.display());
        }
    }

    Ok(())
}

fn format_command(formatter: &str, check: bool, file: &Path) -> Command {
    let mut command = Command::new(formatter);
    if check {
        command.arg("--check");
    }
    command.arg(file);
    command
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
