// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Missing-driver detection.
//
// A driver description names the programs the spooler will run for the
// queue.  Any program that is neither in the spooler's filter directory nor
// on the search path is missing; when a distribution package is known to
// ship it, the package is reported instead of the bare program.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use spoolnotify_core::AppConfig;
use spoolnotify_core::error::Result;
use spoolnotify_core::types::MissingSoftware;

use crate::ppd::PpdDescription;

/// Given a driver description, report what software it needs but lacks.
pub trait DriverResolver {
    fn missing_software(&self, ppd: &Path) -> Result<MissingSoftware>;
}

/// How a program name is matched against the package table.
#[derive(Debug, Clone, Copy)]
enum Match {
    Exact,
    Prefix,
}

/// Programs with a well-known providing package.
const PROVIDERS: &[(&str, Match, &str)] = &[
    ("foomatic-rip", Match::Exact, "foomatic-filters"),
    ("rastertogutenprint", Match::Prefix, "gutenprint-cups"),
    ("hpcups", Match::Exact, "hplip"),
    ("hpps", Match::Exact, "hplip"),
    ("hpijs", Match::Exact, "hpijs"),
    ("rastertoqpdl", Match::Exact, "splix"),
    ("rastertospl", Match::Exact, "splix"),
    ("foo2", Match::Prefix, "foo2zjs"),
    ("gs", Match::Exact, "ghostscript"),
    ("pstoraster", Match::Exact, "cups-filters"),
    ("gstoraster", Match::Exact, "cups-filters"),
    ("pdftopdf", Match::Exact, "cups-filters"),
];

fn providing_package(program: &str) -> Option<&'static str> {
    PROVIDERS
        .iter()
        .find(|(name, how, _)| match how {
            Match::Exact => program == *name,
            Match::Prefix => program.starts_with(name),
        })
        .map(|(_, _, package)| *package)
}

/// Resolver that inspects PPD keywords and the local filesystem.
pub struct PpdDriverResolver {
    filter_dir: PathBuf,
    search_path: Vec<PathBuf>,
}

impl PpdDriverResolver {
    pub fn new(filter_dir: impl Into<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        Self {
            filter_dir: filter_dir.into(),
            search_path,
        }
    }

    /// Filter directory from config, search path from `$PATH`.
    pub fn from_config(config: &AppConfig) -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        Self::new(config.filter_dir.clone(), search_path)
    }

    fn is_installed(&self, program: &str) -> bool {
        let program_path = Path::new(program);
        if program_path.is_absolute() {
            return program_path.exists();
        }
        std::iter::once(&self.filter_dir)
            .chain(self.search_path.iter())
            .any(|dir| dir.join(program).exists())
    }

    /// Compute what `description` needs but the system lacks.
    pub fn resolve(&self, description: &PpdDescription) -> MissingSoftware {
        let mut missing = MissingSoftware::default();

        for program in required_programs(description) {
            if self.is_installed(&program) {
                continue;
            }
            let file_name = Path::new(&program)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| program.clone());

            match providing_package(&file_name) {
                Some(package) => {
                    if !missing.packages.iter().any(|p| p == package) {
                        missing.packages.push(package.to_string());
                    }
                }
                None => {
                    if !missing.executables.contains(&program) {
                        missing.executables.push(program);
                    }
                }
            }
        }

        missing
    }
}

impl DriverResolver for PpdDriverResolver {
    #[instrument(skip(self), fields(ppd = %ppd.display()))]
    fn missing_software(&self, ppd: &Path) -> Result<MissingSoftware> {
        let description = PpdDescription::from_path(ppd)?;
        let missing = self.resolve(&description);
        debug!(
            packages = ?missing.packages,
            executables = ?missing.executables,
            "missing driver software computed"
        );
        Ok(missing)
    }
}

/// Programs the driver will run: every named filter, plus `foomatic-rip` and
/// the head of each pipeline stage for Foomatic drivers.
fn required_programs(description: &PpdDescription) -> Vec<String> {
    let mut programs: Vec<String> = description.filters.clone();

    if let Some(command) = &description.foomatic_command {
        programs.push("foomatic-rip".into());
        for stage in command.split('|') {
            let head = stage.split_whitespace().next().unwrap_or_default();
            let looks_like_program = !head.is_empty()
                && !head.contains('%')
                && !head.starts_with(['(', '-', '$']);
            if looks_like_program {
                programs.push(head.to_string());
            }
        }
    }

    let mut seen = Vec::with_capacity(programs.len());
    programs.retain(|p| {
        if seen.contains(p) {
            false
        } else {
            seen.push(p.clone());
            true
        }
    });
    programs
}
