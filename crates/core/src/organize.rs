use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::info;
use uuid::Uuid;

use crate::classify::CategoryTable;
use crate::cluster::cluster_by_keyword;
use crate::fsops::{ensure_directory, move_into, MoveOutcome};
use crate::keywords::KeywordTagger;
use crate::model::{FileEntry, OrganizeReport, REPORT_VERSION};

#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub root: PathBuf,
    pub excludes: Vec<String>,
    pub cluster: bool,
    pub run_id: Option<String>,
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            excludes: Vec::new(),
            cluster: true,
            run_id: None,
            cancel_flag: None,
        }
    }
}

/// Moves the root's top-level files into category folders, then clusters
/// every category folder by keyword. Per-file failures become warnings and
/// leave the file where it is; the run itself only fails when the root
/// cannot be listed at all.
///
/// Re-running on an organized root is a no-op: every destination that
/// already holds a same-named file is skipped, never overwritten.
pub fn run_organize(
    options: &OrganizeOptions,
    table: &CategoryTable,
    tagger: &dyn KeywordTagger,
) -> Result<OrganizeReport> {
    if !options.root.is_dir() {
        return Err(anyhow!(
            "organize root is not a directory: {}",
            options.root.display()
        ));
    }

    let started = Instant::now();
    let run_id = options
        .run_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut warnings = Vec::new();
    let excludes = ExcludeMatcher::new(&options.excludes, &mut warnings);

    let mut report = OrganizeReport {
        report_version: REPORT_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        run_id: run_id.clone(),
        root: options.root.to_string_lossy().to_string(),
        excludes: options.excludes.clone(),
        cluster: options.cluster,
        scanned_files: 0,
        moved_files: 0,
        skipped_existing: 0,
        excluded_files: 0,
        catch_all_files: 0,
        categories_created: Vec::new(),
        clustered_files: 0,
        cluster_folders_created: 0,
        elapsed_ms: 0,
        warnings: Vec::new(),
    };

    info!(run_id = %run_id, root = %options.root.display(), "organize started");

    // Only the root's own files are classified; anything already inside a
    // category folder belongs to the clustering pass below.
    for path in list_files(&options.root, &mut warnings)? {
        if is_cancelled(options.cancel_flag.as_ref()) {
            warnings.push("organize canceled by caller; remaining files untouched".to_string());
            break;
        }

        let Some(entry) = FileEntry::from_path(&path) else {
            warnings.push(format!("skipping non-unicode file name: {}", path.display()));
            continue;
        };
        if excludes.is_excluded(&path) {
            report.excluded_files += 1;
            continue;
        }

        report.scanned_files += 1;
        let category = table.classify(&entry.name);
        if category == table.catch_all() {
            report.catch_all_files += 1;
        }

        let dest_dir = options.root.join(category);
        match ensure_directory(&dest_dir) {
            Ok(created) => {
                if created {
                    report.categories_created.push(category.to_string());
                }
            }
            Err(err) => {
                warnings.push(err.to_string());
                continue;
            }
        }

        match move_into(&entry.path, &dest_dir) {
            Ok(MoveOutcome::Moved) => report.moved_files += 1,
            Ok(MoveOutcome::SkippedExists) => report.skipped_existing += 1,
            Err(err) => warnings.push(err.to_string()),
        }
    }

    if options.cluster {
        // Every category folder present under the root gets a clustering
        // pass, whether or not anything moved there this run.
        for category in table.category_names() {
            if is_cancelled(options.cancel_flag.as_ref()) {
                warnings.push("organize canceled during clustering".to_string());
                break;
            }
            let dir = options.root.join(category);
            if !dir.is_dir() {
                continue;
            }
            match cluster_by_keyword(&dir, tagger, &mut warnings) {
                Ok(outcome) => {
                    report.clustered_files += outcome.clustered_files;
                    report.cluster_folders_created += outcome.folders_created;
                }
                Err(err) => warnings.push(format!("clustering failed for {category}: {err}")),
            }
        }
    }

    report.elapsed_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
    report.warnings = warnings;
    info!(
        run_id = %run_id,
        moved = report.moved_files,
        skipped = report.skipped_existing,
        clustered = report.clustered_files,
        "organize finished"
    );
    Ok(report)
}

fn list_files(root: &Path, warnings: &mut Vec<String>) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(root).with_context(|| format!("failed to list {}", root.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warnings.push(format!("listing error under {}: {}", root.display(), err));
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_cancelled(flag: Option<&Arc<AtomicBool>>) -> bool {
    flag.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

struct ExcludeMatcher {
    globset: Option<GlobSet>,
    substrings: Vec<String>,
}

impl ExcludeMatcher {
    fn new(patterns: &[String], warnings: &mut Vec<String>) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut substrings = Vec::new();
        for pattern in patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    warnings.push(format!(
                        "invalid exclude glob '{pattern}': {err}; using substring fallback."
                    ));
                    substrings.push(pattern.to_lowercase());
                }
            }
        }
        let globset = match builder.build() {
            Ok(set) => Some(set),
            Err(err) => {
                warnings.push(format!(
                    "failed to compile exclude glob set: {err}; glob excludes disabled."
                ));
                None
            }
        };
        Self { globset, substrings }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if let Some(globset) = &self.globset {
            if globset.is_match(path) {
                return true;
            }
        }
        if self.substrings.is_empty() {
            return false;
        }
        let lowered = path.to_string_lossy().to_lowercase();
        self.substrings
            .iter()
            .any(|pattern| lowered.contains(pattern))
    }
}
