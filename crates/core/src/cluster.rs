use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::fsops::{ensure_directory, move_into, MoveOutcome};
use crate::keywords::{first_keyword, KeywordTagger};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClusterOutcome {
    pub clustered_files: u64,
    pub folders_created: u64,
}

/// Groups the files directly inside `directory` by the first keyword of each
/// file name; keywords shared by two or more files get a capitalized
/// subfolder and the files move into it. Singleton keywords are left alone.
///
/// The scan is non-recursive, so files that already moved into a keyword
/// subfolder are not seen again; a second pass over an already-clustered
/// directory finds nothing further to do.
pub fn cluster_by_keyword(
    directory: &Path,
    tagger: &dyn KeywordTagger,
    warnings: &mut Vec<String>,
) -> Result<ClusterOutcome> {
    let mut outcome = ClusterOutcome::default();

    let entries = fs::read_dir(directory)
        .with_context(|| format!("failed to list {}", directory.display()))?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warnings.push(format!("listing error under {}: {}", directory.display(), err));
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    // Keyword index for this directory only; discarded after the pass.
    let mut index: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in files {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        // One cluster membership per file: only the first keyword counts.
        if let Some(keyword) = first_keyword(tagger, name, warnings) {
            index.entry(keyword).or_default().push(path);
        }
    }

    for (keyword, members) in index {
        if members.len() < 2 {
            debug!("keyword '{keyword}' has a single file; not clustering");
            continue;
        }

        let keyword_dir = directory.join(capitalize(&keyword));
        match ensure_directory(&keyword_dir) {
            Ok(created) => {
                if created {
                    outcome.folders_created += 1;
                }
            }
            Err(err) => {
                warnings.push(err.to_string());
                continue;
            }
        }

        for member in members {
            match move_into(&member, &keyword_dir) {
                Ok(MoveOutcome::Moved) => outcome.clustered_files += 1,
                Ok(MoveOutcome::SkippedExists) => {}
                Err(err) => warnings.push(err.to_string()),
            }
        }
    }

    Ok(outcome)
}

fn capitalize(keyword: &str) -> String {
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
