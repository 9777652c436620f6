use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizeReport {
    pub report_version: String,
    pub generated_at: String,
    #[serde(default = "default_run_id")]
    pub run_id: String,
    pub root: String,
    pub excludes: Vec<String>,
    #[serde(default)]
    pub cluster: bool,
    #[serde(default)]
    pub scanned_files: u64,
    #[serde(default)]
    pub moved_files: u64,
    #[serde(default)]
    pub skipped_existing: u64,
    #[serde(default)]
    pub excluded_files: u64,
    #[serde(default)]
    pub catch_all_files: u64,
    #[serde(default)]
    pub categories_created: Vec<String>,
    #[serde(default)]
    pub clustered_files: u64,
    #[serde(default)]
    pub cluster_folders_created: u64,
    #[serde(default)]
    pub elapsed_ms: u64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncReport {
    pub report_version: String,
    pub generated_at: String,
    #[serde(default = "default_run_id")]
    pub run_id: String,
    pub root: String,
    pub backup_folder: String,
    pub backup_folder_id: String,
    #[serde(default)]
    pub skip_existing: bool,
    #[serde(default)]
    pub folders_created: u64,
    #[serde(default)]
    pub folders_reused: u64,
    #[serde(default)]
    pub ambiguous_lookups: u64,
    #[serde(default)]
    pub uploaded_files: u64,
    #[serde(default)]
    pub skipped_existing_files: u64,
    #[serde(default)]
    pub skipped_ledger_files: u64,
    #[serde(default)]
    pub elapsed_ms: u64,
    pub warnings: Vec<String>,
}

fn default_run_id() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoteNodeKind {
    Folder,
    File,
}

/// A folder or file object in the remote store. Identity is (name, parent),
/// not a stable path; duplicate names under one parent are possible.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteNode {
    pub id: String,
    pub name: String,
    pub kind: RemoteNodeKind,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Derived on demand from filesystem state; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub extension: Option<String>,
}

impl FileEntry {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()));
        Some(Self {
            path: path.to_path_buf(),
            name,
            extension,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::FileEntry;

    #[test]
    fn file_entry_lowercases_extension_with_leading_dot() {
        let entry = FileEntry::from_path(Path::new("/tmp/Report-Final.PDF")).expect("entry");
        assert_eq!(entry.name, "Report-Final.PDF");
        assert_eq!(entry.extension.as_deref(), Some(".pdf"));
    }

    #[test]
    fn file_entry_without_extension() {
        let entry = FileEntry::from_path(Path::new("/tmp/Makefile")).expect("entry");
        assert_eq!(entry.extension, None);
    }
}
