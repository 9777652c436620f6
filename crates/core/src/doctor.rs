use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::CategoryTable;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorInfo {
    pub os: String,
    pub arch: String,
    pub current_dir: Option<String>,
    pub root: String,
    pub root_exists: bool,
    pub categories: Vec<String>,
    pub catch_all: String,
    pub token_file: Option<String>,
    pub token_file_exists: bool,
    pub notes: Vec<String>,
}

pub fn default_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Desktop")
}

pub fn collect_doctor_info(
    root: &Path,
    table: &CategoryTable,
    token_file: Option<&Path>,
) -> DoctorInfo {
    let current_dir = env::current_dir()
        .ok()
        .map(|path| path.to_string_lossy().to_string());
    let root_exists = root.is_dir();
    let token_file_exists = token_file.is_some_and(|path| path.is_file());

    let mut notes = vec![
        "Organize never overwrites: files whose destination already exists are left in place."
            .to_string(),
        "Sync queries the remote by name before uploading, so re-runs skip files already present (unless --reupload-existing is set)."
            .to_string(),
    ];
    if !root_exists {
        notes.push(format!(
            "root {} does not exist; pass --root to point at a real directory.",
            root.display()
        ));
    }
    if token_file.is_some() && !token_file_exists {
        notes.push("token file missing; sync will fail until a session is available.".to_string());
    }

    DoctorInfo {
        os: env::consts::OS.to_string(),
        arch: env::consts::ARCH.to_string(),
        current_dir,
        root: root.to_string_lossy().to_string(),
        root_exists,
        categories: table
            .category_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect(),
        catch_all: table.catch_all().to_string(),
        token_file: token_file.map(|path| path.to_string_lossy().to_string()),
        token_file_exists,
        notes,
    }
}
