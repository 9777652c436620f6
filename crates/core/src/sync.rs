use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RemoteError;
use crate::model::{RemoteNode, SyncReport, REPORT_VERSION};

pub const DEFAULT_BACKUP_FOLDER: &str = "Desktop Backup";

/// The interface the synchronizer needs from a remote store. Lookup is by
/// name scoped to a parent id; the store may legitimately return several
/// nodes for one (name, parent) pair.
pub trait RemoteStore {
    fn list_folders(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Vec<RemoteNode>, RemoteError>;

    fn create_folder(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<RemoteNode, RemoteError>;

    fn list_files(&mut self, name: &str, parent_id: &str) -> Result<Vec<RemoteNode>, RemoteError>;

    fn upload_file(
        &mut self,
        local_path: &Path,
        parent_id: &str,
    ) -> Result<RemoteNode, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub root: PathBuf,
    pub backup_folder: String,
    /// Query the remote by (name, parent) before uploading and skip files
    /// already present. `false` preserves the re-upload-every-run variant.
    pub skip_existing: bool,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub run_id: Option<String>,
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            backup_folder: DEFAULT_BACKUP_FOLDER.to_string(),
            skip_existing: true,
            max_attempts: 3,
            retry_base_delay_ms: 500,
            run_id: None,
            cancel_flag: None,
        }
    }
}

#[derive(Debug, Default)]
struct SyncCounters {
    folders_created: u64,
    folders_reused: u64,
    ambiguous_lookups: u64,
    uploaded_files: u64,
    skipped_existing_files: u64,
    skipped_ledger_files: u64,
}

#[derive(Debug, Default)]
struct SyncState {
    counters: SyncCounters,
    /// Local paths uploaded during this run; guards against a file being
    /// encountered twice in one traversal. Not persisted across runs.
    ledger: HashSet<PathBuf>,
    /// Canonicalized directories already mirrored; breaks symlink cycles.
    visited_dirs: HashSet<PathBuf>,
    /// (parent id, name) -> folder id, so one run never looks a folder up
    /// twice or races itself into a duplicate create.
    folder_cache: HashMap<(String, String), String>,
    warnings: Vec<String>,
}

/// Mirrors the local tree under `options.root` into the remote store.
///
/// A folder's remote counterpart is fully resolved before anything beneath
/// it is touched. Failures resolving one subfolder skip that branch only;
/// failures uploading one file skip that file only. Authentication failure
/// is fatal to the whole run.
pub fn run_sync(options: &SyncOptions, store: &mut dyn RemoteStore) -> Result<SyncReport> {
    if !options.root.is_dir() {
        return Err(anyhow!(
            "sync root is not a directory: {}",
            options.root.display()
        ));
    }
    if options.max_attempts == 0 {
        return Err(anyhow!("max_attempts must be greater than zero"));
    }
    if options.backup_folder.trim().is_empty() {
        return Err(anyhow!("backup folder name must not be empty"));
    }

    let started = Instant::now();
    let run_id = options
        .run_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut state = SyncState::default();

    info!(run_id = %run_id, root = %options.root.display(), "sync started");

    let backup_folder_id =
        resolve_or_create_folder(store, options, &options.backup_folder, None, &mut state)?;
    sync_directory(
        store,
        options,
        &options.root,
        &backup_folder_id,
        &mut state,
    )?;

    if is_cancelled(options.cancel_flag.as_ref()) {
        state
            .warnings
            .push("sync canceled by caller; remote tree may be partial".to_string());
    }

    let report = SyncReport {
        report_version: REPORT_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        run_id: run_id.clone(),
        root: options.root.to_string_lossy().to_string(),
        backup_folder: options.backup_folder.clone(),
        backup_folder_id,
        skip_existing: options.skip_existing,
        folders_created: state.counters.folders_created,
        folders_reused: state.counters.folders_reused,
        ambiguous_lookups: state.counters.ambiguous_lookups,
        uploaded_files: state.counters.uploaded_files,
        skipped_existing_files: state.counters.skipped_existing_files,
        skipped_ledger_files: state.counters.skipped_ledger_files,
        elapsed_ms: started.elapsed().as_millis().try_into().unwrap_or(u64::MAX),
        warnings: state.warnings,
    };
    info!(
        run_id = %run_id,
        uploaded = report.uploaded_files,
        folders_created = report.folders_created,
        "sync finished"
    );
    Ok(report)
}

fn sync_directory(
    store: &mut dyn RemoteStore,
    options: &SyncOptions,
    local_dir: &Path,
    parent_id: &str,
    state: &mut SyncState,
) -> Result<(), RemoteError> {
    let canonical = fs::canonicalize(local_dir).unwrap_or_else(|_| local_dir.to_path_buf());
    if !state.visited_dirs.insert(canonical) {
        state.warnings.push(format!(
            "directory visited twice (cycle?): {}",
            local_dir.display()
        ));
        return Ok(());
    }

    let entries = match fs::read_dir(local_dir) {
        Ok(entries) => entries,
        Err(err) => {
            state
                .warnings
                .push(format!("failed to list {}: {}", local_dir.display(), err));
            return Ok(());
        }
    };
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(err) => state
                .warnings
                .push(format!("listing error under {}: {}", local_dir.display(), err)),
        }
    }
    paths.sort();

    for path in paths {
        if is_cancelled(options.cancel_flag.as_ref()) {
            return Ok(());
        }

        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            state
                .warnings
                .push(format!("skipping non-unicode name: {}", path.display()));
            continue;
        };

        if path.is_dir() {
            // Resolve the remote folder before descending so every upload
            // below it already has a parent id.
            match resolve_or_create_folder(store, options, name, Some(parent_id), state) {
                Ok(folder_id) => sync_directory(store, options, &path, &folder_id, state)?,
                Err(err @ RemoteError::Auth(_)) => return Err(err),
                Err(err) => state
                    .warnings
                    .push(format!("skipping branch {}: {}", path.display(), err)),
            }
        } else if path.is_file() {
            sync_file(store, options, &path, name, parent_id, state)?;
        }
    }

    Ok(())
}

fn sync_file(
    store: &mut dyn RemoteStore,
    options: &SyncOptions,
    path: &Path,
    name: &str,
    parent_id: &str,
    state: &mut SyncState,
) -> Result<(), RemoteError> {
    let ledger_key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if state.ledger.contains(&ledger_key) {
        state.counters.skipped_ledger_files += 1;
        return Ok(());
    }

    if options.skip_existing {
        match with_retry(store, options, "file lookup", |store| {
            store.list_files(name, parent_id)
        }) {
            Ok(existing) if !existing.is_empty() => {
                state.counters.skipped_existing_files += 1;
                state.ledger.insert(ledger_key);
                return Ok(());
            }
            Ok(_) => {}
            Err(err @ RemoteError::Auth(_)) => return Err(err),
            Err(err) => {
                // Uploading blind here could duplicate the file; skip it.
                state
                    .warnings
                    .push(format!("skipping {}: {}", path.display(), err));
                return Ok(());
            }
        }
    }

    match with_retry(store, options, "upload", |store| {
        store.upload_file(path, parent_id)
    }) {
        Ok(node) => {
            info!("uploaded {} as {}", path.display(), node.id);
            state.counters.uploaded_files += 1;
            state.ledger.insert(ledger_key);
        }
        Err(err @ RemoteError::Auth(_)) => return Err(err),
        Err(err) => state
            .warnings
            .push(format!("upload failed for {}: {}", path.display(), err)),
    }
    Ok(())
}

fn resolve_or_create_folder(
    store: &mut dyn RemoteStore,
    options: &SyncOptions,
    name: &str,
    parent_id: Option<&str>,
    state: &mut SyncState,
) -> Result<String, RemoteError> {
    let cache_key = (parent_id.unwrap_or("").to_string(), name.to_string());
    if let Some(id) = state.folder_cache.get(&cache_key) {
        return Ok(id.clone());
    }

    let matches = with_retry(store, options, "folder lookup", |store| {
        store.list_folders(name, parent_id)
    })?;

    let id = match matches.len() {
        0 => {
            let node = with_retry(store, options, "folder create", |store| {
                store.create_folder(name, parent_id)
            })?;
            state.counters.folders_created += 1;
            node.id
        }
        1 => {
            state.counters.folders_reused += 1;
            matches[0].id.clone()
        }
        count => {
            // Name-based addressing is ambiguous here; report it rather
            // than hiding the pick.
            state.counters.ambiguous_lookups += 1;
            state.warnings.push(format!(
                "{count} remote folders named '{name}' under the same parent; using {}",
                matches[0].id
            ));
            state.counters.folders_reused += 1;
            matches[0].id.clone()
        }
    };

    state.folder_cache.insert(cache_key, id.clone());
    Ok(id)
}

fn with_retry<T>(
    store: &mut dyn RemoteStore,
    options: &SyncOptions,
    operation: &str,
    mut call: impl FnMut(&mut dyn RemoteStore) -> Result<T, RemoteError>,
) -> Result<T, RemoteError> {
    let mut attempt = 0;
    loop {
        match call(store) {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < options.max_attempts => {
                let delay_ms = options
                    .retry_base_delay_ms
                    .saturating_mul(1_u64 << attempt.min(16));
                warn!(
                    "{operation} failed (attempt {}): {err}; retrying in {delay_ms}ms",
                    attempt + 1
                );
                thread::sleep(Duration::from_millis(delay_ms));
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_cancelled(flag: Option<&Arc<AtomicBool>>) -> bool {
    flag.is_some_and(|flag| flag.load(Ordering::Relaxed))
}
