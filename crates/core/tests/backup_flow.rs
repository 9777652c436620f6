//! The two pipelines compose: organize locally, then mirror the result.

use std::fs;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;
use tidydesk_core::{
    run_organize, run_sync, CategoryTable, HeuristicTagger, OrganizeOptions, RemoteError,
    RemoteNode, RemoteNodeKind, RemoteStore, SyncOptions,
};

#[derive(Default)]
struct MemoryStore {
    nodes: Vec<RemoteNode>,
    next_id: u64,
}

impl MemoryStore {
    fn insert(&mut self, name: &str, kind: RemoteNodeKind, parent_id: Option<&str>) -> RemoteNode {
        self.next_id += 1;
        let node = RemoteNode {
            id: format!("id-{}", self.next_id),
            name: name.to_string(),
            kind,
            parent_id: parent_id.map(|parent| parent.to_string()),
        };
        self.nodes.push(node.clone());
        node
    }

    fn child_named(&self, name: &str, parent_id: Option<&str>) -> Option<&RemoteNode> {
        self.nodes
            .iter()
            .find(|node| node.name == name && node.parent_id.as_deref() == parent_id)
    }
}

impl RemoteStore for MemoryStore {
    fn list_folders(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Vec<RemoteNode>, RemoteError> {
        Ok(self
            .nodes
            .iter()
            .filter(|node| {
                node.kind == RemoteNodeKind::Folder
                    && node.name == name
                    && node.parent_id.as_deref() == parent_id
            })
            .cloned()
            .collect())
    }

    fn create_folder(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<RemoteNode, RemoteError> {
        Ok(self.insert(name, RemoteNodeKind::Folder, parent_id))
    }

    fn list_files(&mut self, name: &str, parent_id: &str) -> Result<Vec<RemoteNode>, RemoteError> {
        Ok(self
            .nodes
            .iter()
            .filter(|node| {
                node.kind == RemoteNodeKind::File
                    && node.name == name
                    && node.parent_id.as_deref() == Some(parent_id)
            })
            .cloned()
            .collect())
    }

    fn upload_file(
        &mut self,
        local_path: &Path,
        parent_id: &str,
    ) -> Result<RemoteNode, RemoteError> {
        let name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(self.insert(&name, RemoteNodeKind::File, Some(parent_id)))
    }
}

#[test]
fn organized_tree_mirrors_to_the_remote_store() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("report.pdf"), b"r")?;
    fs::write(temp.path().join("report-final.pdf"), b"f")?;
    fs::write(temp.path().join("photo.png"), b"p")?;

    let organize_options = OrganizeOptions {
        root: temp.path().to_path_buf(),
        ..OrganizeOptions::default()
    };
    run_organize(&organize_options, &CategoryTable::default(), &HeuristicTagger)?;

    let sync_options = SyncOptions {
        root: temp.path().to_path_buf(),
        retry_base_delay_ms: 1,
        ..SyncOptions::default()
    };
    let mut store = MemoryStore::default();
    let report = run_sync(&sync_options, &mut store)?;

    assert_eq!(report.uploaded_files, 3);
    assert!(report.warnings.is_empty());

    let backup = store
        .child_named("Desktop Backup", None)
        .expect("backup root")
        .clone();
    let documents = store
        .child_named("Documents", Some(&backup.id))
        .expect("Documents folder")
        .clone();
    let report_folder = store
        .child_named("Report", Some(&documents.id))
        .expect("Report cluster folder")
        .clone();
    assert!(store
        .child_named("report.pdf", Some(&report_folder.id))
        .is_some());
    assert!(store
        .child_named("report-final.pdf", Some(&report_folder.id))
        .is_some());

    let images = store
        .child_named("Images", Some(&backup.id))
        .expect("Images folder")
        .clone();
    assert!(store.child_named("photo.png", Some(&images.id)).is_some());

    // A second sync over the same tree uploads nothing new.
    let second = run_sync(&sync_options, &mut store)?;
    assert_eq!(second.uploaded_files, 0);
    assert_eq!(second.skipped_existing_files, 3);
    Ok(())
}
