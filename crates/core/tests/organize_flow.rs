use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;
use tidydesk_core::{run_organize, CategoryTable, HeuristicTagger, OrganizeOptions};

fn organize(root: &Path) -> Result<tidydesk_core::OrganizeReport> {
    let options = OrganizeOptions {
        root: root.to_path_buf(),
        ..OrganizeOptions::default()
    };
    run_organize(&options, &CategoryTable::default(), &HeuristicTagger)
}

fn tree_snapshot(root: &Path) -> BTreeSet<String> {
    fn walk(dir: &Path, root: &Path, out: &mut BTreeSet<String>) {
        for entry in fs::read_dir(dir).expect("read_dir") {
            let path = entry.expect("entry").path();
            let relative = path
                .strip_prefix(root)
                .expect("relative")
                .to_string_lossy()
                .to_string();
            out.insert(relative);
            if path.is_dir() {
                walk(&path, root, out);
            }
        }
    }
    let mut out = BTreeSet::new();
    walk(root, root, &mut out);
    out
}

#[test]
fn shared_keyword_pdfs_cluster_under_documents() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("report.pdf"), b"r")?;
    fs::write(temp.path().join("report-final.pdf"), b"f")?;
    fs::write(temp.path().join("photo.png"), b"p")?;

    let report = organize(temp.path())?;

    assert_eq!(report.moved_files, 3);
    assert_eq!(report.clustered_files, 2);
    assert!(temp.path().join("Documents/Report/report.pdf").exists());
    assert!(temp
        .path()
        .join("Documents/Report/report-final.pdf")
        .exists());
    assert!(temp.path().join("Images/photo.png").exists());
    assert!(report.warnings.is_empty());
    Ok(())
}

#[test]
fn single_file_stays_below_clustering_threshold() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("notes.txt"), b"n")?;

    let report = organize(temp.path())?;

    assert_eq!(report.moved_files, 1);
    assert_eq!(report.cluster_folders_created, 0);
    assert!(temp.path().join("Documents/notes.txt").exists());
    assert!(!temp.path().join("Documents/Notes").exists());
    Ok(())
}

#[test]
fn rerun_on_organized_tree_changes_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("report.pdf"), b"r")?;
    fs::write(temp.path().join("report-final.pdf"), b"f")?;
    fs::write(temp.path().join("photo.png"), b"p")?;

    organize(temp.path())?;
    let before = tree_snapshot(temp.path());

    let second = organize(temp.path())?;
    let after = tree_snapshot(temp.path());

    assert_eq!(before, after, "second run must not reshape the tree");
    assert_eq!(second.moved_files, 0);
    assert_eq!(second.clustered_files, 0);
    assert_eq!(second.cluster_folders_created, 0);
    assert!(second.categories_created.is_empty());
    assert!(second.warnings.is_empty());
    Ok(())
}

#[test]
fn new_files_join_existing_clusters_on_rerun() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("report.pdf"), b"r")?;
    fs::write(temp.path().join("report-final.pdf"), b"f")?;
    organize(temp.path())?;

    fs::write(temp.path().join("report-draft.pdf"), b"d")?;
    let report = organize(temp.path())?;

    assert_eq!(report.moved_files, 1);
    // The newcomer is alone in Documents/, below the clustering threshold,
    // so it waits there until another "report" file shows up.
    assert!(temp.path().join("Documents/report-draft.pdf").exists());
    assert!(temp.path().join("Documents/Report/report.pdf").exists());
    Ok(())
}

#[test]
fn disabling_clustering_leaves_category_folders_flat() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("report.pdf"), b"r")?;
    fs::write(temp.path().join("report-final.pdf"), b"f")?;

    let options = OrganizeOptions {
        root: temp.path().to_path_buf(),
        cluster: false,
        ..OrganizeOptions::default()
    };
    let report = run_organize(&options, &CategoryTable::default(), &HeuristicTagger)?;

    assert_eq!(report.moved_files, 2);
    assert_eq!(report.clustered_files, 0);
    assert_eq!(report.cluster_folders_created, 0);
    assert!(temp.path().join("Documents/report.pdf").exists());
    assert!(temp.path().join("Documents/report-final.pdf").exists());
    assert!(!temp.path().join("Documents/Report").exists());
    Ok(())
}

#[test]
fn catch_all_files_are_clustered_too() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("backup-monday.xyz"), b"1")?;
    fs::write(temp.path().join("backup-friday.xyz"), b"2")?;

    let report = organize(temp.path())?;

    assert_eq!(report.catch_all_files, 2);
    assert!(temp.path().join("Other/Backup/backup-monday.xyz").exists());
    assert!(temp.path().join("Other/Backup/backup-friday.xyz").exists());
    Ok(())
}
