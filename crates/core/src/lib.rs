pub mod classify;
pub mod cluster;
pub mod doctor;
pub mod error;
pub mod fsops;
pub mod keywords;
pub mod model;
pub mod organize;
pub mod sync;

pub use classify::{CategoryRule, CategoryTable, CATCH_ALL_CATEGORY};
pub use cluster::{cluster_by_keyword, ClusterOutcome};
pub use doctor::{collect_doctor_info, default_root, DoctorInfo};
pub use error::{KeywordExtractionError, MoveError, RemoteError};
pub use fsops::MoveOutcome;
pub use keywords::{first_keyword, HeuristicTagger, KeywordTagger};
pub use model::{
    FileEntry, OrganizeReport, RemoteNode, RemoteNodeKind, SyncReport, REPORT_VERSION,
};
pub use organize::{run_organize, OrganizeOptions};
pub use sync::{run_sync, RemoteStore, SyncOptions, DEFAULT_BACKUP_FOLDER};
