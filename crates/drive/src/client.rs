use std::fs;
use std::path::Path;

use reqwest::blocking::{multipart, Client, Response};
use serde::Deserialize;
use tidydesk_core::{RemoteError, RemoteNode, RemoteNodeKind, RemoteStore};
use tracing::debug;

use crate::session::SessionProvider;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const FILE_FIELDS: &str = "id,name,mimeType,parents";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    #[serde(default)]
    parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Blocking Drive v3 client. Lookup uses `files.list` with an exact-name
/// `q` filter scoped to a parent; uploads go through the multipart endpoint.
pub struct DriveClient<S: SessionProvider> {
    http: Client,
    session: S,
}

impl<S: SessionProvider> DriveClient<S> {
    pub fn new(session: S) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .build()
            .map_err(|err| RemoteError::api("http client init", err.to_string()))?;
        Ok(Self { http, session })
    }

    fn list(&mut self, query: &str, operation: &str) -> Result<Vec<RemoteNode>, RemoteError> {
        let token = self.session.access_token()?;
        debug!("{operation}: q={query}");
        let response = self
            .http
            .get(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("spaces", "drive"),
                ("fields", &format!("files({FILE_FIELDS})")),
            ])
            .send()
            .map_err(|err| RemoteError::transient(operation, err.to_string()))?;
        let response = check_status(operation, response)?;
        let payload: FileListResponse = response
            .json()
            .map_err(|err| RemoteError::api(operation, format!("invalid response: {err}")))?;
        Ok(payload.files.into_iter().map(to_node).collect())
    }
}

impl<S: SessionProvider> RemoteStore for DriveClient<S> {
    fn list_folders(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Vec<RemoteNode>, RemoteError> {
        let mut query = format!(
            "name = '{}' and mimeType = '{FOLDER_MIME_TYPE}' and trashed = false",
            escape_query_value(name)
        );
        if let Some(parent) = parent_id {
            query.push_str(&format!(" and '{}' in parents", escape_query_value(parent)));
        }
        self.list(&query, "folder lookup")
    }

    fn create_folder(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<RemoteNode, RemoteError> {
        let operation = "folder create";
        let token = self.session.access_token()?;
        let mut body = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
        });
        if let Some(parent) = parent_id {
            body["parents"] = serde_json::json!([parent]);
        }
        let response = self
            .http
            .post(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(token)
            .query(&[("fields", FILE_FIELDS)])
            .json(&body)
            .send()
            .map_err(|err| RemoteError::transient(operation, err.to_string()))?;
        let response = check_status(operation, response)?;
        let created: DriveFile = response
            .json()
            .map_err(|err| RemoteError::api(operation, format!("invalid response: {err}")))?;
        Ok(to_node(created))
    }

    fn list_files(&mut self, name: &str, parent_id: &str) -> Result<Vec<RemoteNode>, RemoteError> {
        let query = format!(
            "name = '{}' and mimeType != '{FOLDER_MIME_TYPE}' and '{}' in parents and trashed = false",
            escape_query_value(name),
            escape_query_value(parent_id)
        );
        self.list(&query, "file lookup")
    }

    fn upload_file(
        &mut self,
        local_path: &Path,
        parent_id: &str,
    ) -> Result<RemoteNode, RemoteError> {
        let operation = "upload";
        let name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                RemoteError::api(operation, format!("unusable file name: {}", local_path.display()))
            })?
            .to_string();
        let bytes = fs::read(local_path).map_err(|err| {
            RemoteError::api(operation, format!("cannot read {}: {err}", local_path.display()))
        })?;

        let token = self.session.access_token()?;
        let metadata = serde_json::json!({
            "name": name,
            "parents": [parent_id],
        })
        .to_string();
        let form = multipart::Form::new()
            .part(
                "metadata",
                multipart::Part::text(metadata)
                    .mime_str("application/json")
                    .map_err(|err| RemoteError::api(operation, err.to_string()))?,
            )
            .part("file", multipart::Part::bytes(bytes).file_name(name));

        let response = self
            .http
            .post(format!("{DRIVE_UPLOAD_BASE}/files"))
            .bearer_auth(token)
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .multipart(form)
            .send()
            .map_err(|err| RemoteError::transient(operation, err.to_string()))?;
        let response = check_status(operation, response)?;
        let uploaded: DriveFile = response
            .json()
            .map_err(|err| RemoteError::api(operation, format!("invalid response: {err}")))?;
        Ok(to_node(uploaded))
    }
}

fn to_node(file: DriveFile) -> RemoteNode {
    let kind = if file.mime_type == FOLDER_MIME_TYPE {
        RemoteNodeKind::Folder
    } else {
        RemoteNodeKind::File
    };
    RemoteNode {
        id: file.id,
        name: file.name,
        kind,
        parent_id: file.parents.into_iter().next(),
    }
}

fn check_status(operation: &str, response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(status_error(operation, status.as_u16(), &body))
}

// 401 means the session is unusable; 403 and 429 are how Drive reports rate
// limiting, so they stay retryable along with server errors.
fn status_error(operation: &str, code: u16, body: &str) -> RemoteError {
    let snippet: String = body.chars().take(200).collect();
    match code {
        401 => RemoteError::Auth(format!("HTTP 401: {snippet}")),
        403 | 429 => RemoteError::transient(operation, format!("HTTP {code}: {snippet}")),
        500..=599 => RemoteError::transient(operation, format!("HTTP {code}: {snippet}")),
        _ => RemoteError::api(operation, format!("HTTP {code}: {snippet}")),
    }
}

/// Drive `q` string literals escape backslashes and single quotes.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
