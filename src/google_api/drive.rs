//! Google Drive API v3, one named JSON file.
//!
//! The file is found by name (`trashed=false`). Uploads update it in place
//! when it exists and create it otherwise.

use serde::Deserialize;

use super::{send_checked, GoogleApiError};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Drive query for a non-trashed file with this exact name.
fn name_query(name: &str) -> String {
    format!("name='{}' and trashed=false", name.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Find the first file named `name`.
pub async fn find_file(
    client: &reqwest::Client,
    access_token: &str,
    name: &str,
) -> Result<Option<DriveFile>, GoogleApiError> {
    let query = name_query(name);
    let request = client
        .get(FILES_URL)
        .bearer_auth(access_token)
        .query(&[
            ("q", query.as_str()),
            ("spaces", "drive"),
            ("fields", "files(id, name)"),
        ]);
    let resp = send_checked(request).await?;
    let body: FileListResponse = resp.json().await?;
    Ok(body.files.into_iter().next())
}

/// Create `name` with `content`, or replace the content of the existing file.
/// Returns the file id.
pub async fn upload_json(
    client: &reqwest::Client,
    access_token: &str,
    name: &str,
    content: Vec<u8>,
) -> Result<String, GoogleApiError> {
    match find_file(client, access_token, name).await? {
        Some(file) => {
            let request = client
                .patch(format!("{}/{}", UPLOAD_URL, file.id))
                .bearer_auth(access_token)
                .query(&[("uploadType", "media")])
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(content);
            send_checked(request).await?;
            log::info!("Updated {} on Google Drive (File ID: {})", name, file.id);
            Ok(file.id)
        }
        None => {
            let metadata = serde_json::json!({ "name": name }).to_string();
            let form = reqwest::multipart::Form::new()
                .part(
                    "metadata",
                    reqwest::multipart::Part::text(metadata)
                        .mime_str("application/json; charset=UTF-8")?,
                )
                .part(
                    "media",
                    reqwest::multipart::Part::bytes(content).mime_str("application/json")?,
                );
            let request = client
                .post(UPLOAD_URL)
                .bearer_auth(access_token)
                .query(&[("uploadType", "multipart"), ("fields", "id")])
                .multipart(form);
            let resp = send_checked(request).await?;
            let created: DriveFile = resp.json().await?;
            log::info!("Uploaded {} to Google Drive (File ID: {})", name, created.id);
            Ok(created.id)
        }
    }
}

/// Download the content of `name`, if it exists.
pub async fn download(
    client: &reqwest::Client,
    access_token: &str,
    name: &str,
) -> Result<Option<Vec<u8>>, GoogleApiError> {
    let Some(file) = find_file(client, access_token, name).await? else {
        log::info!("No {} found on Google Drive", name);
        return Ok(None);
    };
    let request = client
        .get(format!("{}/{}", FILES_URL, file.id))
        .bearer_auth(access_token)
        .query(&[("alt", "media")]);
    let resp = send_checked(request).await?;
    let bytes = resp.bytes().await?;
    log::info!("Downloaded {} from Google Drive (File ID: {})", name, file.id);
    Ok(Some(bytes.to_vec()))
}
