//! Google Drive API client: listing, folder resolution, uploads and sharing.

use std::path::Path;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

use crate::auth::Authenticator;
use crate::client::{check_response, parse_json};
use crate::error::{GoogleError, Result};
use crate::folders::{children_query, folder_query, name_query, parse_folder_path};
use crate::models::{
    About, CreateFileRequest, CreatedFile, FileListResponse, FileMetadata, Permission,
    PermissionResult, Role, FOLDER_MIME_TYPE,
};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Upload URL for Google Drive API.
const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Alias Drive accepts for the caller's My Drive root folder.
pub const ROOT_FOLDER_ID: &str = "root";

const FILE_FIELDS: &str = "id, name, size, mimeType, webViewLink, webContentLink, parents";

/// Where and how a local file is uploaded.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Slash-separated folder path below the root; folders are created as needed.
    pub folder_path: Option<String>,
    /// Explicit destination folder ID. Takes precedence over `folder_path`.
    pub parent_id: Option<String>,
    /// Name to give the remote file instead of the local file name.
    pub file_name: Option<String>,
    /// Grant "anyone with the link can view" after upload.
    pub make_public: bool,
    /// Emails granted writer access after upload.
    pub share_with: Vec<String>,
    /// Delete a same-named file in the destination folder first.
    pub replace_existing: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            folder_path: None,
            parent_id: None,
            file_name: None,
            make_public: true,
            share_with: Vec::new(),
            replace_existing: false,
        }
    }
}

impl UploadOptions {
    pub fn to_folder_path(path: impl Into<String>) -> Self {
        Self {
            folder_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn to_parent(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            ..Self::default()
        }
    }

    pub fn private(mut self) -> Self {
        self.make_public = false;
        self
    }
}

/// Client for Google Drive, optionally scoped to a Shared Drive.
pub struct DriveClient {
    drive_id: Option<String>,
    auth: Authenticator,
    http: Client,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    /// Create a new DriveClient.
    ///
    /// # Arguments
    /// * `auth` - Authenticator for obtaining access tokens
    /// * `drive_id` - Shared Drive to operate in, or `None` for My Drive
    pub fn new(auth: Authenticator, drive_id: Option<String>) -> Self {
        Self {
            drive_id,
            auth,
            http: Client::new(),
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: UPLOAD_API_BASE.to_string(),
        }
    }

    /// Point the client at different API endpoints (emulators, test servers).
    pub fn with_base_urls(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    pub fn drive_id(&self) -> Option<&str> {
        self.drive_id.as_deref()
    }

    /// ID folder paths are resolved from: the Shared Drive itself or My Drive's root.
    pub fn root_id(&self) -> &str {
        self.drive_id.as_deref().unwrap_or(ROOT_FOLDER_ID)
    }

    /// List all files in a folder.
    pub async fn list_files(&self, parent_id: &str) -> Result<Vec<FileMetadata>> {
        self.query_files(&children_query(parent_id)).await
    }

    /// Query files using Google Drive query syntax, following every result page.
    #[instrument(skip(self), level = "info")]
    pub async fn query_files(&self, query: &str) -> Result<Vec<FileMetadata>> {
        let token = self.auth.get_access_token().await?;
        let fields = format!("nextPageToken, files({})", FILE_FIELDS);
        let mut all_files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/files", self.api_base))
                .bearer_auth(&token)
                .query(&[
                    ("q", query),
                    ("includeItemsFromAllDrives", "true"),
                    ("supportsAllDrives", "true"),
                    ("spaces", "drive"),
                    ("fields", fields.as_str()),
                ]);

            if let Some(drive_id) = &self.drive_id {
                request = request.query(&[("corpora", "drive"), ("driveId", drive_id.as_str())]);
            }
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let list_response: FileListResponse = parse_json(request.send().await?).await?;
            all_files.extend(list_response.files);

            match list_response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_files)
    }

    /// Find a non-trashed folder named `name` directly under `parent_id`.
    pub async fn find_folder(&self, name: &str, parent_id: &str) -> Result<Option<FileMetadata>> {
        let folders = self.query_files(&folder_query(name, parent_id)).await?;
        Ok(folders.into_iter().next())
    }

    /// Find a file by name in a folder.
    pub async fn find_file(&self, name: &str, parent_id: &str) -> Result<Option<FileMetadata>> {
        let files = self.query_files(&name_query(name, parent_id)).await?;
        Ok(files.into_iter().last())
    }

    /// Create a folder under `parent_id` and return its ID.
    #[instrument(skip(self), level = "info")]
    pub async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let token = self.auth.get_access_token().await?;
        let body = CreateFileRequest {
            name,
            mime_type: FOLDER_MIME_TYPE,
            parents: vec![parent_id],
        };

        let response = self
            .http
            .post(format!("{}/files", self.api_base))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true"), ("fields", "id")])
            .json(&body)
            .send()
            .await?;

        let created: CreatedFile = parse_json(response).await?;
        let id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GoogleError::FolderCreationFailed(name.to_string()))?;

        info!(folder = name, parent = parent_id, id = %id, "created folder");
        Ok(id)
    }

    /// Resolve a slash-separated folder path to a folder ID, creating missing folders.
    ///
    /// An empty path resolves to [`root_id`](Self::root_id) without any remote call.
    /// Lookup and creation are separate calls, so two concurrent resolutions of the
    /// same new segment can each create a folder with that name.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve_folder_path(&self, path: &str) -> Result<String> {
        let mut parent_id = self.root_id().to_string();

        for segment in parse_folder_path(path) {
            parent_id = match self.find_folder(&segment, &parent_id).await? {
                Some(existing) => {
                    debug!(folder = %segment, id = %existing.id, "found existing folder");
                    existing.id
                }
                None => {
                    debug!(folder = %segment, parent = %parent_id, "folder missing, creating");
                    self.create_folder(&segment, &parent_id).await?
                }
            };
        }

        Ok(parent_id)
    }

    /// Get file metadata by ID.
    pub async fn get_file(&self, file_id: &str) -> Result<FileMetadata> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true"), ("fields", FILE_FIELDS)])
            .send()
            .await?;

        parse_json(response).await
    }

    /// Delete a file by ID. Deleting a file that no longer exists succeeds.
    #[instrument(skip(self), level = "info")]
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .delete(format!("{}/files/{}", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(());
        }
        check_response(response).await?;
        Ok(())
    }

    /// Upload a local file, streaming its contents.
    ///
    /// The destination folder comes from `options.parent_id` or, failing that,
    /// `options.folder_path` resolved with [`resolve_folder_path`](Self::resolve_folder_path).
    /// Uploaded files are shared publicly unless `options.make_public` is cleared.
    #[instrument(skip(self, local_path), level = "info")]
    pub async fn upload_file<P: AsRef<Path>>(
        &self,
        local_path: P,
        options: &UploadOptions,
    ) -> Result<FileMetadata> {
        let local_path = local_path.as_ref();
        let not_found = || GoogleError::LocalFileNotFound(local_path.display().to_string());

        let file_size = match tokio::fs::metadata(local_path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(not_found()),
        };

        let filename = match &options.file_name {
            Some(name) => name.clone(),
            None => local_path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(not_found)?,
        };

        let parent_id = match &options.parent_id {
            Some(id) => id.clone(),
            None => {
                self.resolve_folder_path(options.folder_path.as_deref().unwrap_or(""))
                    .await?
            }
        };

        if options.replace_existing {
            if let Some(existing) = self.find_file(&filename, &parent_id).await? {
                self.delete_file(&existing.id).await?;
            }
        }

        let mime_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();
        let metadata = self
            .upload_multipart(local_path, file_size, &parent_id, &filename, &mime_type)
            .await?;
        info!(id = %metadata.id, name = %metadata.name, parent = %parent_id, "uploaded file");

        if options.make_public {
            self.share_file(&metadata.id, &Permission::anyone_reader())
                .await?;
        }
        for email in &options.share_with {
            self.share_file(&metadata.id, &Permission::user(email, Role::Writer))
                .await?;
        }

        Ok(metadata)
    }

    async fn upload_multipart(
        &self,
        local_path: &Path,
        file_size: u64,
        parent_id: &str,
        filename: &str,
        mime_type: &str,
    ) -> Result<FileMetadata> {
        let token = self.auth.get_access_token().await?;
        let file = File::open(local_path).await.map_err(|_| {
            GoogleError::LocalFileNotFound(local_path.display().to_string())
        })?;

        let metadata = serde_json::json!({
            "name": filename,
            "parents": [parent_id]
        });

        let metadata_part = Part::text(metadata.to_string()).mime_str("application/json")?;
        let file_part = Part::stream_with_length(
            Body::wrap_stream(ReaderStream::new(file)),
            file_size,
        )
        .file_name(filename.to_string())
        .mime_str(mime_type)?;

        let form = Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let response = self
            .http
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(&token)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", FILE_FIELDS),
            ])
            .multipart(form)
            .send()
            .await?;

        parse_json(response).await
    }

    /// Grant a permission on a file or folder.
    #[instrument(skip(self), level = "info")]
    pub async fn share_file(
        &self,
        file_id: &str,
        permission: &Permission,
    ) -> Result<PermissionResult> {
        self.create_permission(file_id, permission, false).await
    }

    /// Make `email` the owner of a file.
    #[instrument(skip(self), level = "info")]
    pub async fn transfer_ownership(&self, file_id: &str, email: &str) -> Result<PermissionResult> {
        self.create_permission(file_id, &Permission::user(email, Role::Owner), true)
            .await
    }

    async fn create_permission(
        &self,
        file_id: &str,
        permission: &Permission,
        transfer_ownership: bool,
    ) -> Result<PermissionResult> {
        let token = self.auth.get_access_token().await?;

        let mut request = self
            .http
            .post(format!("{}/files/{}/permissions", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true")])
            .json(permission);
        if transfer_ownership {
            request = request.query(&[("transferOwnership", "true")]);
        }

        let result: PermissionResult = parse_json(request.send().await?).await?;
        info!(file_id, permission_id = %result.id, "granted permission");
        Ok(result)
    }

    /// Account and storage quota of the authenticated user.
    #[instrument(skip(self), level = "info")]
    pub async fn about(&self) -> Result<About> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/about", self.api_base))
            .bearer_auth(&token)
            .query(&[("fields", "user(emailAddress, displayName), storageQuota")])
            .send()
            .await?;

        parse_json(response).await
    }

    /// Download a file to a local path.
    ///
    /// # Arguments
    /// * `file_id` - The ID of the file to download
    /// * `destination` - A file path, or an existing directory to save into under the remote name
    #[instrument(skip(self, destination), level = "info")]
    pub async fn download_file<P: AsRef<Path>>(
        &self,
        file_id: &str,
        destination: P,
    ) -> Result<FileMetadata> {
        let destination = destination.as_ref();
        let metadata = self.get_file(file_id).await?;

        let final_path = if destination.is_dir() {
            destination.join(&metadata.name)
        } else {
            destination.to_path_buf()
        };

        let token = self.auth.get_access_token().await?;
        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .send()
            .await?;
        let response = check_response(response).await?;

        let mut file = File::create(&final_path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        debug!(path = %final_path.display(), "download complete");
        Ok(metadata)
    }
}
