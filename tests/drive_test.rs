//! DriveClient tests against a mocked Drive API.

use gdrive_sheets::folders::{children_query, folder_query, name_query};
use gdrive_sheets::models::FOLDER_MIME_TYPE;
use gdrive_sheets::{Authenticator, DriveClient, GoogleError, UploadOptions};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn client(server: &ServerGuard) -> DriveClient {
    DriveClient::new(Authenticator::with_static_token("test-token"), None)
        .with_base_urls(&server.url(), &format!("{}/upload", server.url()))
}

async fn mock_lookup(
    server: &mut ServerGuard,
    name: &str,
    parent: &str,
    found: Option<&str>,
    hits: usize,
) -> Mock {
    let files = match found {
        Some(id) => json!([{"id": id, "name": name, "mimeType": FOLDER_MIME_TYPE}]),
        None => json!([]),
    };
    server
        .mock("GET", "/files")
        .match_query(Matcher::UrlEncoded("q".into(), folder_query(name, parent)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "files": files }).to_string())
        .expect(hits)
        .create_async()
        .await
}

async fn mock_create(server: &mut ServerGuard, name: &str, parent: &str, id: &str) -> Mock {
    server
        .mock("POST", "/files")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent],
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": id }).to_string())
        .expect(1)
        .create_async()
        .await
}

mod resolve_folder_path {
    use super::*;

    #[tokio::test]
    async fn creates_missing_folders_in_order() {
        let mut server = Server::new_async().await;
        let lookup_reports = server
            .mock("GET", "/files")
            .match_header("authorization", "Bearer test-token")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "name = 'Reports' and mimeType = 'application/vnd.google-apps.folder' \
                 and 'root' in parents and trashed = false"
                    .into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"files": []}"#)
            .expect(1)
            .create_async()
            .await;
        let create_reports = mock_create(&mut server, "Reports", "root", "reports-id").await;
        let lookup_year = mock_lookup(&mut server, "2024", "reports-id", None, 1).await;
        let create_year = mock_create(&mut server, "2024", "reports-id", "year-id").await;

        let id = client(&server).resolve_folder_path("Reports/2024").await.unwrap();

        assert_eq!(id, "year-id");
        lookup_reports.assert_async().await;
        create_reports.assert_async().await;
        lookup_year.assert_async().await;
        create_year.assert_async().await;
    }

    #[tokio::test]
    async fn existing_path_resolves_to_same_id_without_creating() {
        let mut server = Server::new_async().await;
        let lookup_reports =
            mock_lookup(&mut server, "Reports", "root", Some("reports-id"), 2).await;
        let lookup_year = mock_lookup(&mut server, "2024", "reports-id", Some("year-id"), 2).await;
        let create = server
            .mock("POST", "/files")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let drive = client(&server);
        let first = drive.resolve_folder_path("Reports/2024").await.unwrap();
        let second = drive.resolve_folder_path("/Reports/2024/").await.unwrap();

        assert_eq!(first, "year-id");
        assert_eq!(first, second);
        lookup_reports.assert_async().await;
        lookup_year.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn reuses_existing_prefix_and_creates_tail() {
        let mut server = Server::new_async().await;
        let lookup_reports =
            mock_lookup(&mut server, "Reports", "root", Some("reports-id"), 1).await;
        let lookup_year = mock_lookup(&mut server, "2025", "reports-id", None, 1).await;
        let create_year = mock_create(&mut server, "2025", "reports-id", "new-year-id").await;

        let id = client(&server).resolve_folder_path("Reports/2025").await.unwrap();

        assert_eq!(id, "new-year-id");
        lookup_reports.assert_async().await;
        lookup_year.assert_async().await;
        create_year.assert_async().await;
    }

    #[tokio::test]
    async fn empty_path_is_root_without_remote_calls() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("GET", Matcher::Any)
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let drive = client(&server);
        assert_eq!(drive.resolve_folder_path("").await.unwrap(), "root");
        assert_eq!(drive.resolve_folder_path("/").await.unwrap(), "root");
        any.assert_async().await;
    }

    #[tokio::test]
    async fn segments_are_looked_up_by_exact_name() {
        let mut server = Server::new_async().await;
        let lookup = mock_lookup(&mut server, "Q1 ", "root", Some("q1-id"), 1).await;
        let lookup_inner =
            mock_lookup(&mut server, " raw data", "q1-id", Some("raw-id"), 1).await;

        let id = client(&server).resolve_folder_path("Q1 / raw data/ /").await.unwrap();

        assert_eq!(id, "raw-id");
        lookup.assert_async().await;
        lookup_inner.assert_async().await;
    }

    #[tokio::test]
    async fn shared_drive_paths_start_at_drive_root() {
        let server = Server::new_async().await;
        let drive = DriveClient::new(
            Authenticator::with_static_token("test-token"),
            Some("0AdriveId".to_string()),
        )
        .with_base_urls(&server.url(), &server.url());

        assert_eq!(drive.root_id(), "0AdriveId");
        assert_eq!(drive.resolve_folder_path("//").await.unwrap(), "0AdriveId");
    }

    #[tokio::test]
    async fn create_without_id_fails() {
        let mut server = Server::new_async().await;
        let _lookup = mock_lookup(&mut server, "Reports", "root", None, 1).await;
        let _create = server
            .mock("POST", "/files")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let err = client(&server).resolve_folder_path("Reports").await.unwrap_err();
        assert!(matches!(err, GoogleError::FolderCreationFailed(ref name) if name == "Reports"));
    }

    #[tokio::test]
    async fn remote_failure_propagates_without_creating() {
        let mut server = Server::new_async().await;
        let _lookup = server
            .mock("GET", "/files")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 403, "message": "Insufficient permissions"}}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/files")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = client(&server).resolve_folder_path("Reports").await.unwrap_err();
        match err {
            GoogleError::ApiError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Insufficient permissions");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        create.assert_async().await;
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn shared_drive_list_passes_drive_corpus() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/files")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "'folder-1' in parents and trashed = false".into()),
                Matcher::UrlEncoded("corpora".into(), "drive".into()),
                Matcher::UrlEncoded("driveId".into(), "0Adrive".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"files": [
                    {"id": "f1", "name": "a.txt", "size": "10"},
                    {"id": "f2", "name": "b.txt"}
                ]})
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let drive = DriveClient::new(
            Authenticator::with_static_token("test-token"),
            Some("0Adrive".to_string()),
        )
        .with_base_urls(&server.url(), &server.url());

        let files = drive.list_files("folder-1").await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].size, Some(10));
        list.assert_async().await;
    }

    #[tokio::test]
    async fn query_follows_next_page_token() {
        let mut server = Server::new_async().await;
        let q = Matcher::UrlEncoded("q".into(), children_query("folder-1"));
        let first_page = server
            .mock("GET", "/files")
            .match_query(q.clone())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"files": [{"id": "a", "name": "a.txt"}], "nextPageToken": "page-2"})
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let second_page = server
            .mock("GET", "/files")
            .match_query(Matcher::AllOf(vec![
                q,
                Matcher::UrlEncoded("pageToken".into(), "page-2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"files": [{"id": "b", "name": "b.txt"}]}).to_string())
            .expect(1)
            .create_async()
            .await;

        let files = client(&server).list_files("folder-1").await.unwrap();

        let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        first_page.assert_async().await;
        second_page.assert_async().await;
    }

    #[tokio::test]
    async fn delete_of_missing_file_succeeds() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/files/gone")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 404, "message": "File not found: gone."}}"#)
            .expect(1)
            .create_async()
            .await;

        client(&server).delete_file("gone").await.unwrap();
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn delete_forbidden_propagates() {
        let mut server = Server::new_async().await;
        let _delete = server
            .mock("DELETE", "/files/locked")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 403, "message": "Insufficient permissions"}}"#)
            .create_async()
            .await;

        let err = client(&server).delete_file("locked").await.unwrap_err();
        assert!(matches!(err, GoogleError::ApiError { status: 403, .. }));
    }

    #[tokio::test]
    async fn about_reports_quota() {
        let mut server = Server::new_async().await;
        let _about = server
            .mock("GET", "/about")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "user": {"emailAddress": "bot@demo.iam.gserviceaccount.com"},
                    "storageQuota": {"limit": "16106127360", "usage": "1073741824"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let about = client(&server).about().await.unwrap();
        assert_eq!(
            about.user.email_address.as_deref(),
            Some("bot@demo.iam.gserviceaccount.com")
        );
        assert_eq!(about.storage_quota.available_bytes(), Some(15032385536));
    }
}

mod upload {
    use super::*;

    fn local_file() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"quarterly numbers").unwrap();
        file
    }

    async fn mock_upload(server: &mut ServerGuard) -> Mock {
        server
            .mock("POST", "/upload/files")
            .match_query(Matcher::UrlEncoded("uploadType".into(), "multipart".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "file-1",
                    "name": "report.txt",
                    "webViewLink": "https://drive.google.com/file/d/file-1/view"
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn uploads_into_folder_path_and_shares_publicly_by_default() {
        let mut server = Server::new_async().await;
        let lookup = mock_lookup(&mut server, "Uploads", "root", Some("uploads-id"), 1).await;
        let upload = mock_upload(&mut server).await;
        let share = server
            .mock("POST", "/files/file-1/permissions")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({"type": "anyone", "role": "reader"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "anyoneWithLink", "type": "anyone", "role": "reader"}"#)
            .expect(1)
            .create_async()
            .await;

        let file = local_file();
        let metadata = client(&server)
            .upload_file(file.path(), &UploadOptions::to_folder_path("Uploads"))
            .await
            .unwrap();

        assert_eq!(metadata.id, "file-1");
        lookup.assert_async().await;
        upload.assert_async().await;
        share.assert_async().await;
    }

    #[tokio::test]
    async fn private_upload_skips_public_permission() {
        let mut server = Server::new_async().await;
        let upload = mock_upload(&mut server).await;
        let share = server
            .mock("POST", Matcher::Regex(r"^/files/.+/permissions$".into()))
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let file = local_file();
        let options = UploadOptions::to_parent("parent-1").private();
        client(&server).upload_file(file.path(), &options).await.unwrap();

        upload.assert_async().await;
        share.assert_async().await;
    }

    #[tokio::test]
    async fn replaces_existing_file_and_shares_with_writers() {
        let mut server = Server::new_async().await;
        let find = server
            .mock("GET", "/files")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                name_query("report.txt", "parent-1"),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"files": [{"id": "old", "name": "report.txt"}]}).to_string())
            .expect(1)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/files/old")
            .match_query(Matcher::Any)
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let upload = mock_upload(&mut server).await;
        let share = server
            .mock("POST", "/files/file-1/permissions")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({
                "type": "user",
                "role": "writer",
                "emailAddress": "a@b.c"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "perm-1", "type": "user", "role": "writer"}"#)
            .expect(1)
            .create_async()
            .await;

        let file = local_file();
        let options = UploadOptions {
            file_name: Some("report.txt".to_string()),
            share_with: vec!["a@b.c".to_string()],
            replace_existing: true,
            ..UploadOptions::to_parent("parent-1").private()
        };
        let metadata = client(&server).upload_file(file.path(), &options).await.unwrap();

        assert_eq!(metadata.id, "file-1");
        find.assert_async().await;
        delete.assert_async().await;
        upload.assert_async().await;
        share.assert_async().await;
    }

    #[tokio::test]
    async fn replace_with_no_existing_file_only_uploads() {
        let mut server = Server::new_async().await;
        let _find = server
            .mock("GET", "/files")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"files": []}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", Matcher::Any)
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let upload = mock_upload(&mut server).await;

        let file = local_file();
        let options = UploadOptions {
            replace_existing: true,
            ..UploadOptions::to_parent("parent-1").private()
        };
        client(&server).upload_file(file.path(), &options).await.unwrap();

        delete.assert_async().await;
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn missing_local_file_fails_before_any_call() {
        // No mocks: any remote call would surface as an ApiError instead.
        let server = Server::new_async().await;

        let err = client(&server)
            .upload_file("/no/such/file.csv", &UploadOptions::to_folder_path("Uploads"))
            .await
            .unwrap_err();

        assert!(matches!(err, GoogleError::LocalFileNotFound(_)));
    }

    #[tokio::test]
    async fn transfer_ownership_sets_flag() {
        let mut server = Server::new_async().await;
        let transfer = server
            .mock("POST", "/files/file-1/permissions")
            .match_query(Matcher::UrlEncoded("transferOwnership".into(), "true".into()))
            .match_body(Matcher::PartialJson(json!({
                "type": "user",
                "role": "owner",
                "emailAddress": "new.owner@example.com"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "perm-9"}"#)
            .expect(1)
            .create_async()
            .await;

        let result = client(&server)
            .transfer_ownership("file-1", "new.owner@example.com")
            .await
            .unwrap();

        assert_eq!(result.id, "perm-9");
        transfer.assert_async().await;
    }
}

mod download {
    use super::*;
    use tempfile::tempdir;

    async fn mock_file(server: &mut ServerGuard, contents: &str) -> (Mock, Mock) {
        // Created first: serves the metadata request, then is exhausted.
        let metadata = server
            .mock("GET", "/files/file-1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"id": "file-1", "name": "report.csv", "size": "11"}).to_string())
            .expect(1)
            .create_async()
            .await;
        let media = server
            .mock("GET", "/files/file-1")
            .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
            .with_status(200)
            .with_header("content-type", "text/csv")
            .with_body(contents)
            .expect(1)
            .create_async()
            .await;
        (metadata, media)
    }

    #[tokio::test]
    async fn saves_into_directory_under_remote_name() {
        let mut server = Server::new_async().await;
        let (metadata, media) = mock_file(&mut server, "a,b\n1,2\n3,4").await;
        let dir = tempdir().unwrap();

        let file = client(&server).download_file("file-1", dir.path()).await.unwrap();

        assert_eq!(file.name, "report.csv");
        let saved = std::fs::read_to_string(dir.path().join("report.csv")).unwrap();
        assert_eq!(saved, "a,b\n1,2\n3,4");
        metadata.assert_async().await;
        media.assert_async().await;
    }

    #[tokio::test]
    async fn saves_to_explicit_file_path() {
        let mut server = Server::new_async().await;
        let (_metadata, _media) = mock_file(&mut server, "x,y").await;
        let dir = tempdir().unwrap();
        let target = dir.path().join("renamed.csv");

        client(&server).download_file("file-1", &target).await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "x,y");
        assert!(!dir.path().join("report.csv").exists());
    }

    #[tokio::test]
    async fn failed_media_request_writes_nothing() {
        let mut server = Server::new_async().await;
        let _metadata = server
            .mock("GET", "/files/file-1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"id": "file-1", "name": "report.csv"}).to_string())
            .expect(1)
            .create_async()
            .await;
        let _media = server
            .mock("GET", "/files/file-1")
            .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 403, "message": "Download quota exceeded"}}"#)
            .create_async()
            .await;
        let dir = tempdir().unwrap();

        let err = client(&server).download_file("file-1", dir.path()).await.unwrap_err();

        assert!(matches!(err, GoogleError::ApiError { status: 403, .. }));
        assert!(!dir.path().join("report.csv").exists());
    }
}
