use clap::Parser;
use dbxsend_cli::{authenticate, credentials, run_upload, Args, CliError, UploadRequest};
use dbxsend_client::{content_hash, Config, Credentials};
use serde_json::{json, Value};
use std::io::Cursor;
use std::path::Path;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn request_for(argv: &[&str]) -> UploadRequest {
    let mut full = vec!["dbxsend", "--share-delay-secs", "0"];
    full.extend_from_slice(argv);
    UploadRequest::from_args(&Args::try_parse_from(full).unwrap()).unwrap()
}

fn client_config(server: &MockServer) -> Config {
    Config::default()
        .with_base_url(server.uri())
        .with_token("test-token")
}

/// Echo upload metadata for whatever body was sent
fn echo_upload(dropbox_path: &'static str) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    move |request: &Request| {
        ResponseTemplate::new(200).set_body_json(json!({
            ".tag": "file",
            "name": dropbox_path.rsplit('/').next().unwrap(),
            "id": "id:Zx9",
            "path_display": dropbox_path,
            "path_lower": dropbox_path.to_lowercase(),
            "size": request.body.len(),
            "rev": "016a1",
            "content_hash": content_hash(&request.body)
        }))
    }
}

async fn mount_team_account(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/2/users/get_current_account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "account_id": "dbid:AAH4f99",
            "name": {"display_name": "Core Lab"},
            "root_info": {".tag": "team", "root_namespace_id": "3235641", "home_namespace_id": "3235642"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn sample_tree(root: &Path) -> std::path::PathBuf {
    let src = root.join("18-AK");
    std::fs::create_dir_all(src.join("fastq")).unwrap();
    std::fs::write(src.join("README.txt"), b"run 18-AK").unwrap();
    std::fs::write(src.join("fastq/s1.fastq"), "ACGT\n".repeat(200)).unwrap();
    src
}

#[tokio::test]
async fn test_zip_upload_and_share() {
    let server = MockServer::start().await;
    mount_team_account(&server).await;
    Mock::given(method("POST"))
        .and(path("/2/files/upload"))
        .and(header("Dropbox-API-Path-Root", r#"{".tag":"root","root":"3235641"}"#))
        .respond_with(echo_upload("/zips/18-AK (1).zip"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/sharing/create_shared_link_with_settings"))
        .and(body_string_contains("/zips/18-AK (1).zip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            ".tag": "file",
            "url": "https://www.dropbox.com/scl/fi/abc/18-AK%20(1).zip?rlkey=k1&dl=0",
            "name": "18-AK (1).zip",
            "expires": "2031-01-15T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let src = sample_tree(dir.path());
    let zip_path = dir.path().join("out.zip");
    let output = dir.path().join("result.json");

    let request = request_for(&[
        "-z",
        "--ar",
        "-s",
        src.to_str().unwrap(),
        "-d",
        "/zips/18-AK.zip",
        "--zfp",
        zip_path.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);
    let password = request.password.clone().unwrap();

    let result = run_upload(&request, client_config(&server)).await.unwrap();

    let archive_len = std::fs::metadata(&zip_path).unwrap().len();
    assert_eq!(result.size, archive_len);
    assert_eq!(result.destination, "/zips/18-AK (1).zip");
    assert_eq!(result.password.as_deref(), Some(password.as_str()));
    assert!(result.url.as_deref().unwrap().ends_with("rlkey=k1&dl=1"));

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["dropbox_path"], "/zips/18-AK (1).zip");
    assert_eq!(written["expiration_date"], "2031-01-15T12:00:00Z");
    assert_eq!(written["size"], archive_len);
    assert_eq!(written["source"], src.to_str().unwrap());

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/2/files/upload")
        .unwrap();
    let arg: Value =
        serde_json::from_str(upload.headers.get("Dropbox-API-Arg").unwrap().to_str().unwrap()).unwrap();
    assert_eq!(arg["path"], "/zips/18-AK.zip");
    assert_eq!(arg["autorename"], true);

    let share = requests
        .iter()
        .find(|r| r.url.path() == "/2/sharing/create_shared_link_with_settings")
        .unwrap();
    let body: Value = serde_json::from_slice(&share.body).unwrap();
    assert_eq!(body["settings"]["link_password"], password.as_str());
    assert_eq!(body["settings"]["require_password"], true);
}

#[tokio::test]
async fn test_plain_upload_into_user_root() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/files/upload"))
        .respond_with(echo_upload("/reports/report.pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("report.pdf");
    std::fs::write(&file, b"%PDF-1.7 tiny").unwrap();

    let request = request_for(&["-s", file.to_str().unwrap(), "-d", "/reports/report.pdf", "--root", "user"]);
    let result = run_upload(&request, client_config(&server)).await.unwrap();

    assert_eq!(result.size, 13);
    assert!(result.url.is_none());
    assert!(result.password.is_none());
    assert!(result.expiration_date.is_none());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("Dropbox-API-Path-Root").is_none());
}

#[tokio::test]
async fn test_failed_upload_writes_no_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/files/upload"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error_summary": "path/insufficient_space/..",
            "error": {".tag": "path"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("big.bin");
    std::fs::write(&file, vec![7u8; 64]).unwrap();
    let output = dir.path().join("result.json");

    let request = request_for(&[
        "-s",
        file.to_str().unwrap(),
        "-d",
        "/big.bin",
        "--root",
        "user",
        "-o",
        output.to_str().unwrap(),
    ]);
    let err = run_upload(&request, client_config(&server)).await.unwrap_err();

    assert!(matches!(err, CliError::Client(ref e) if e.is_quota()));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_existing_archive_is_not_overwritten() {
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let src = sample_tree(dir.path());
    let zip_path = dir.path().join("18-AK.zip");
    std::fs::write(&zip_path, b"keep me").unwrap();

    let request = request_for(&[
        "-z",
        "-s",
        src.to_str().unwrap(),
        "-d",
        "/zips/18-AK.zip",
        "--zfp",
        zip_path.to_str().unwrap(),
    ]);
    let err = run_upload(&request, client_config(&server)).await.unwrap_err();

    assert!(matches!(err, CliError::ArchiveExists(_)));
    assert_eq!(std::fs::read(&zip_path).unwrap(), b"keep me");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_authenticate_stores_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=pasted-code"))
        .and(body_string_contains("client_id=app-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "sl.short",
            "token_type": "bearer",
            "expires_in": 14400,
            "refresh_token": "r-long",
            "account_id": "dbid:AAH4f99",
            "scope": "files.content.write sharing.write"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");
    let mut prompt = Vec::new();

    let config = Config::default().with_base_url(server.uri());
    let stored = authenticate(config, "app-key", &store, Cursor::new("pasted-code\n"), &mut prompt)
        .await
        .unwrap();

    let prompt = String::from_utf8(prompt).unwrap();
    assert!(prompt.contains("Login Here:"));
    assert!(prompt.contains("code_challenge_method=S256"));

    assert_eq!(stored.refresh_token.as_deref(), Some("r-long"));
    let loaded = credentials::load(Some(&store)).unwrap();
    assert!(matches!(
        loaded.credentials().unwrap(),
        Credentials::RefreshToken { ref app_key, ref refresh_token }
            if app_key == "app-key" && refresh_token == "r-long"
    ));
}

#[tokio::test]
async fn test_authenticate_rejects_empty_code() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    let err = authenticate(Config::default(), "app-key", &store, Cursor::new("\n"), Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::InvalidArgument(_)));
    assert!(!store.exists());
}
