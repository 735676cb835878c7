use reshape_core::{
    emit_template, load_from_path, scan_directory, ErrorKind, Loader, Settings, Structure,
    StructureSource,
};
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod helpers;
use helpers::{sample_structure, setup_project, setup_tracing, write_file};

const TEMPLATE: &str = "repository_structure.map";

#[test]
fn scan_records_first_level_files_and_every_nested_directory() {
    setup_tracing();
    let temp_dir = setup_project();

    let structure = scan_directory(temp_dir.path()).unwrap();

    let src = &structure.directories["src"];
    assert_eq!(src.files, vec!["a.txt", "lib.rs"]);
    assert_eq!(src.dirs, vec!["sub", "sub/inner"]);
    assert_eq!(structure.directories["docs"].files, vec!["guide.md"]);
    assert_eq!(structure.root_files, vec!["README.md", "layout.map", "notes.txt"]);
}

#[test]
fn scan_never_reports_hidden_entries() {
    setup_tracing();
    let temp_dir = setup_project();
    write_file(temp_dir.path(), "docs/.hidden/inside.md", "x");
    write_file(temp_dir.path(), "docs/.draft.md", "x");

    let structure = scan_directory(temp_dir.path()).unwrap();

    assert!(structure.directories.keys().all(|name| !name.starts_with('.')));
    assert!(structure.root_files.iter().all(|name| !name.starts_with('.')));
    for entry in structure.directories.values() {
        let names = entry.files.iter().chain(&entry.dirs);
        for name in names {
            assert!(
                name.split('/').all(|part| !part.starts_with('.')),
                "hidden entry leaked: {name}"
            );
        }
    }
}

#[test]
fn scan_of_missing_directory_is_not_found() {
    let temp_dir = tempdir().unwrap();
    let err = scan_directory(&temp_dir.path().join("nope")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn template_round_trips_through_a_descriptor_file() {
    setup_tracing();
    let project = setup_project();
    let out = tempdir().unwrap();

    let scanned = scan_directory(project.path()).unwrap();
    let written = emit_template(project.path(), Some(out.path()), TEMPLATE).unwrap();

    assert_eq!(written, out.path().join(TEMPLATE));
    assert_eq!(load_from_path(&written).unwrap(), scanned);
}

#[test]
fn template_goes_into_the_scanned_directory_by_default() {
    let project = setup_project();
    let written = emit_template(project.path(), None, TEMPLATE).unwrap();
    assert_eq!(written, project.path().join(TEMPLATE));
    assert!(written.is_file());
}

#[test]
fn template_output_directory_is_created() {
    let project = setup_project();
    let out = tempdir().unwrap();
    let nested = out.path().join("templates/2024");

    let written = emit_template(project.path(), Some(&nested), TEMPLATE).unwrap();

    assert!(nested.is_dir());
    assert!(written.is_file());
}

#[test]
fn writing_a_template_twice_keeps_only_the_last() {
    let project = setup_project();
    let out = tempdir().unwrap();

    emit_template(project.path(), Some(out.path()), TEMPLATE).unwrap();
    write_file(project.path(), "CHANGELOG.md", "v2");
    let written = emit_template(project.path(), Some(out.path()), TEMPLATE).unwrap();

    let loaded = load_from_path(&written).unwrap();
    assert!(loaded.root_files.contains(&"CHANGELOG.md".to_string()));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
}

#[test]
fn a_directory_path_loads_like_a_scan() {
    let project = setup_project();
    assert_eq!(
        load_from_path(project.path()).unwrap(),
        scan_directory(project.path()).unwrap()
    );
}

#[test]
fn missing_local_path_is_not_found() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("missing.map");

    let err = load_from_path(&missing).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("missing.map"));
}

#[test]
fn unparsable_descriptor_file_is_malformed() {
    let temp_dir = tempdir().unwrap();
    let descriptor = temp_dir.path().join("broken.map");
    fs::write(&descriptor, "{ \"directories\": [").unwrap();

    let err = load_from_path(&descriptor).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
    assert!(err.to_string().contains("broken.map"));
}

#[test]
fn non_utf8_descriptor_file_is_malformed() {
    let temp_dir = tempdir().unwrap();
    let descriptor = temp_dir.path().join("binary.map");
    fs::write(&descriptor, [0xffu8, 0xfe, 0x7b]).unwrap();

    let err = load_from_path(&descriptor).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
    assert!(err.to_string().contains("binary.map"));
}

#[cfg(unix)]
#[test]
fn scan_skips_linked_directories() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write_file(root, "src/real/inside.txt", "x");
    write_file(root, "src/main.rs", "fn main() {}");
    std::os::unix::fs::symlink(root.join("src/real"), root.join("src/link")).unwrap();

    let structure = scan_directory(root).unwrap();

    let src = &structure.directories["src"];
    assert_eq!(src.files, vec!["main.rs"]);
    assert_eq!(src.dirs, vec!["real"]);
}

#[test]
fn default_source_is_the_empty_structure() {
    let loaded = Loader::new(Settings::default())
        .load(&StructureSource::Default)
        .unwrap();
    assert_eq!(loaded, Structure::default());
    assert!(loaded.is_empty());
}

async fn load_url(url: String) -> reshape_core::Result<Structure> {
    tokio::task::spawn_blocking(move || Loader::new(Settings::default()).load_from_url(&url))
        .await
        .expect("loader thread panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn url_descriptor_is_fetched_and_parsed() {
    setup_tracing();
    let server = MockServer::start().await;
    let body = sample_structure().to_json().unwrap();
    Mock::given(method("GET"))
        .and(path("/layout.map"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let loaded = load_url(format!("{}/layout.map", server.uri())).await.unwrap();

    assert_eq!(loaded, sample_structure());
}

#[tokio::test(flavor = "multi_thread")]
async fn url_with_error_status_is_source_unavailable() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/layout.map", server.uri());
    let err = load_url(url.clone()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    assert!(err.to_string().contains(&url));
}

#[tokio::test(flavor = "multi_thread")]
async fn url_with_invalid_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = load_url(format!("{}/layout.map", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_host_is_source_unavailable() {
    // Nothing listens on port 9 of localhost in a test sandbox.
    let err = load_url("http://127.0.0.1:9/layout.map".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
}
