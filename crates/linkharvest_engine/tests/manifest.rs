use std::fs;

use linkharvest_engine::{LinkRecord, ManifestStore, DEFAULT_MANIFEST_FILENAME};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn records(pairs: &[(&str, &str)]) -> Vec<LinkRecord> {
    pairs
        .iter()
        .enumerate()
        .map(|(order, (title, url))| LinkRecord {
            url: url.to_string(),
            title: title.to_string(),
            order,
        })
        .collect()
}

#[test]
fn manifest_lists_links_in_order() {
    let temp = TempDir::new().unwrap();
    let store = ManifestStore::in_dir(temp.path());
    assert_eq!(store.path(), temp.path().join(DEFAULT_MANIFEST_FILENAME));

    store
        .write(&records(&[
            ("Annual Report", "https://example.com/report.pdf"),
            ("Data, raw", "https://example.com/data.csv"),
            ("The \"best\" slides", "https://example.com/slides.pdf"),
        ]))
        .unwrap();

    let content = fs::read_to_string(store.path()).unwrap();
    assert_eq!(
        content,
        "title,url\r\n\
         Annual Report,https://example.com/report.pdf\r\n\
         \"Data, raw\",https://example.com/data.csv\r\n\
         \"The \"\"best\"\" slides\",https://example.com/slides.pdf\r\n"
    );
}

#[test]
fn rewriting_replaces_previous_manifest() {
    let temp = TempDir::new().unwrap();
    let store = ManifestStore::in_dir(temp.path());
    store
        .write(&records(&[("a", "https://a.example/"), ("b", "https://b.example/")]))
        .unwrap();
    store.write(&records(&[("c", "https://c.example/")])).unwrap();

    let content = fs::read_to_string(store.path()).unwrap();
    assert_eq!(content, "title,url\r\nc,https://c.example/\r\n");
}

#[test]
fn empty_harvest_writes_header_only() {
    let temp = TempDir::new().unwrap();
    let store = ManifestStore::new(temp.path().join("nested").join("links.csv"));
    assert_eq!(store.write_logged(&[]), Some(store.path().to_path_buf()));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "title,url\r\n");
}

#[test]
fn unwritable_location_is_reported_not_raised() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    let store = ManifestStore::new(blocker.join("extracted_urls.csv"));
    assert!(store.write(&records(&[("a", "https://a.example/")])).is_err());
    assert_eq!(store.write_logged(&records(&[("a", "https://a.example/")])), None);
}
