//! Integration tests for the mirror store lifecycle and query surface.
//! Tests: lazy build, persistence, incompatible artifacts, search, caches

mod common;

use bibmirror_core::{Mirror, MirrorError, SearchParams, read_header};
use common::{offline_options, sample_dump, write_gzip};
use tempfile::TempDir;

fn mirror_with_dump() -> (TempDir, Mirror) {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("dblp.ttl.gz");
    write_gzip(&source, &sample_dump());
    let mirror = Mirror::new(offline_options(dir.path(), &source)).unwrap();
    (dir, mirror)
}

/// Test the first query builds from the dump and persists the artifact.
#[test]
fn first_query_builds_and_saves() {
    let (_dir, mirror) = mirror_with_dump();
    assert!(!mirror.is_loaded());

    let found = mirror.search_author("Laurent Viennot").unwrap();
    assert!(mirror.is_loaded());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key, "v/LaurentViennot");

    let destination = &mirror.options().io.destination;
    assert!(destination.exists());
    assert!(read_header(destination).unwrap().has_search());
}

/// Test a second store loads the artifact without touching the dump.
#[test]
fn artifact_is_reused_across_instances() {
    let (dir, mirror) = mirror_with_dump();
    let before = mirror.author_publications("66/2077").unwrap();
    fs_err::remove_file(dir.path().join("dblp.ttl.gz")).unwrap();

    let reopened = Mirror::new(mirror.options().clone()).unwrap();
    let after = reopened.author_publications("66/2077").unwrap();
    assert_eq!(before, after);
    assert_eq!(after.len(), 2);
    assert_eq!(after[1].authors.len(), 2);
    assert_eq!(after[1].authors[1].name(), "Laurent Viennot");
    assert_eq!(reopened.author_count().unwrap(), 4);
    assert_eq!(reopened.publication_count().unwrap(), 4);
}

/// Test an unreadable artifact is replaced by a fresh build.
#[test]
fn incompatible_artifact_triggers_rebuild() {
    let (_dir, mirror) = mirror_with_dump();
    let destination = mirror.options().io.destination.clone();
    fs_err::create_dir_all(destination.parent().unwrap()).unwrap();
    fs_err::write(&destination, b"BMIR\x01\x00\x00\x00 left over from an older layout").unwrap();

    let err = mirror.load(false).unwrap_err();
    assert!(err.is_incompatible());
    assert!(err.to_string().contains(&destination.display().to_string()));

    mirror.load_or_build().unwrap();
    assert!(mirror.is_loaded());
    assert_eq!(read_header(&destination).unwrap().version, 2);
    assert_eq!(mirror.author_by_key("66/2077").unwrap().name(), "Fabien Mathieu");
}

/// Test the dual threshold: close homonyms drop out under a tight slack.
#[test]
fn search_thresholds() {
    let (_dir, mirror) = mirror_with_dump();
    let loose = SearchParams {
        limit: 5,
        cutoff: 50.0,
        slack: 100.0,
    };
    let both = mirror.search_author_with("Fabien Mathieu", &loose).unwrap();
    let keys: Vec<&str> = both.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&"66/2077") && keys.contains(&"66/2077-2"));

    let strict = SearchParams {
        limit: 5,
        cutoff: 85.0,
        slack: 5.0,
    };
    let nobody = mirror.search_author_with("Zebulon Quixote", &strict).unwrap();
    assert!(nobody.is_empty());
}

/// Test repeated searches agree and survive cache invalidation.
#[test]
fn search_is_idempotent() {
    let (_dir, mirror) = mirror_with_dump();
    let first = mirror.search_author("L. Viennot").unwrap();
    let cached = mirror.search_author("L. Viennot").unwrap();
    mirror.invalidate();
    let fresh = mirror.search_author("l viennot").unwrap();
    assert_eq!(first, cached);
    assert_eq!(first, fresh);
    assert_eq!(first[0].key, "v/LaurentViennot");
}

/// Test a rebuild swaps in new tables with fresh caches.
#[test]
fn rebuild_replaces_state() {
    let (_dir, mirror) = mirror_with_dump();
    assert_eq!(mirror.publication_count().unwrap(), 4);
    mirror.author_by_key("d/Durand").unwrap();

    mirror.build(Some(1)).unwrap();
    assert_eq!(mirror.publication_count().unwrap(), 1);
    let err = mirror.author_by_key("d/Durand").unwrap_err();
    assert!(matches!(err, MirrorError::AuthorNotFound { .. }));
}

/// Test a store loaded without its index refuses name search.
#[test]
fn search_needs_an_index() {
    let (_dir, mirror) = mirror_with_dump();
    mirror.build(None).unwrap();
    mirror.save(false).unwrap();
    mirror.load(false).unwrap();
    assert!(matches!(
        mirror.search_author("Fabien Mathieu"),
        Err(MirrorError::SearchDisabled)
    ));
    assert_eq!(mirror.author_by_key("66/2077").unwrap().publications, vec![0, 1]);
}

/// Test a lazily opened artifact saved without its index still serves searches.
#[test]
fn lazy_search_restores_a_missing_index() {
    let (_dir, mirror) = mirror_with_dump();
    mirror.build(None).unwrap();
    mirror.save(false).unwrap();
    let destination = mirror.options().io.destination.clone();
    assert!(!read_header(&destination).unwrap().has_search());

    let reopened = Mirror::new(mirror.options().clone()).unwrap();
    let found = reopened.search_author("Laurent Viennot").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key, "v/LaurentViennot");
    assert!(read_header(&destination).unwrap().has_search());
}
