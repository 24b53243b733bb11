//! Integration tests for multi-source record linkage.
//! Tests: publication clusters, provenance, author identities, redirection

mod common;

use std::sync::Arc;

use bibmirror_core::{
    AuthorRedirect, AuthorRules, AuthorSpec, DblpAuthor, DblpPublication, HalAuthor, HalKey,
    HalPublication, LinkageParams, Mirror, Origin, PubType, PublicationRules, SourceAuthor,
    SourcePublication, deduplicate, merge_author_sources, redirect_authors,
};
use common::{offline_options, sample_dump, write_gzip};
use tempfile::TempDir;

fn dblp(key: &str, title: &str, venue: Option<&str>, authors: &[&str]) -> SourcePublication {
    SourcePublication::Dblp(DblpPublication {
        key: key.into(),
        title: title.into(),
        authors: authors
            .iter()
            .map(|name| DblpAuthor {
                name: (*name).into(),
                pid: None,
                aliases: Vec::new(),
            })
            .collect(),
        venue: venue.map(str::to_string),
        kind: PubType::Conference,
        year: 2012,
        url: None,
        pages: None,
    })
}

fn hal(key: &str, title: &str, authors: &[(&str, &str)]) -> SourcePublication {
    SourcePublication::Hal(HalPublication {
        key: key.into(),
        title: title.into(),
        authors: authors
            .iter()
            .map(|(name, id)| HalAuthor {
                name: (*name).into(),
                key: Some(HalKey::detect(id)),
                aliases: Vec::new(),
            })
            .collect(),
        venue: Some("INFOCOM".into()),
        kind: PubType::Conference,
        year: 2012,
        abstract_text: Some("We study catalog sizes.".into()),
        url: None,
    })
}

/// Test mirror records link against live records and keep both origins.
#[test]
fn mirror_and_live_records_merge() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("dblp.ttl.gz");
    write_gzip(&source, &sample_dump());
    let mirror = Mirror::new(offline_options(dir.path(), &source)).unwrap();

    let mut records = mirror.source_publications("v/LaurentViennot").unwrap();
    records.push(dblp(
        "journals/corr/abs-1",
        "Achievable Catalog Size in P2P VoD Systems",
        Some("unpublished"),
        &["Laurent Viennot"],
    ));
    let params = LinkageParams::publications().with_threshold(75.0);
    let clusters = deduplicate(records, &PublicationRules, &params);

    assert_eq!(clusters.len(), 2);
    let catalog = clusters.iter().find(|cluster| cluster.len() == 2).unwrap();
    assert_eq!(catalog.representative().origin(), Origin::Mirror);
    assert_eq!(catalog.venue(), "TEST");
    let provenance = catalog.provenance();
    assert_eq!(provenance.keys().copied().collect::<Vec<_>>(), vec![Origin::Dblp, Origin::Mirror]);
}

/// Test the default title threshold keeps loosely related titles apart.
#[test]
fn default_threshold_is_conservative() {
    let records = vec![
        dblp("a", "Achievable Catalog Size in P2P VoD Systems", Some("unpublished"), &[]),
        dblp(
            "b",
            "Achievable catalog size in peer-to-peer video-on-demand systems",
            Some("INFOCOM"),
            &[],
        ),
        dblp("c", "Achievable Catalog Size in P2P VoD Systems.", Some("CoRR"), &[]),
    ];
    let clusters = deduplicate(records, &PublicationRules, &LinkageParams::publications());
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].len(), 2);
    assert_eq!(clusters[0].key(), "c", "CoRR outranks unpublished");
    assert_eq!(clusters[1].key(), "b");
}

/// Test shuffled inputs give the same representatives.
#[test]
fn representatives_are_order_independent() {
    let base = vec![
        dblp("x/1", "Stable matchings in peer networks", Some("unpublished"), &[]),
        dblp("x/2", "Stable Matchings in Peer Networks", Some("PODC"), &[]),
        hal("hal-9", "Stable matchings in peer networks.", &[]),
        dblp("y/1", "Bloom filters for routing", Some("ICDCS"), &[]),
    ];
    let mut rng = fastrand::Rng::with_seed(3);
    let reference: Vec<String> = {
        let mut keys: Vec<String> =
            deduplicate(base.clone(), &PublicationRules, &LinkageParams::publications())
            .iter()
            .map(|cluster| cluster.key().to_string())
            .collect();
        keys.sort();
        keys
    };
    assert_eq!(reference, vec!["hal-9", "y/1"]);
    for _ in 0..10 {
        let mut shuffled = base.clone();
        rng.shuffle(&mut shuffled);
        let mut keys: Vec<String> =
            deduplicate(shuffled, &PublicationRules, &LinkageParams::publications())
            .iter()
            .map(|cluster| cluster.key().to_string())
            .collect();
        keys.sort();
        assert_eq!(keys, reference);
    }
}

/// Test author clusters become identities that publications redirect to.
#[test]
fn authors_merge_and_redirect() {
    let publications = vec![
        hal("hal-1", "Some paper", &[("Fabien Mathieu", "fabien-mathieu"), ("Ana Busic", "12345")]),
        dblp("conf/z/1", "Another paper", Some("Z"), &["Fabien Mathieu", "Someone Else"]),
    ];
    let authors: Vec<SourceAuthor> =
        publications.iter().flat_map(SourcePublication::authors).collect();
    let clusters = deduplicate(authors, &AuthorRules, &LinkageParams::authors());
    let identities: Vec<_> = clusters
        .into_iter()
        .filter_map(|cluster| merge_author_sources(cluster.into_members()))
        .collect();
    assert_eq!(identities.len(), 3);
    let fabien = identities.iter().find(|id| id.name == "Fabien Mathieu").unwrap();
    assert_eq!(fabien.sources.len(), 2);
    assert_eq!(fabien.key().as_deref(), Some("fabien-mathieu"));

    let redirect = AuthorRedirect::new(identities);
    let linked = redirect_authors(publications, &redirect);
    let dblp_fabien = &linked[1].authors[0];
    assert!(dblp_fabien.is_merged());
    assert_eq!(dblp_fabien.name(), "Fabien Mathieu");
    let hal_fabien = &linked[0].authors[0];
    match (hal_fabien, dblp_fabien) {
        (bibmirror_core::LinkedAuthor::Merged(a), bibmirror_core::LinkedAuthor::Merged(b)) => {
            assert!(Arc::ptr_eq(a, b));
        }
        _ => panic!("both spellings should resolve to one identity"),
    }
}

/// Test declared authors pull their mirror entry in as a source.
#[test]
fn declared_author_uses_mirror_pin() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("dblp.ttl.gz");
    write_gzip(&source, &sample_dump());
    let mirror = Mirror::new(offline_options(dir.path(), &source)).unwrap();

    let spec = AuthorSpec::parse(
        "Laurent Viennot (ldb:v/LaurentViennot, url:https://example.org, group:lincs)",
    );
    assert_eq!(spec.metadata.group.as_deref(), Some("lincs"));
    let identity = mirror.sourced_author(&spec).unwrap().unwrap();
    assert_eq!(identity.key().as_deref(), Some("v/LaurentViennot"));
    assert_eq!(identity.aliases(), vec!["L. Viennot"]);
}
