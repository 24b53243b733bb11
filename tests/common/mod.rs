//! Shared fixtures: tiny dblp-style Turtle dumps written in-process.
#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use bibmirror_core::MirrorOptions;
use flate2::Compression;
use flate2::write::GzEncoder;

/// One publication block as it appears in the dump.
pub fn block(key: &str, title: &str, bibtex: &str, authors: &[(&str, &str)], year: i32) -> String {
    let signatures = authors
        .iter()
        .map(|(pid, name)| {
            format!(
                "[\n\
                 \t\ta dblp:AuthorSignature ;\n\
                 \t\tdblp:signatureDblpName \"{name}\" ;\n\
                 \t\tdblp:signatureCreator <https://dblp.org/pid/{pid}> ;\n\
                 \t]"
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "<https://dblp.org/rec/{key}>\n\
         \ta dblp:Publication ;\n\
         \tdblp:title \"{title}\" ;\n\
         \tdblp:bibtexType bibtex:{bibtex} ;\n\
         \tdblp:hasSignature {signatures} ;\n\
         \tdblp:publishedInStream <https://dblp.org/streams/conf/test> ;\n\
         \tdblp:publishedIn \"TEST\" ;\n\
         \tdblp:yearOfPublication \"{year}\"^^<http://www.w3.org/2001/XMLSchema#gYear> ."
    )
}

/// Prefix declarations, a malformed block and an unsigned block around `blocks`.
pub fn dump(blocks: &[String]) -> String {
    let mut text = String::from("@prefix dblp: <https://dblp.org/rdf/schema#> .\n\n");
    text.push_str(
        "<https://dblp.org/pid/66/2077>\n\
         \ta dblp:Person ;\n\
         \tdblp:primaryCreatorName \"Fabien Mathieu\" .\n\n",
    );
    for block in blocks {
        text.push_str(block);
        text.push_str("\n\n");
    }
    text
}

pub fn sample_dump() -> String {
    dump(&[
        block(
            "conf/sss/Mathieu07",
            "Upper Bounds for Stabilization in Acyclic Preference-Based Systems.",
            "Inproceedings",
            &[("66/2077", "Fabien Mathieu")],
            2007,
        ),
        block(
            "journals/ton/BoufkhadMMPV12",
            "Achievable catalog size in peer-to-peer video-on-demand systems",
            "Article",
            &[("66/2077", "Fabien Mathieu"), ("v/LaurentViennot", "Laurent Viennot")],
            2012,
        ),
        block(
            "conf/iptps/MathieuD09",
            "Cooperation in overlays",
            "Inproceedings",
            &[("66/2077-2", "Fabien Mathieu 0002"), ("d/Durand", "François Durand 0001")],
            2009,
        ),
        block(
            "journals/corr/abs-0001",
            "Preprint without peers",
            "Informal",
            &[("v/LaurentViennot", "L. Viennot")],
            2020,
        ),
    ])
}

pub fn write_gzip(path: &Path, text: &str) {
    let mut encoder = GzEncoder::new(fs_err::File::create(path).unwrap(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

pub fn write_zstd(path: &Path, text: &str) {
    let compressed = zstd::encode_all(text.as_bytes(), 3).unwrap();
    fs_err::write(path, compressed).unwrap();
}

/// Options rooted in `dir` that never reach the network.
pub fn offline_options(dir: &Path, source: &Path) -> MirrorOptions {
    let mut options = MirrorOptions::default()
        .with_data_dir(dir.join("data"))
        .with_source(source.to_string_lossy());
    options.io.auto_retrieve = false;
    options.io.release_api = "http://127.0.0.1:9/releases".into();
    options.frame_size.authors = 2;
    options.frame_size.publications = 2;
    options
}
