//! Field grammar for one dblp Turtle publication block.

use regex::Regex;

use crate::error::Result;
use crate::text::unescape_literal;
use crate::types::{PubType, RawRecord};

/// Turtle string literal body, escapes included.
const LITERAL: &str = r#""((?:[^"\\]|\\.)*)""#;

fn record_pattern() -> String {
    [
        r"<https://dblp\.org/rec/([^>]+)>".to_string(),
        format!(r".*?dblp:title\s+{LITERAL}"),
        r".*?dblp:bibtexType\s+bibtex:(\w+)".to_string(),
        r".*?dblp:hasSignature\s+(\[.*\])\s*;".to_string(),
        r"(?:.*?dblp:primaryDocumentPage\s+<([^>]+)>)?".to_string(),
        r"(?:.*?dblp:publishedInStream\s+([^;]+);)?".to_string(),
        format!(r"(?:.*?dblp:pagination\s+{LITERAL})?"),
        format!(r"(?:.*?dblp:publishedIn\s+{LITERAL})?"),
        r#".*?"(\d{4})"\^\^<http://www\.w3\.org/2001/XMLSchema#gYear>"#.to_string(),
    ]
    .concat()
}

/// Compiled grammar; build once per ingest run.
#[derive(Debug, Clone)]
pub struct RecordParser {
    record: Regex,
    streams: Regex,
    signatures: Regex,
}

impl RecordParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            record: Regex::new(&format!("(?s){}", record_pattern()))?,
            streams: Regex::new(r"<https://dblp\.org/streams/((?:conf|journals)/[^>]+)>")?,
            // A trailing ` 0002`-style homonym number is not part of the display name.
            signatures: Regex::new(concat!(
                r#"(?s)\[.*?signatureDblpName\s*"((?:[^"\\]|\\.)+?)(?:\s+\d+)?""#,
                r".*?signatureCreator\s*<https://dblp\.org/pid/([^>]+?)>.*?\]",
            ))?,
        })
    }

    /// Parse one block; `None` when the grammar does not match or no author is signed.
    #[must_use]
    pub fn parse(&self, block: &str) -> Option<RawRecord> {
        let caps = self.record.captures(block)?;
        let text = |group: usize| caps.get(group).map(|m| m.as_str());

        let mut authors: Vec<(String, String)> = Vec::new();
        for signature in self.signatures.captures_iter(text(4)?) {
            let pid = signature[2].to_string();
            if authors.iter().any(|(known, _)| *known == pid) {
                continue;
            }
            authors.push((pid, unescape_literal(&signature[1])));
        }
        if authors.is_empty() {
            return None;
        }

        let streams = text(6).map(|raw| {
            self.streams
                .captures_iter(raw)
                .map(|stream| stream[1].to_string())
                .collect::<Vec<_>>()
        });

        Some(RawRecord {
            key: text(1)?.to_string(),
            title: unescape_literal(text(2)?),
            kind: PubType::from_bibtex(text(3)?),
            authors,
            url: text(5).map(str::to_string),
            streams,
            pages: text(7).map(unescape_literal),
            venue: text(8).map(unescape_literal),
            year: text(9)?.parse().ok()?,
        })
    }
}
