//! Raw records produced while parsing a dump entry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bibliographic type of a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PubType {
    Journal,
    Conference,
    Book,
    Chapter,
    Thesis,
    Report,
    Software,
    Other,
}

impl PubType {
    /// Map a dblp `bibtexType` (case-insensitive) onto the fixed vocabulary.
    #[must_use]
    pub fn from_bibtex(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "article" => Self::Journal,
            "inproceedings" => Self::Conference,
            "proceedings" | "book" => Self::Book,
            "incollection" => Self::Chapter,
            "phdthesis" | "mastersthesis" | "habil" => Self::Thesis,
            "informal" => Self::Report,
            "software" | "data" => Self::Software,
            _ => Self::Other,
        }
    }

    /// Map a HAL `docType_s` code onto the fixed vocabulary.
    #[must_use]
    pub fn from_hal(raw: &str) -> Self {
        match raw {
            "ART" => Self::Journal,
            "COMM" => Self::Conference,
            "OUV" => Self::Book,
            "COUV" => Self::Chapter,
            "THESE" | "HDR" => Self::Thesis,
            "UNDEFINED" | "REPORT" => Self::Report,
            "SOFTWARE" => Self::Software,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Conference => "conference",
            Self::Book => "book",
            Self::Chapter => "chapter",
            Self::Thesis => "thesis",
            Self::Report => "report",
            Self::Software => "software",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed dump entry. Ephemeral: consumed by the ingestor, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub key: String,
    pub title: String,
    pub kind: PubType,
    /// `(author identifier, display name)` pairs, one per distinct identifier.
    pub authors: Vec<(String, String)>,
    pub url: Option<String>,
    pub streams: Option<Vec<String>>,
    pub pages: Option<String>,
    pub venue: Option<String>,
    pub year: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bibtex_types_map_to_vocabulary() {
        assert_eq!(PubType::from_bibtex("Article"), PubType::Journal);
        assert_eq!(PubType::from_bibtex("Inproceedings"), PubType::Conference);
        assert_eq!(PubType::from_bibtex("Incollection"), PubType::Chapter);
        assert_eq!(PubType::from_bibtex("Phdthesis"), PubType::Thesis);
        assert_eq!(PubType::from_bibtex("Informal"), PubType::Report);
        assert_eq!(PubType::from_bibtex("Misc"), PubType::Other);
        assert_eq!(PubType::from_hal("COMM").to_string(), "conference");
    }
}
