//! Author identities assembled from several sources.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::CanonicalRecord;
use super::rank::{AuthorRules, Linkable, ScoringRules};
use crate::text::clean_aliases;
use crate::types::{DblpAuthor, HalAuthor, HalKey, Origin, SourceAuthor, SourcePublication};

/// One person as known by every source that matched them, best source first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedAuthor {
    pub name: String,
    pub sources: Vec<SourceAuthor>,
}

impl SourcedAuthor {
    /// Rank `sources` and take the display name of the best one.
    #[must_use]
    pub fn from_sources(mut sources: Vec<SourceAuthor>) -> Option<Self> {
        sources.sort_by_cached_key(|source| {
            (Reverse(AuthorRules.rank(source)), source.stable_key())
        });
        let name = sources.first()?.name().to_string();
        Some(Self { name, sources })
    }

    /// Identity from an author cluster; members are already ranked.
    #[must_use]
    pub fn from_cluster(cluster: CanonicalRecord<SourceAuthor>) -> Self {
        let name = cluster.representative().name().to_string();
        Self {
            name,
            sources: cluster.into_members(),
        }
    }

    /// Key of the best source.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        self.sources.first().and_then(SourceAuthor::key)
    }

    /// Every other spelling across all sources, sorted, without the main name.
    #[must_use]
    pub fn aliases(&self) -> Vec<String> {
        let spellings = self.sources.iter().flat_map(|source| {
            iter::once(source.name()).chain(source.aliases().iter().map(String::as_str))
        });
        clean_aliases(&self.name, spellings)
    }
}

pub fn merge_author_sources(sources: Vec<SourceAuthor>) -> Option<SourcedAuthor> {
    SourcedAuthor::from_sources(sources)
}

/// A publication author after redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkedAuthor {
    Merged(Arc<SourcedAuthor>),
    Unmatched(SourceAuthor),
}

impl LinkedAuthor {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Merged(author) => &author.name,
            Self::Unmatched(author) => author.name(),
        }
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged(_))
    }
}

/// Lookup from any source key, name or alias to a merged identity.
///
/// When two identities claim the same string, the first one registered keeps it.
#[derive(Debug, Clone, Default)]
pub struct AuthorRedirect {
    identities: Vec<Arc<SourcedAuthor>>,
    lookup: HashMap<String, usize>,
}

impl AuthorRedirect {
    pub fn new<I>(identities: I) -> Self
    where
        I: IntoIterator<Item = SourcedAuthor>,
    {
        let mut redirect = Self::default();
        for identity in identities {
            let slot = redirect.identities.len();
            for source in &identity.sources {
                let names = iter::once(source.name().to_string())
                    .chain(source.aliases().iter().cloned());
                for target in source.key().into_iter().chain(names) {
                    redirect.lookup.entry(target).or_insert(slot);
                }
            }
            redirect.identities.push(Arc::new(identity));
        }
        redirect
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Match by key first, then by display name.
    #[must_use]
    pub fn resolve(&self, author: &SourceAuthor) -> Option<&Arc<SourcedAuthor>> {
        author
            .key()
            .and_then(|key| self.lookup.get(&key))
            .or_else(|| self.lookup.get(author.name()))
            .map(|&slot| &self.identities[slot])
    }

    #[must_use]
    pub fn link(&self, author: SourceAuthor) -> LinkedAuthor {
        match self.resolve(&author) {
            Some(identity) => LinkedAuthor::Merged(Arc::clone(identity)),
            None => LinkedAuthor::Unmatched(author),
        }
    }
}

/// A source publication whose authors point at merged identities where possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedPublication {
    pub publication: SourcePublication,
    pub authors: Vec<LinkedAuthor>,
}

pub fn redirect_authors<I>(publications: I, redirect: &AuthorRedirect) -> Vec<LinkedPublication>
where
    I: IntoIterator<Item = SourcePublication>,
{
    publications
        .into_iter()
        .map(|publication| {
            let authors = publication
                .authors()
                .into_iter()
                .map(|author| redirect.link(author))
                .collect();
            LinkedPublication {
                publication,
                authors,
            }
        })
        .collect()
}

/// Display extras attached to a declared author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorMetadata {
    pub url: Option<String>,
    pub img: Option<String>,
    pub group: Option<String>,
}

/// A source key pinned in an author declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePin {
    Hal(HalKey),
    Dblp(String),
    /// Key into the local mirror; resolved against a loaded [`Mirror`](crate::Mirror).
    Mirror(String),
}

/// An author declared as `Name (hal:key, ldb:key, url:..., img:..., group:...)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorSpec {
    pub name: String,
    pub pins: Vec<SourcePin>,
    pub metadata: AuthorMetadata,
}

impl AuthorSpec {
    /// Unknown or malformed entries inside the parentheses are skipped with a warning.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (name, body) = match raw.find('(') {
            Some(open) if raw.ends_with(')') => (&raw[..open], Some(&raw[open + 1..raw.len() - 1])),
            _ => (raw, None),
        };
        let mut spec = Self {
            name: name.trim().to_string(),
            ..Self::default()
        };
        for entry in body.into_iter().flat_map(|body| body.split(',')) {
            let Some((field, value)) = entry.split_once(':') else {
                tracing::warn!(
                    entry = entry.trim(),
                    author = %spec.name,
                    "ignoring entry without a colon"
                );
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            match (Origin::parse(&field), field.as_str()) {
                (Some(Origin::Hal), _) => spec.pins.push(SourcePin::Hal(HalKey::detect(&value))),
                (Some(Origin::Dblp), _) => spec.pins.push(SourcePin::Dblp(value)),
                (Some(Origin::Mirror), _) => spec.pins.push(SourcePin::Mirror(value)),
                (None, "url") => spec.metadata.url = Some(value),
                (None, "img") => spec.metadata.img = Some(value),
                (None, "group") => spec.metadata.group = Some(value),
                (None, _) => {
                    tracing::warn!(
                        field = %field,
                        author = %spec.name,
                        "ignoring unknown author field"
                    );
                }
            }
        }
        spec
    }

    /// HAL and dblp pins as source authors carrying the declared name.
    #[must_use]
    pub fn pinned_sources(&self) -> Vec<SourceAuthor> {
        self.pins
            .iter()
            .filter_map(|pin| match pin {
                SourcePin::Hal(key) => Some(SourceAuthor::Hal(HalAuthor {
                    name: self.name.clone(),
                    key: Some(key.clone()),
                    aliases: Vec::new(),
                })),
                SourcePin::Dblp(pid) => Some(SourceAuthor::Dblp(DblpAuthor {
                    name: self.name.clone(),
                    pid: Some(pid.clone()),
                    aliases: Vec::new(),
                })),
                SourcePin::Mirror(_) => None,
            })
            .collect()
    }

    pub fn mirror_keys(&self) -> impl Iterator<Item = &str> {
        self.pins.iter().filter_map(|pin| match pin {
            SourcePin::Mirror(key) => Some(key.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DblpPublication, PubType};

    fn hal(name: &str, key: &str, aliases: &[&str]) -> SourceAuthor {
        SourceAuthor::Hal(HalAuthor {
            name: name.into(),
            key: Some(HalKey::detect(key)),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        })
    }

    fn dblp(name: &str, pid: &str) -> SourceAuthor {
        SourceAuthor::Dblp(DblpAuthor {
            name: name.into(),
            pid: Some(pid.into()),
            aliases: vec![],
        })
    }

    #[test]
    fn best_source_names_the_identity() {
        let merged = merge_author_sources(vec![
            dblp("Fabien Mathieu", "66/2077"),
            hal("Fabien Mathieu", "Fabien Mathieu", &[]),
            hal("F. Mathieu", "fabien-mathieu", &["Fabien Mathieu"]),
        ])
        .unwrap();
        assert_eq!(merged.name, "F. Mathieu");
        assert_eq!(merged.key().as_deref(), Some("fabien-mathieu"));
        assert_eq!(merged.sources[1].origin(), Origin::Dblp);
        assert_eq!(merged.aliases(), vec!["Fabien Mathieu"]);
        assert!(merge_author_sources(vec![]).is_none());
    }

    #[test]
    fn redirection_prefers_keys_then_names() {
        let identity = merge_author_sources(vec![
            hal("Ana Busic", "ana-busic", &["Ana Bušić"]),
            dblp("Ana Busic", "00/3181"),
        ])
        .unwrap();
        let redirect = AuthorRedirect::new([identity]);
        assert_eq!(redirect.len(), 1);

        let by_key = dblp("A. Busic", "00/3181");
        let by_alias = SourceAuthor::Hal(HalAuthor {
            name: "Ana Bušić".into(),
            key: None,
            aliases: vec![],
        });
        let stranger = dblp("Bruno Kauffmann", "14/1000");
        assert!(redirect.link(by_key).is_merged());
        assert!(redirect.link(by_alias).is_merged());
        assert!(!redirect.link(stranger.clone()).is_merged());

        let publication = SourcePublication::Dblp(DblpPublication {
            key: "conf/x/1".into(),
            title: "A paper".into(),
            authors: vec![
                DblpAuthor {
                    name: "Ana Busic".into(),
                    pid: Some("00/3181".into()),
                    aliases: vec![],
                },
                DblpAuthor {
                    name: "Bruno Kauffmann".into(),
                    pid: Some("14/1000".into()),
                    aliases: vec![],
                },
            ],
            venue: None,
            kind: PubType::Conference,
            year: 2015,
            url: None,
            pages: None,
        });
        let linked = redirect_authors([publication], &redirect);
        assert_eq!(linked[0].authors[0].name(), "Ana Busic");
        assert!(linked[0].authors[0].is_merged());
        assert_eq!(linked[0].authors[1], LinkedAuthor::Unmatched(stranger));
    }

    #[test]
    fn declarations_pin_sources_and_metadata() {
        let spec = AuthorSpec::parse(
            "My Name(img: https://my.url.img, group:me,url:https://mysite.org,\
             hal:key1,ldb:toto,badkey:hello,no_colon_separator)",
        );
        assert_eq!(spec.name, "My Name");
        assert_eq!(spec.metadata.url.as_deref(), Some("https://mysite.org"));
        assert_eq!(spec.metadata.img.as_deref(), Some("https://my.url.img"));
        assert_eq!(spec.metadata.group.as_deref(), Some("me"));
        assert_eq!(
            spec.pins,
            vec![
                SourcePin::Hal(HalKey::IdHal("key1".into())),
                SourcePin::Mirror("toto".into())
            ]
        );
        assert_eq!(spec.mirror_keys().collect::<Vec<_>>(), vec!["toto"]);
        assert_eq!(spec.pinned_sources().len(), 1);

        let several = AuthorSpec::parse("My Name (hal:key1,hal:123456,hal: My Other Name )");
        assert_eq!(
            several.pins,
            vec![
                SourcePin::Hal(HalKey::IdHal("key1".into())),
                SourcePin::Hal(HalKey::Person(123_456)),
                SourcePin::Hal(HalKey::FullName("My Other Name".into())),
            ]
        );

        let bare = AuthorSpec::parse("  Plain Name ");
        assert_eq!(bare.name, "Plain Name");
        assert!(bare.pins.is_empty());
    }
}
