//! Dense author dictionary filled while streaming publications.

use std::collections::HashMap;

use crate::error::Result;
use crate::io::frames::FrameStore;
use crate::types::{AuthorEntity, AuthorId, PublicationId};

#[derive(Debug)]
struct AuthorSlot {
    key: String,
    aliases: Vec<String>,
    publications: Vec<PublicationId>,
}

/// Maps external author identifiers to contiguous ids in first-sighting order.
#[derive(Debug, Default)]
pub struct AuthorDictionary {
    slots: Vec<AuthorSlot>,
    ids: HashMap<String, AuthorId>,
}

impl AuthorDictionary {
    /// Record that `key`, spelled `name`, signs publication `publication`.
    pub fn observe(&mut self, key: &str, name: &str, publication: PublicationId) -> AuthorId {
        if let Some(&id) = self.ids.get(key) {
            let slot = &mut self.slots[id as usize];
            if !slot.aliases.iter().any(|alias| alias == name) {
                slot.aliases.push(name.to_string());
            }
            if slot.publications.last() != Some(&publication) {
                slot.publications.push(publication);
            }
            return id;
        }
        let id = self.slots.len() as AuthorId;
        self.slots.push(AuthorSlot {
            key: key.to_string(),
            aliases: vec![name.to_string()],
            publications: vec![publication],
        });
        self.ids.insert(key.to_string(), id);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Compact into an author store in id order plus the key lookup table.
    pub fn into_store(
        self,
        frame_size: usize,
    ) -> Result<(FrameStore<AuthorEntity>, HashMap<String, AuthorId>)> {
        let Self { slots, ids } = self;
        let authors = FrameStore::build(frame_size, |store| {
            for (id, slot) in slots.into_iter().enumerate() {
                store.append(AuthorEntity {
                    id: id as AuthorId,
                    key: slot.key,
                    aliases: slot.aliases,
                    publications: slot.publications,
                })?;
            }
            Ok(())
        })?;
        Ok((authors, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_stable() {
        let mut dictionary = AuthorDictionary::default();
        assert_eq!(dictionary.observe("b", "Bee", 0), 0);
        assert_eq!(dictionary.observe("a", "Ay", 0), 1);
        assert_eq!(dictionary.observe("b", "B.", 1), 0);
        assert_eq!(dictionary.len(), 2);

        let (store, keys) = dictionary.into_store(1).unwrap();
        assert_eq!(keys["a"], 1);
        let bee = store.get(0).unwrap();
        assert_eq!(bee.aliases, vec!["Bee", "B."]);
        assert_eq!(bee.publications, vec![0, 1]);
        assert_eq!(bee.name(), "Bee");
    }
}
