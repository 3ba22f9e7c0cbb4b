use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::path::person_name;

/// Person name → vault path of the person's note.
pub type PeopleMap = BTreeMap<String, String>;

/// Read side of the name index.
///
/// The index republishes into the handle after every membership change, so a
/// read that follows a mutation on the event loop always sees it. Readers must
/// call [`IndexHandle::current`] per use rather than hold on to a snapshot.
#[derive(Debug, Clone, Default)]
pub struct IndexHandle {
    inner: Arc<RwLock<Arc<PeopleMap>>>,
}

impl IndexHandle {
    pub fn current(&self) -> Arc<PeopleMap> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    fn replace(&self, next: PeopleMap) {
        let next = Arc::new(next);
        match self.inner.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

/// Incrementally maintained mapping from person names to their note paths.
#[derive(Debug)]
pub struct NameIndex {
    people_folder: String,
    entries: PeopleMap,
    handle: IndexHandle,
}

impl NameIndex {
    pub fn new(people_folder: impl Into<String>) -> Self {
        Self {
            people_folder: people_folder.into(),
            entries: PeopleMap::new(),
            handle: IndexHandle::default(),
        }
    }

    /// Handle the suggestor reads published snapshots from.
    pub fn subscribe(&self) -> IndexHandle {
        self.handle.clone()
    }

    pub fn people_folder(&self) -> &str {
        &self.people_folder
    }

    /// Change the folder membership is matched against. Callers rebuild afterwards.
    pub fn set_people_folder(&mut self, people_folder: impl Into<String>) {
        self.people_folder = people_folder.into();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Clear and repopulate from the complete set of known vault paths.
    pub fn rebuild<I, S>(&mut self, all_paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entries.clear();

        for path in all_paths {
            let path = path.as_ref();
            if let Some(name) = person_name(path, &self.people_folder) {
                self.entries.insert(name.to_string(), path.to_string());
            }
        }

        tracing::info!(
            people = self.entries.len(),
            folder = %self.people_folder,
            "people index rebuilt"
        );
        self.publish();
    }

    /// Returns whether membership changed (and a new snapshot was published).
    pub fn on_file_created_or_modified(&mut self, path: &str) -> bool {
        let changed = self.insert_path(path);
        if changed {
            self.publish();
        }
        changed
    }

    /// Pure deletes leave the index untouched; only a rename away from a person
    /// path drops its entry. Stale entries persist until the next rebuild.
    pub fn on_file_deleted(&mut self, path: &str) -> bool {
        tracing::debug!(path, "delete notification ignored by people index");
        false
    }

    /// Drop the entry for the old path's name, then index the new path. A move
    /// that keeps the same name re-points the entry at `new_path`.
    pub fn on_file_renamed(&mut self, new_path: &str, old_path: &str) -> bool {
        let mut changed = false;

        if let Some(old_name) = person_name(old_path, &self.people_folder) {
            tracing::debug!(name = old_name, old_path, "person renamed away");
            self.entries.remove(old_name);
            changed = true;
        }

        changed |= self.insert_path(new_path);

        if changed {
            self.publish();
        }
        changed
    }

    fn insert_path(&mut self, path: &str) -> bool {
        let Some(name) = person_name(path, &self.people_folder) else {
            return false;
        };

        tracing::debug!(name, path, "person indexed");
        self.entries.insert(name.to_string(), path.to_string());
        true
    }

    fn publish(&self) {
        self.handle.replace(self.entries.clone());
    }
}
