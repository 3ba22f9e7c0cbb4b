pub mod create;
pub mod index;
pub mod path;
pub mod suggest;

use std::sync::mpsc;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;

use crate::model::config::{PeopleSettings, SettingKey, SettingsStore};
use crate::msg::Msg;
use crate::vault::{Vault, VaultEvent};
use index::NameIndex;
use suggest::{MentionSuggestor, SharedSettings};

/// The `@people` extension: keeps the name index in step with the vault and
/// owns the mention suggestor that reads it.
pub struct AtPeople {
    settings: SharedSettings,
    store: Box<dyn SettingsStore>,
    vault: Arc<dyn Vault>,
    index: NameIndex,
    suggestor: MentionSuggestor,
}

impl AtPeople {
    pub fn new(
        settings: PeopleSettings,
        store: Box<dyn SettingsStore>,
        vault: Arc<dyn Vault>,
        notify_tx: mpsc::Sender<Msg>,
    ) -> Self {
        let index = NameIndex::new(settings.people_folder.clone());
        let settings = Arc::new(RwLock::new(settings));
        let suggestor = MentionSuggestor::new(
            Arc::clone(&settings),
            index.subscribe(),
            Arc::clone(&vault),
            notify_tx,
        );

        Self {
            settings,
            store,
            vault,
            index,
            suggestor,
        }
    }

    pub fn suggestor(&self) -> &MentionSuggestor {
        &self.suggestor
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    pub fn settings(&self) -> PeopleSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build the index from every file in the vault. Run once the vault is loaded.
    pub fn initialize(&mut self) -> Result<()> {
        let files = self.vault.all_files()?;
        self.index.rebuild(files);
        Ok(())
    }

    pub fn handle_vault_event(&mut self, event: &VaultEvent) -> bool {
        match event {
            VaultEvent::Created { path } | VaultEvent::Modified { path } => {
                self.index.on_file_created_or_modified(path)
            }
            VaultEvent::Deleted { path } => self.index.on_file_deleted(path),
            VaultEvent::Renamed { new_path, old_path } => {
                self.index.on_file_renamed(new_path, old_path)
            }
        }
    }

    /// Change one setting and persist the full settings.
    ///
    /// A new people folder changes index membership, so the index is rebuilt.
    /// The applied setting is saved even when that rebuild fails; the rebuild
    /// error is returned afterwards.
    pub fn update_setting(&mut self, key: SettingKey, value: &str) -> Result<()> {
        let updated = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            settings.set(key, value)?;
            settings.clone()
        };
        tracing::info!(setting = key.name(), value = %updated.get(key), "setting changed");

        let rebuilt = if updated.people_folder != self.index.people_folder() {
            self.index.set_people_folder(updated.people_folder.clone());
            self.initialize()
        } else {
            Ok(())
        };

        self.store.save(&updated)?;
        rebuilt
    }
}
