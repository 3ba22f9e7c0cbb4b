use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::people::path::{normalize_folder, normalize_path};

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub editor: EditorConfig,
    pub people: PeopleSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub vault_path: String,
    pub scratch_file: String,
    pub auto_save_debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    pub scroll_off: u16,
}

/// Settings of the people mention extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeopleSettings {
    pub people_folder: String,
    pub create_file_on_new_person: bool,
    #[serde(default)]
    pub use_explicit_links: bool,
    #[serde(default)]
    pub use_last_name_folder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_file: Option<String>,
}

impl Default for PeopleSettings {
    fn default() -> Self {
        Self {
            people_folder: "People/".to_string(),
            create_file_on_new_person: true,
            use_explicit_links: false,
            use_last_name_folder: false,
            template_file: None,
        }
    }
}

/// Setting names accepted by `:set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    PeopleFolder,
    ExplicitLinks,
    LastNameFolder,
    CreateFile,
    TemplateFile,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::PeopleFolder,
        SettingKey::ExplicitLinks,
        SettingKey::LastNameFolder,
        SettingKey::CreateFile,
        SettingKey::TemplateFile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingKey::PeopleFolder => "people_folder",
            SettingKey::ExplicitLinks => "explicit_links",
            SettingKey::LastNameFolder => "last_name_folder",
            SettingKey::CreateFile => "create_file",
            SettingKey::TemplateFile => "template_file",
        }
    }
}

impl FromStr for SettingKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "people_folder" | "folder" => Ok(SettingKey::PeopleFolder),
            "explicit_links" => Ok(SettingKey::ExplicitLinks),
            "last_name_folder" => Ok(SettingKey::LastNameFolder),
            "create_file" | "create_file_on_new_person" => Ok(SettingKey::CreateFile),
            "template_file" | "template" => Ok(SettingKey::TemplateFile),
            other => Err(anyhow!("unknown setting: {other}")),
        }
    }
}

impl PeopleSettings {
    /// Apply a textual value to one setting. Paths are normalized.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            SettingKey::PeopleFolder => self.people_folder = normalize_folder(value),
            SettingKey::ExplicitLinks => self.use_explicit_links = parse_bool(value)?,
            SettingKey::LastNameFolder => self.use_last_name_folder = parse_bool(value)?,
            SettingKey::CreateFile => self.create_file_on_new_person = parse_bool(value)?,
            SettingKey::TemplateFile => {
                self.template_file = match value {
                    "" | "none" => None,
                    path => Some(normalize_path(path)),
                };
            }
        }
        Ok(())
    }

    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::PeopleFolder => self.people_folder.clone(),
            SettingKey::ExplicitLinks => on_off(self.use_explicit_links),
            SettingKey::LastNameFolder => on_off(self.use_last_name_folder),
            SettingKey::CreateFile => on_off(self.create_file_on_new_person),
            SettingKey::TemplateFile => self
                .template_file
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        }
    }

    /// One line per setting, for the status area.
    pub fn describe(&self) -> Vec<String> {
        SettingKey::ALL
            .iter()
            .map(|key| format!("{} = {}", key.name(), self.get(*key)))
            .collect()
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("expected on/off, got {other:?}"),
    }
}

fn on_off(value: bool) -> String {
    let label = if value { "on" } else { "off" };
    label.to_string()
}

/// Persistence for people settings. Called after every change.
pub trait SettingsStore {
    fn save(&self, settings: &PeopleSettings) -> Result<()>;
}

/// Writes the whole configuration file, with the latest people settings.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    general: GeneralConfig,
    editor: EditorConfig,
}

impl ConfigFile {
    pub fn new(path: PathBuf, config: &AppConfig) -> Self {
        Self {
            path,
            general: config.general.clone(),
            editor: config.editor.clone(),
        }
    }
}

impl SettingsStore for ConfigFile {
    fn save(&self, settings: &PeopleSettings) -> Result<()> {
        AppConfig {
            general: self.general.clone(),
            editor: self.editor.clone(),
            people: settings.clone(),
        }
        .save_to(&self.path)
    }
}

impl AppConfig {
    pub fn defaults() -> Result<Self> {
        Ok(toml::from_str(DEFAULT_CONFIG)?)
    }

    /// Load configuration with layering: defaults → user config. The user
    /// file is merged over the defaults key by key.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Self::defaults();
        }

        let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG)?;
        let user_str =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let user: toml::Table =
            toml::from_str(&user_str).with_context(|| format!("parsing {}", path.display()))?;
        merge_tables(&mut merged, user);

        let config: AppConfig = toml::Value::Table(merged).try_into()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "at-people")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Vault root with `~` expanded.
    pub fn vault_path(&self) -> PathBuf {
        let raw = &self.general.vault_path;
        if let Some(rest) = raw.strip_prefix('~')
            && let Some(home) = dirs_home()
        {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
        PathBuf::from(raw)
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.vault_path().join(&self.general.scratch_file)
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_extension_defaults() {
        let config = AppConfig::defaults().expect("defaults parse");
        assert_eq!(config.people, PeopleSettings::default());
    }

    #[test]
    fn user_file_overrides_only_named_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[people]\nuse_explicit_links = true\ntemplate_file = \"Templates/person.md\"\n",
        )
        .expect("write user config");

        let config = AppConfig::load_from(&path).expect("load");

        assert!(config.people.use_explicit_links);
        assert!(config.people.create_file_on_new_person);
        assert_eq!(config.people.people_folder, "People/");
        assert_eq!(
            config.people.template_file.as_deref(),
            Some("Templates/person.md")
        );
        assert_eq!(config.general.scratch_file, "scratch.md");
    }

    #[test]
    fn missing_user_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config.people, PeopleSettings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig::defaults().expect("defaults");
        let store = ConfigFile::new(path.clone(), &config);

        let mut settings = config.people.clone();
        settings.set(SettingKey::LastNameFolder, "on").expect("set");
        settings.set(SettingKey::PeopleFolder, "/Contacts//").expect("set");
        store.save(&settings).expect("save");

        let reloaded = AppConfig::load_from(&path).expect("reload");
        assert_eq!(reloaded.people, settings);
        assert_eq!(reloaded.people.people_folder, "Contacts/");
    }

    #[test]
    fn set_parses_booleans_and_template() {
        let mut settings = PeopleSettings::default();

        settings.set(SettingKey::CreateFile, "off").expect("set");
        assert!(!settings.create_file_on_new_person);
        assert!(settings.set(SettingKey::ExplicitLinks, "maybe").is_err());

        settings
            .set(SettingKey::TemplateFile, "Templates//person.md")
            .expect("set");
        assert_eq!(settings.template_file.as_deref(), Some("Templates/person.md"));
        settings.set(SettingKey::TemplateFile, "none").expect("set");
        assert_eq!(settings.template_file, None);
    }

    #[test]
    fn setting_keys_parse_with_aliases() {
        assert_eq!("folder".parse::<SettingKey>().ok(), Some(SettingKey::PeopleFolder));
        assert_eq!("template".parse::<SettingKey>().ok(), Some(SettingKey::TemplateFile));
        assert!("colour".parse::<SettingKey>().is_err());
    }

    #[test]
    fn vault_path_expands_home() {
        let mut config = AppConfig::defaults().expect("defaults");
        config.general.vault_path = "/srv/notes".to_string();
        assert_eq!(config.vault_path(), PathBuf::from("/srv/notes"));

        config.general.vault_path = "~/notes".to_string();
        if let Some(home) = dirs_home() {
            assert_eq!(config.vault_path(), home.join("notes"));
        }
    }
}
