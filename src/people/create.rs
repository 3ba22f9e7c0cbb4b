use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use super::path::normalize_path;
use crate::msg::Msg;
use crate::vault::{Vault, VaultError};

/// Vault path of the note created for a new person.
pub fn person_file_path(people_folder: &str, name: &str) -> String {
    normalize_path(&format!("{people_folder}/@{name}.md"))
}

/// Initial bytes for a new person note. No template, or a template path that
/// does not resolve to a file, yields empty content.
pub fn template_content(vault: &dyn Vault, template: Option<&str>) -> Result<Vec<u8>, VaultError> {
    let Some(template) = template.filter(|t| !t.is_empty()) else {
        return Ok(Vec::new());
    };

    if vault.resolve(template).is_none() {
        tracing::warn!(template, "template file not found, creating empty person note");
        return Ok(Vec::new());
    }

    vault.read_binary(template)
}

pub fn create_person_file(
    vault: &dyn Vault,
    path: &str,
    template: Option<&str>,
) -> Result<(), VaultError> {
    let content = template_content(vault, template)?;
    vault.create_binary(path, &content)?;
    tracing::info!(path, bytes = content.len(), "person note created");
    Ok(())
}

/// Create the person note on a background thread.
///
/// Nothing orders this against the link insertion that follows, and there is
/// no cancellation. A failure is logged and reported once to the host as a
/// [`Msg::Notify`]; it never reaches the caller.
pub fn spawn_person_file_creation(
    vault: Arc<dyn Vault>,
    path: String,
    template: Option<String>,
    notify_tx: mpsc::Sender<Msg>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(err) = create_person_file(vault.as_ref(), &path, template.as_deref()) {
            tracing::error!("creating person note {path} failed: {err}");
            let _ = notify_tx.send(Msg::Notify(format!("could not create {path}: {err}")));
        }
    })
}
