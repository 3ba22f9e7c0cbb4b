use std::sync::mpsc;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;

use super::create::{person_file_path, spawn_person_file_creation};
use super::index::IndexHandle;
use super::path::last_name_token;
use crate::editor::Editor;
use crate::model::config::PeopleSettings;
use crate::model::cursor::EditorPosition;
use crate::msg::Msg;
use crate::vault::Vault;

pub type SharedSettings = Arc<RwLock<PeopleSettings>>;

/// An in-progress `@mention`: the range from the `@` to the cursor, and the
/// text typed after the `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContext {
    pub start: EditorPosition,
    pub end: EditorPosition,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    /// Link to a person already in the index.
    Existing,
    /// Link to a new person named by the raw query.
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub display_text: String,
}

impl Suggestion {
    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Existing,
            display_text: name.into(),
        }
    }

    pub fn create(query: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Create,
            display_text: query.into(),
        }
    }

    /// Label shown in the popup.
    pub fn render(&self) -> String {
        match self.kind {
            SuggestionKind::Existing => self.display_text.clone(),
            SuggestionKind::Create => format!("New person: {}", self.display_text),
        }
    }
}

/// Detect an `@mention` ending at `cursor` on `line`.
///
/// The `@` must start the line or follow a space, at least one character must
/// have been typed after it, and the typed text must not contain `]]`.
pub fn detect_trigger(line: &str, cursor: EditorPosition) -> Option<TriggerContext> {
    let left: Vec<char> = line.chars().take(cursor.ch).collect();
    let at = left.iter().rposition(|&c| c == '@')?;
    let query: String = left[at + 1..].iter().collect();

    if query.is_empty() || query.contains("]]") {
        return None;
    }
    if at > 0 && left[at - 1] != ' ' {
        return None;
    }

    Some(TriggerContext {
        start: EditorPosition::new(cursor.line, at),
        end: EditorPosition::new(cursor.line, left.len()),
        query,
    })
}

/// Wiki link inserted for `name` under the current link settings.
pub fn link_text(settings: &PeopleSettings, name: &str) -> String {
    let folder = &settings.people_folder;

    if settings.use_explicit_links && settings.use_last_name_folder {
        let last_name = last_name_token(name)
            .map(|token| format!("{token}/"))
            .unwrap_or_default();
        format!("[[{folder}{last_name}@{name}.md|@{name}]]")
    } else if settings.use_explicit_links {
        format!("[[{folder}@{name}.md|@{name}]]")
    } else {
        format!("[[@{name}]]")
    }
}

/// Autocomplete source for `@mentions`.
pub struct MentionSuggestor {
    settings: SharedSettings,
    index: IndexHandle,
    vault: Arc<dyn Vault>,
    notify_tx: mpsc::Sender<Msg>,
}

impl MentionSuggestor {
    pub fn new(
        settings: SharedSettings,
        index: IndexHandle,
        vault: Arc<dyn Vault>,
        notify_tx: mpsc::Sender<Msg>,
    ) -> Self {
        Self {
            settings,
            index,
            vault,
            notify_tx,
        }
    }

    fn settings(&self) -> PeopleSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run trigger detection against the editor's cursor line.
    pub fn on_trigger(&self, editor: &dyn Editor) -> Option<TriggerContext> {
        let cursor = editor.cursor();
        let line = editor.line(cursor.line)?;
        detect_trigger(&line, cursor)
    }

    /// Case-insensitive prefix matches in index order, then one create entry.
    pub fn suggestions(&self, context: &TriggerContext) -> Vec<Suggestion> {
        let query = context.query.to_lowercase();
        let people = self.index.current();

        people
            .keys()
            .filter(|name| name.to_lowercase().starts_with(&query))
            .map(|name| Suggestion::existing(name.as_str()))
            .chain(std::iter::once(Suggestion::create(context.query.as_str())))
            .collect()
    }

    /// Insert the link for `suggestion` over the range recorded in `context`.
    ///
    /// A create suggestion also starts writing the new person note in the
    /// background when enabled; the handle is returned for callers that want
    /// to wait, and the link is inserted whatever the write's outcome.
    pub fn select(
        &self,
        suggestion: &Suggestion,
        context: &TriggerContext,
        editor: &mut dyn Editor,
    ) -> Option<JoinHandle<()>> {
        let settings = self.settings();
        let link = link_text(&settings, &suggestion.display_text);

        let creation = (suggestion.kind == SuggestionKind::Create
            && settings.create_file_on_new_person)
            .then(|| {
                let path = person_file_path(&settings.people_folder, &suggestion.display_text);
                tracing::debug!(path, "creating person note for new mention");
                spawn_person_file_creation(
                    Arc::clone(&self.vault),
                    path,
                    settings.template_file.clone(),
                    self.notify_tx.clone(),
                )
            });

        editor.replace_range(&link, context.start, context.end);
        creation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::buffer::Buffer;
    use crate::people::index::NameIndex;
    use crate::vault::FsVault;

    fn trigger(line: &str, ch: usize) -> Option<TriggerContext> {
        detect_trigger(line, EditorPosition::new(0, ch))
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        vault: Arc<dyn Vault>,
        settings: SharedSettings,
        index: NameIndex,
        suggestor: MentionSuggestor,
        rx: mpsc::Receiver<Msg>,
    }

    fn fixture(people: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault: Arc<dyn Vault> = Arc::new(FsVault::new(dir.path().to_path_buf()));
        let settings: SharedSettings = Arc::new(RwLock::new(PeopleSettings::default()));
        let mut index = NameIndex::new("People/");
        index.rebuild(people.iter().map(|name| format!("People/@{name}.md")));
        let (tx, rx) = mpsc::channel();
        let suggestor =
            MentionSuggestor::new(Arc::clone(&settings), index.subscribe(), Arc::clone(&vault), tx);

        Fixture {
            _dir: dir,
            vault,
            settings,
            index,
            suggestor,
            rx,
        }
    }

    fn context(query: &str) -> TriggerContext {
        TriggerContext {
            start: EditorPosition::new(0, 0),
            end: EditorPosition::new(0, query.chars().count() + 1),
            query: query.to_string(),
        }
    }

    #[test]
    fn trigger_after_space() {
        assert_eq!(
            trigger("Hello @Bo", 9),
            Some(TriggerContext {
                start: EditorPosition::new(0, 6),
                end: EditorPosition::new(0, 9),
                query: "Bo".to_string(),
            })
        );
    }

    #[test]
    fn trigger_at_line_start_ignores_text_after_cursor() {
        let ctx = trigger("@Bo]]", 3).expect("trigger");
        assert_eq!(ctx.query, "Bo");
        assert_eq!(ctx.start, EditorPosition::new(0, 0));
    }

    #[test]
    fn no_trigger_inside_word() {
        assert_eq!(trigger("foo@Bo", 6), None);
        assert_eq!(trigger("mail me at a@b.c", 16), None);
    }

    #[test]
    fn no_trigger_for_empty_query() {
        assert_eq!(trigger("Hello @", 7), None);
        assert_eq!(trigger("no mention", 10), None);
    }

    #[test]
    fn no_trigger_after_closed_link() {
        assert_eq!(trigger("[[@Bob]] x", 10), None);
        assert_eq!(trigger("see @Bob]] x", 12), None);
    }

    #[test]
    fn trigger_uses_last_at_sign() {
        let ctx = trigger("@Al and @Bea", 12).expect("trigger");
        assert_eq!(ctx.query, "Bea");
        assert_eq!(ctx.start.ch, 8);
    }

    #[test]
    fn query_may_contain_spaces() {
        let ctx = trigger("met @Bob Do", 11).expect("trigger");
        assert_eq!(ctx.query, "Bob Do");
    }

    #[test]
    fn trigger_counts_chars_not_bytes() {
        let ctx = trigger("café @Zoë", 9).expect("trigger");
        assert_eq!(ctx.query, "Zoë");
        assert_eq!(ctx.start, EditorPosition::new(0, 5));
        assert_eq!(ctx.end, EditorPosition::new(0, 9));
    }

    #[test]
    fn cursor_past_line_end_is_clamped() {
        let ctx = trigger("@Bo", 40).expect("trigger");
        assert_eq!(ctx.end, EditorPosition::new(0, 3));
    }

    #[test]
    fn suggestions_are_prefix_matches_plus_create() {
        let f = fixture(&["Bob Dole", "Bobby", "Alice"]);

        let lower = f.suggestor.suggestions(&context("bo"));
        assert_eq!(
            lower,
            vec![
                Suggestion::existing("Bob Dole"),
                Suggestion::existing("Bobby"),
                Suggestion::create("bo"),
            ]
        );

        let upper = f.suggestor.suggestions(&context("BO"));
        assert_eq!(upper[..2], lower[..2]);
        assert_eq!(upper[2], Suggestion::create("BO"));
    }

    #[test]
    fn create_entry_is_always_last() {
        let f = fixture(&["Alice"]);

        assert_eq!(
            f.suggestor.suggestions(&context("zed")),
            vec![Suggestion::create("zed")]
        );
        assert_eq!(
            f.suggestor.suggestions(&context("Alice")),
            vec![Suggestion::existing("Alice"), Suggestion::create("Alice")]
        );
    }

    #[test]
    fn suggestions_follow_index_updates() {
        let mut f = fixture(&[]);
        assert_eq!(f.suggestor.suggestions(&context("an")).len(), 1);

        f.index.on_file_created_or_modified("People/@Ann.md");

        assert_eq!(
            f.suggestor.suggestions(&context("an"))[0],
            Suggestion::existing("Ann")
        );
    }

    #[test]
    fn render_labels() {
        assert_eq!(Suggestion::existing("Bob Dole").render(), "Bob Dole");
        assert_eq!(Suggestion::create("Bo").render(), "New person: Bo");
    }

    #[test]
    fn link_text_by_settings() {
        let mut settings = PeopleSettings::default();
        assert_eq!(link_text(&settings, "Bob Dole"), "[[@Bob Dole]]");

        settings.use_explicit_links = true;
        assert_eq!(
            link_text(&settings, "Bob Dole"),
            "[[People/@Bob Dole.md|@Bob Dole]]"
        );

        settings.use_last_name_folder = true;
        assert_eq!(
            link_text(&settings, "Bob Dole"),
            "[[People/Dole/@Bob Dole.md|@Bob Dole]]"
        );
        assert_eq!(link_text(&settings, "Bob "), "[[People/@Bob .md|@Bob ]]");
    }

    #[test]
    fn last_name_folder_alone_is_ignored() {
        let settings = PeopleSettings {
            use_last_name_folder: true,
            ..PeopleSettings::default()
        };
        assert_eq!(link_text(&settings, "Bob Dole"), "[[@Bob Dole]]");
    }

    #[test]
    fn selecting_existing_person_replaces_trigger_range() {
        let f = fixture(&["Bob Dole"]);
        let mut buffer = Buffer::from_text("Hello @Bo");
        buffer.cursor.move_to(0, 9);

        let ctx = f.suggestor.on_trigger(&buffer).expect("trigger");
        let choice = f.suggestor.suggestions(&ctx)[0].clone();
        let handle = f.suggestor.select(&choice, &ctx, &mut buffer);

        assert!(handle.is_none());
        assert_eq!(buffer.line_text(0).as_deref(), Some("Hello [[@Bob Dole]]"));
    }

    #[test]
    fn selecting_create_writes_empty_note_and_uses_recorded_range() {
        let f = fixture(&[]);
        let mut buffer = Buffer::from_text("Met @Zed today");
        buffer.cursor.move_to(0, 8);

        let ctx = f.suggestor.on_trigger(&buffer).expect("trigger");
        // The cursor moves before the choice is made.
        buffer.cursor.move_to(0, 14);

        let choice = Suggestion::create(ctx.query.clone());
        let handle = f
            .suggestor
            .select(&choice, &ctx, &mut buffer)
            .expect("creation started");
        handle.join().expect("creation thread");

        assert_eq!(buffer.line_text(0).as_deref(), Some("Met [[@Zed]] today"));
        assert_eq!(f.vault.read_binary("People/@Zed.md").expect("note"), b"");
        assert!(f.rx.try_recv().is_err());
    }

    #[test]
    fn create_disabled_only_inserts_link() {
        let f = fixture(&[]);
        f.settings
            .write()
            .expect("settings lock")
            .create_file_on_new_person = false;
        let mut buffer = Buffer::from_text("@Zed");
        buffer.cursor.move_to(0, 4);

        let ctx = f.suggestor.on_trigger(&buffer).expect("trigger");
        let handle = f
            .suggestor
            .select(&Suggestion::create("Zed"), &ctx, &mut buffer);

        assert!(handle.is_none());
        assert_eq!(buffer.line_text(0).as_deref(), Some("[[@Zed]]"));
        assert!(f.vault.resolve("People/@Zed.md").is_none());
    }

    #[test]
    fn failed_creation_still_inserts_link() {
        let f = fixture(&[]);
        f.vault.create_binary("People/@Zed.md", b"old").expect("existing");
        let mut buffer = Buffer::from_text("@Zed");
        buffer.cursor.move_to(0, 4);

        let ctx = f.suggestor.on_trigger(&buffer).expect("trigger");
        f.suggestor
            .select(&Suggestion::create("Zed"), &ctx, &mut buffer)
            .expect("creation started")
            .join()
            .expect("creation thread");

        assert_eq!(buffer.line_text(0).as_deref(), Some("[[@Zed]]"));
        assert!(matches!(f.rx.try_recv(), Ok(Msg::Notify(_))));
    }

    #[test]
    fn created_note_uses_template_and_explicit_link() {
        let f = fixture(&[]);
        f.vault
            .create_binary("Templates/person.md", b"# Person\n")
            .expect("template");
        {
            let mut settings = f.settings.write().expect("settings lock");
            settings.use_explicit_links = true;
            settings.use_last_name_folder = true;
            settings.template_file = Some("Templates/person.md".to_string());
        }
        let mut buffer = Buffer::from_text("@Ada Lovelace");
        buffer.cursor.move_to(0, 13);

        let ctx = f.suggestor.on_trigger(&buffer).expect("trigger");
        f.suggestor
            .select(&Suggestion::create(ctx.query.clone()), &ctx, &mut buffer)
            .expect("creation started")
            .join()
            .expect("creation thread");

        assert_eq!(
            buffer.line_text(0).as_deref(),
            Some("[[People/Lovelace/@Ada Lovelace.md|@Ada Lovelace]]")
        );
        assert_eq!(
            f.vault.read_binary("People/@Ada Lovelace.md").expect("note"),
            b"# Person\n"
        );
    }
}
