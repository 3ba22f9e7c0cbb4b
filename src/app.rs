use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use regex::Regex;

use crate::model::buffer::Buffer;
use crate::model::config::{AppConfig, SettingKey};
use crate::model::mode::Mode;
use crate::model::path_suggest::PathCompletion;
use crate::msg::{Direction as MoveDir, Msg};
use crate::people::AtPeople;
use crate::people::suggest::{Suggestion, TriggerContext};
use crate::vault::{Vault, VaultEvent};

const MAX_POPUP_ROWS: usize = 8;
const MAX_NOTIFICATIONS: usize = 8;

static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[[^\]]+\]\]").expect("valid wikilink regex"));

/// Open mention popup: the trigger it was computed for and its candidates.
#[derive(Debug, Clone)]
struct MentionPopup {
    context: TriggerContext,
    suggestions: Vec<Suggestion>,
    selected: usize,
}

pub struct App {
    pub mode: Mode,
    pub buffer: Buffer,
    pub config: AppConfig,
    people: AtPeople,
    vault: Arc<dyn Vault>,
    popup: Option<MentionPopup>,
    command_input: String,
    completion: PathCompletion,
    pub should_quit: bool,
    notifications: VecDeque<String>,
}

impl App {
    pub fn new(config: AppConfig, people: AtPeople, vault: Arc<dyn Vault>) -> Result<Self> {
        std::fs::create_dir_all(config.vault_path())?;

        let scratch_path = config.scratch_path();
        let mut buffer = if scratch_path.exists() {
            Buffer::from_file(scratch_path)?
        } else {
            let mut buf = Buffer::new();
            buf.path = Some(scratch_path);
            buf
        };
        buffer.viewport.scroll_off = config.editor.scroll_off;

        let mut notifications = VecDeque::new();
        notifications.push_back(format!("{} people indexed", people.index().len()));

        Ok(Self {
            mode: Mode::Normal,
            buffer,
            config,
            people,
            vault,
            popup: None,
            command_input: String::new(),
            completion: PathCompletion::default(),
            should_quit: false,
            notifications,
        })
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key)?,
            Msg::Vault(event) => self.handle_vault_event(event),
            Msg::Notify(message) => self.push_notification(message),
            Msg::Tick => self.handle_tick(),
            Msg::Resize(_w, h) => {
                self.buffer.viewport.height = h.saturating_sub(1);
            }
        }
        Ok(())
    }

    fn push_notification(&mut self, message: String) {
        self.notifications.push_back(message);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    fn handle_vault_event(&mut self, event: VaultEvent) {
        let changed = self.people.handle_vault_event(&event);
        if changed && self.popup.is_some() {
            self.refresh_mention();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.mode {
            Mode::Normal => self.handle_key_normal(key),
            Mode::Insert => self.handle_key_insert(key),
            Mode::Command => self.handle_key_command(key),
        }
    }

    fn handle_key_normal(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('i') => self.mode = Mode::Insert,
            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.command_input.clear();
                self.completion.reset();
            }
            KeyCode::Char('q') => {
                self.save_buffer();
                self.should_quit = true;
            }
            KeyCode::Char('h') | KeyCode::Left => self.move_cursor(MoveDir::Left),
            KeyCode::Char('l') | KeyCode::Right => self.move_cursor(MoveDir::Right),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(MoveDir::Up),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(MoveDir::Down),
            KeyCode::Char('0') | KeyCode::Home => self.move_cursor(MoveDir::LineStart),
            KeyCode::Char('$') | KeyCode::End => self.move_cursor(MoveDir::LineEnd),
            _ => {}
        }
        Ok(())
    }

    fn handle_key_insert(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup.is_some() && self.handle_key_popup(key) {
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => {
                self.popup = None;
                self.mode = Mode::Normal;
                return Ok(());
            }
            KeyCode::Enter => {
                self.buffer.insert_newline();
                self.schedule_auto_save();
            }
            KeyCode::Backspace => {
                self.buffer.delete_char_before();
                self.schedule_auto_save();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.insert_char(ch);
                self.schedule_auto_save();
            }
            KeyCode::Left => self.move_cursor(MoveDir::Left),
            KeyCode::Right => self.move_cursor(MoveDir::Right),
            KeyCode::Up => self.move_cursor(MoveDir::Up),
            KeyCode::Down => self.move_cursor(MoveDir::Down),
            KeyCode::Home => self.move_cursor(MoveDir::LineStart),
            KeyCode::End => self.move_cursor(MoveDir::LineEnd),
            _ => return Ok(()),
        }

        self.refresh_mention();
        Ok(())
    }

    /// Keys the open popup consumes. Returns false to fall through to editing.
    fn handle_key_popup(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let Some(popup) = self.popup.as_mut() else {
            return false;
        };
        let last = popup.suggestions.len().saturating_sub(1);

        match key.code {
            KeyCode::Down => popup.selected = (popup.selected + 1).min(last),
            KeyCode::Char('n') if ctrl => popup.selected = (popup.selected + 1).min(last),
            KeyCode::Up => popup.selected = popup.selected.saturating_sub(1),
            KeyCode::Char('p') if ctrl => popup.selected = popup.selected.saturating_sub(1),
            KeyCode::Enter | KeyCode::Tab => self.accept_mention(),
            KeyCode::Esc => self.popup = None,
            _ => return false,
        }
        true
    }

    /// Re-run trigger detection for the cursor and rebuild the candidate list.
    fn refresh_mention(&mut self) {
        let suggestor = self.people.suggestor();
        let Some(context) = suggestor.on_trigger(&self.buffer) else {
            self.popup = None;
            return;
        };

        let suggestions = suggestor.suggestions(&context);
        let selected = match &self.popup {
            Some(prev) if prev.context.start == context.start => {
                prev.selected.min(suggestions.len().saturating_sub(1))
            }
            _ => 0,
        };

        self.popup = Some(MentionPopup {
            context,
            suggestions,
            selected,
        });
    }

    fn accept_mention(&mut self) {
        let Some(popup) = self.popup.take() else {
            return;
        };
        let Some(choice) = popup.suggestions.get(popup.selected) else {
            return;
        };

        // Fire-and-forget: creation failures come back as Msg::Notify.
        let _creation = self
            .people
            .suggestor()
            .select(choice, &popup.context, &mut self.buffer);
        self.schedule_auto_save();
    }

    fn handle_key_command(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_input.clear();
            }
            KeyCode::Enter => {
                let command = std::mem::take(&mut self.command_input);
                self.mode = Mode::Normal;
                self.execute_command(command.trim());
            }
            KeyCode::Tab => self.complete_command_path(),
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.command_input.push(ch);
            }
            _ => {}
        }

        Ok(())
    }

    fn execute_command(&mut self, command: &str) {
        let mut parts = command.splitn(3, ' ');
        match (parts.next().unwrap_or_default(), parts.next(), parts.next()) {
            ("w", None, None) => self.save_buffer(),
            ("q", None, None) | ("wq", None, None) => {
                self.save_buffer();
                self.should_quit = true;
            }
            ("settings", None, None) => {
                for line in self.people.settings().describe() {
                    self.push_notification(line);
                }
            }
            ("people", None, None) => {
                let index = self.people.index();
                let message = if index.is_empty() {
                    format!("no people in {}", index.people_folder())
                } else {
                    format!("{} people indexed", index.len())
                };
                self.push_notification(message);
            }
            ("people", Some(first), rest) => {
                let name = match rest {
                    Some(rest) => format!("{first} {rest}"),
                    None => first.to_string(),
                };
                let message = match self.people.index().get(&name) {
                    Some(path) => format!("@{name} → {path}"),
                    None => format!("@{name} is not indexed"),
                };
                self.push_notification(message);
            }
            ("set", Some(key), value) => self.apply_setting(key, value.unwrap_or_default()),
            ("", None, None) => {}
            _ => self.push_notification(format!("unknown command: {command}")),
        }
    }

    fn apply_setting(&mut self, key: &str, value: &str) {
        let result = key
            .parse::<SettingKey>()
            .and_then(|key| self.people.update_setting(key, value).map(|()| key));

        match result {
            Ok(key) => {
                let current = self.people.settings().get(key);
                self.push_notification(format!("{} = {current}", key.name()));
            }
            Err(err) => {
                tracing::warn!("setting {key} failed: {err:#}");
                self.push_notification(format!("set {key}: {err:#}"));
            }
        }
    }

    /// Tab-complete the value of `set people_folder` / `set template_file`.
    fn complete_command_path(&mut self) {
        let mut parts = self.command_input.splitn(3, ' ');
        let (Some("set"), Some(key), typed) = (parts.next(), parts.next(), parts.next()) else {
            return;
        };
        let key = key.to_string();
        let typed = typed.unwrap_or_default().to_string();

        let paths = match key.parse::<SettingKey>() {
            Ok(SettingKey::PeopleFolder) => self.vault.all_folders(),
            Ok(SettingKey::TemplateFile) => self.vault.all_files(),
            _ => return,
        };
        let paths = match paths {
            Ok(paths) => paths,
            Err(err) => {
                tracing::warn!("listing vault paths failed: {err}");
                return;
            }
        };

        if let Some(candidate) = self.completion.complete(&typed, &paths) {
            self.command_input = format!("set {key} {candidate}");
        }
    }

    fn move_cursor(&mut self, dir: MoveDir) {
        let row = self.buffer.cursor.row;
        let line_len = self.buffer.line_len(row);
        let last_row = self.buffer.line_count().saturating_sub(1);
        let cursor = &mut self.buffer.cursor;

        match dir {
            MoveDir::Up => {
                if cursor.row > 0 {
                    cursor.row -= 1;
                    cursor.col = cursor.desired_col;
                }
            }
            MoveDir::Down => {
                if cursor.row < last_row {
                    cursor.row += 1;
                    cursor.col = cursor.desired_col;
                }
            }
            MoveDir::Left => {
                if cursor.col > 0 {
                    cursor.col -= 1;
                    cursor.desired_col = cursor.col;
                }
            }
            MoveDir::Right => {
                if cursor.col < line_len {
                    cursor.col += 1;
                    cursor.desired_col = cursor.col;
                }
            }
            MoveDir::LineStart => cursor.move_to(row, 0),
            MoveDir::LineEnd => cursor.move_to(row, line_len),
        }
        self.buffer.clamp_cursor();
        self.buffer.scroll_to_cursor();
    }

    fn schedule_auto_save(&mut self) {
        let debounce_ms = self.config.general.auto_save_debounce_ms;
        self.buffer.save_debounce = Some(Instant::now() + Duration::from_millis(debounce_ms));
    }

    fn handle_tick(&mut self) {
        if let Some(deadline) = self.buffer.save_debounce
            && Instant::now() >= deadline
        {
            self.save_buffer();
        }
    }

    fn save_buffer(&mut self) {
        let Some(path) = self.buffer.path.clone() else {
            return;
        };
        if !self.buffer.dirty {
            self.buffer.save_debounce = None;
            return;
        }

        self.buffer.save_debounce = None;
        self.buffer.dirty = false;
        spawn_buffer_save(path, self.buffer.rope.clone());
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());

        self.buffer.viewport.height = chunks[0].height;
        self.buffer.scroll_to_cursor();

        self.render_editor(frame, chunks[0]);
        self.render_status_bar(frame, chunks[1]);

        match self.mode {
            Mode::Command => self.render_command_overlay(frame),
            Mode::Insert if self.popup.is_some() => self.render_mention_popup(frame, chunks[0]),
            _ => {}
        }

        if self.mode != Mode::Command {
            let row = self
                .buffer
                .cursor
                .row
                .saturating_sub(self.buffer.viewport.top_line);
            frame.set_cursor_position((
                chunks[0].x + self.buffer.cursor.col as u16,
                chunks[0].y + row as u16,
            ));
        }
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect) {
        let top = self.buffer.viewport.top_line;
        let bottom = (top + area.height as usize).min(self.buffer.line_count());

        let lines: Vec<Line> = (top..bottom)
            .map(|i| {
                let text = self.buffer.line_text(i).unwrap_or_default();
                render_markdown_line(&text)
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_mention_popup(&self, frame: &mut Frame, area: Rect) {
        let Some(popup) = &self.popup else {
            return;
        };

        let labels: Vec<String> = popup.suggestions.iter().map(Suggestion::render).collect();
        let visible = labels.len().min(MAX_POPUP_ROWS);
        let offset = popup.selected.saturating_sub(visible.saturating_sub(1));

        let width = labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .saturating_add(4)
            .min(area.width as usize) as u16;
        let height = (visible as u16 + 2).min(area.height);

        let anchor_row = popup
            .context
            .start
            .line
            .saturating_sub(self.buffer.viewport.top_line) as u16;
        let below = area.y + anchor_row + 1;
        let y = if below + height <= area.y + area.height {
            below
        } else {
            (area.y + anchor_row).saturating_sub(height)
        };
        let x = (area.x + popup.context.start.ch as u16)
            .min((area.x + area.width).saturating_sub(width));
        let rect = Rect::new(x, y, width, height);

        let lines: Vec<Line> = labels
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(idx, label)| {
                if idx == popup.selected {
                    Line::from(Span::styled(
                        format!(" {label} "),
                        Style::default().fg(Color::Black).bg(Color::Cyan),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!(" {label} "),
                        Style::default().fg(Color::Gray),
                    ))
                }
            })
            .collect();

        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" @people ")
                    .style(Style::default().bg(Color::Rgb(15, 15, 24))),
            ),
            rect,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_style = match self.mode {
            Mode::Normal => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            Mode::Insert => Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            Mode::Command => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };

        let mode_span = Span::styled(format!(" {} ", self.mode.label()), mode_style);

        let file_name = self
            .buffer
            .path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "[scratch]".to_string());
        let dirty_marker = if self.buffer.dirty { " [+]" } else { "" };
        let notice = self
            .notifications
            .back()
            .map(|n| format!(" | {n}"))
            .unwrap_or_default();

        let info = Span::styled(
            format!(
                " {file_name}{dirty_marker}  {}:{}{notice} ",
                self.buffer.cursor.row + 1,
                self.buffer.cursor.col + 1,
            ),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        );

        let bar = Line::from(vec![mode_span, info]);
        frame.render_widget(
            Paragraph::new(bar).style(Style::default().bg(Color::DarkGray)),
            area,
        );
    }

    fn render_command_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(70, 20, frame.area());
        frame.render_widget(Clear, area);

        let prompt = Paragraph::new(format!(":{}", self.command_input)).block(
            Block::default()
                .title(" Command ")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(prompt, area);

        let cursor_x = area.x + 2 + self.command_input.chars().count() as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn render_markdown_line(text: &str) -> Line<'static> {
    let base_style = base_markdown_style(text);
    let link_style = base_style
        .fg(Color::Rgb(0, 255, 136))
        .add_modifier(Modifier::UNDERLINED | Modifier::BOLD);

    let mut spans = Vec::new();
    let mut cursor = 0;
    for m in WIKILINK_RE.find_iter(text) {
        if m.start() > cursor {
            spans.push(Span::styled(text[cursor..m.start()].to_string(), base_style));
        }
        spans.push(Span::styled(m.as_str().to_string(), link_style));
        cursor = m.end();
    }
    if cursor < text.len() {
        spans.push(Span::styled(text[cursor..].to_string(), base_style));
    }

    Line::from(spans)
}

fn base_markdown_style(text: &str) -> Style {
    let trimmed = text.trim_start();

    if trimmed.starts_with("# ") {
        return Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD);
    }
    if trimmed.starts_with("## ") {
        return Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
    }
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
        return Style::default().fg(Color::LightCyan);
    }

    Style::default().fg(Color::Gray)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn spawn_buffer_save(path: PathBuf, rope: ropey::Rope) {
    std::thread::spawn(move || {
        use std::io::Write;
        let result = (|| -> Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let tmp = path.with_extension("tmp");
            let file = std::fs::File::create(&tmp)?;
            let mut writer = std::io::BufWriter::new(file);
            for chunk in rope.chunks() {
                writer.write_all(chunk.as_bytes())?;
            }
            writer.flush()?;
            std::fs::rename(&tmp, &path)?;
            Ok(())
        })();

        if let Err(e) = result {
            tracing::error!("save failed: {e}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{PeopleSettings, SettingsStore};
    use crate::vault::FsVault;
    use std::sync::mpsc;

    struct NoopStore;

    impl SettingsStore for NoopStore {
        fn save(&self, _settings: &PeopleSettings) -> Result<()> {
            Ok(())
        }
    }

    fn app(people: &[&str]) -> (tempfile::TempDir, App, mpsc::Receiver<Msg>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault: Arc<dyn Vault> = Arc::new(FsVault::new(dir.path().to_path_buf()));
        for name in people {
            vault
                .create_binary(&format!("People/@{name}.md"), b"")
                .expect("seed person");
        }

        let mut config = AppConfig::defaults().expect("defaults");
        config.general.vault_path = dir.path().to_string_lossy().to_string();

        let (tx, rx) = mpsc::channel();
        let mut extension = AtPeople::new(
            config.people.clone(),
            Box::new(NoopStore),
            Arc::clone(&vault),
            tx,
        );
        extension.initialize().expect("initialize");

        let app = App::new(config, extension, vault).expect("app");
        (dir, app, rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.update(Msg::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .expect("update");
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn popup_labels(app: &App) -> Vec<String> {
        app.popup
            .as_ref()
            .map(|p| p.suggestions.iter().map(Suggestion::render).collect())
            .unwrap_or_default()
    }

    #[test]
    fn typing_mention_opens_popup_and_enter_inserts_link() {
        let (_dir, mut app, _rx) = app(&["Bob Dole", "Bobby"]);
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "Hi @");
        assert!(app.popup.is_none());

        type_text(&mut app, "bo");
        assert_eq!(
            popup_labels(&app),
            vec!["Bob Dole", "Bobby", "New person: bo"]
        );

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        assert!(app.popup.is_none());
        assert_eq!(app.buffer.line_text(0).as_deref(), Some("Hi [[@Bobby]]"));
        assert_eq!(app.mode, Mode::Insert);
    }

    #[test]
    fn esc_dismisses_popup_then_leaves_insert() {
        let (_dir, mut app, _rx) = app(&["Ann"]);
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "@A");
        assert!(app.popup.is_some());

        press(&mut app, KeyCode::Esc);
        assert!(app.popup.is_none());
        assert_eq!(app.mode, Mode::Insert);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn popup_follows_vault_changes() {
        let (_dir, mut app, _rx) = app(&[]);
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "@Ze");
        assert_eq!(popup_labels(&app), vec!["New person: Ze"]);

        app.update(Msg::Vault(VaultEvent::Created {
            path: "People/@Zelda.md".to_string(),
        }))
        .expect("update");

        assert_eq!(popup_labels(&app), vec!["Zelda", "New person: Ze"]);
    }

    #[test]
    fn set_command_changes_link_style() {
        let (_dir, mut app, _rx) = app(&["Bob Dole"]);
        app.execute_command("set explicit_links on");
        app.execute_command("set last_name_folder on");

        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "@Bob");
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.buffer.line_text(0).as_deref(),
            Some("[[People/Dole/@Bob Dole.md|@Bob Dole]]")
        );
    }

    #[test]
    fn people_command_looks_up_names() {
        let (_dir, mut app, _rx) = app(&["Bob Dole"]);

        app.execute_command("people Bob Dole");
        assert_eq!(
            app.notifications.back().map(String::as_str),
            Some("@Bob Dole → People/@Bob Dole.md")
        );

        app.execute_command("people Nobody");
        assert_eq!(
            app.notifications.back().map(String::as_str),
            Some("@Nobody is not indexed")
        );
    }

    #[test]
    fn people_command_reports_count_or_empty_folder() {
        let (_empty_dir, mut empty, _rx) = app(&[]);
        empty.execute_command("people");
        assert_eq!(
            empty.notifications.back().map(String::as_str),
            Some("no people in People/")
        );

        let (_dir, mut two, _rx) = app(&["Ann", "Bea"]);
        two.execute_command("people");
        assert_eq!(
            two.notifications.back().map(String::as_str),
            Some("2 people indexed")
        );
    }

    #[test]
    fn unknown_setting_is_reported() {
        let (_dir, mut app, _rx) = app(&[]);
        app.execute_command("set colour red");

        let last = app.notifications.back().expect("notification");
        assert!(last.contains("unknown setting"));
    }

    #[test]
    fn tab_completes_people_folder() {
        let (_dir, mut app, _rx) = app(&["Ann"]);
        press(&mut app, KeyCode::Char(':'));
        type_text(&mut app, "set people_folder peo");
        press(&mut app, KeyCode::Tab);

        assert_eq!(app.command_input, "set people_folder People");
    }

    #[test]
    fn notify_messages_reach_status_line() {
        let (_dir, mut app, _rx) = app(&[]);
        app.update(Msg::Notify("could not create People/@X.md".to_string()))
            .expect("update");

        assert_eq!(
            app.notifications.back().map(String::as_str),
            Some("could not create People/@X.md")
        );
    }
}
