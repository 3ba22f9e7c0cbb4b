use ropey::Rope;
use std::path::PathBuf;
use std::time::Instant;

use super::cursor::{CursorState, EditorPosition};
use crate::editor::Editor;

/// Viewport state for scroll tracking.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub top_line: usize,
    pub height: u16,
    pub scroll_off: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            top_line: 0,
            height: 24,
            scroll_off: 5,
        }
    }
}

/// A single text buffer backed by a Rope. Cursor columns are char offsets.
pub struct Buffer {
    pub rope: Rope,
    pub path: Option<PathBuf>,
    pub dirty: bool,
    pub cursor: CursorState,
    pub viewport: Viewport,
    pub save_debounce: Option<Instant>,
}

impl Buffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            path: None,
            dirty: false,
            cursor: CursorState::default(),
            viewport: Viewport::default(),
            save_debounce: None,
        }
    }

    /// Create a buffer from file contents.
    pub fn from_file(path: PathBuf) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(&path)?;
        let mut buffer = Self::from_text(&text);
        buffer.path = Some(path);
        Ok(buffer)
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the text of a specific line (without trailing newline).
    pub fn line_text(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(idx);
        let mut s: String = line.chunks().collect();
        if s.ends_with('\n') {
            s.pop();
        }
        if s.ends_with('\r') {
            s.pop();
        }
        Some(s)
    }

    /// Length of a line in chars, excluding the line terminator.
    pub fn line_len(&self, idx: usize) -> usize {
        self.line_text(idx).map(|l| l.chars().count()).unwrap_or(0)
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) {
        let char_idx = self.cursor_char_offset();
        self.rope.insert_char(char_idx, ch);
        self.cursor.col += 1;
        self.cursor.desired_col = self.cursor.col;
        self.dirty = true;
    }

    /// Insert a newline at the cursor position.
    pub fn insert_newline(&mut self) {
        let char_idx = self.cursor_char_offset();
        self.rope.insert_char(char_idx, '\n');
        self.cursor.move_to(self.cursor.row + 1, 0);
        self.dirty = true;
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        if self.cursor.col == 0 && self.cursor.row == 0 {
            return;
        }

        let char_idx = self.cursor_char_offset();
        if self.cursor.col == 0 {
            // Join with previous line
            let prev_line_len = self.line_len(self.cursor.row - 1);
            self.rope.remove(char_idx - 1..char_idx);
            self.cursor.move_to(self.cursor.row - 1, prev_line_len);
        } else {
            self.rope.remove(char_idx - 1..char_idx);
            self.cursor.move_to(self.cursor.row, self.cursor.col - 1);
        }

        self.dirty = true;
    }

    fn cursor_char_offset(&self) -> usize {
        self.char_index(self.cursor.position())
    }

    /// Rope char index for a position, clamped into the document.
    fn char_index(&self, pos: EditorPosition) -> usize {
        let max_line = self.rope.len_lines().saturating_sub(1);
        let line = pos.line.min(max_line);
        self.rope.line_to_char(line) + pos.ch.min(self.line_len(line))
    }

    fn position_of(&self, char_idx: usize) -> EditorPosition {
        let char_idx = char_idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_idx);
        EditorPosition::new(line, char_idx - self.rope.line_to_char(line))
    }

    /// Ensure the cursor stays within valid bounds.
    pub fn clamp_cursor(&mut self) {
        let max_row = self.rope.len_lines().saturating_sub(1);
        self.cursor.row = self.cursor.row.min(max_row);
        self.cursor.col = self.cursor.col.min(self.line_len(self.cursor.row));
    }

    /// Ensure the viewport keeps the cursor visible.
    pub fn scroll_to_cursor(&mut self) {
        let off = self.viewport.scroll_off as usize;
        let height = (self.viewport.height as usize).max(off * 2 + 1);

        if self.cursor.row < self.viewport.top_line + off {
            self.viewport.top_line = self.cursor.row.saturating_sub(off);
        }
        if self.cursor.row >= self.viewport.top_line + height - off {
            self.viewport.top_line = self.cursor.row + off + 1 - height;
        }
    }
}

impl Editor for Buffer {
    fn line(&self, line: usize) -> Option<String> {
        self.line_text(line)
    }

    fn cursor(&self) -> EditorPosition {
        self.cursor.position()
    }

    fn replace_range(&mut self, text: &str, start: EditorPosition, end: EditorPosition) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let from = self.char_index(start);
        let to = self.char_index(end);
        let cursor = self.cursor_char_offset();

        self.rope.remove(from..to);
        self.rope.insert(from, text);

        let inserted = text.chars().count();
        let mapped = if cursor < from {
            cursor
        } else if cursor <= to {
            from + inserted
        } else {
            cursor - (to - from) + inserted
        };

        let pos = self.position_of(mapped);
        self.cursor.move_to(pos.line, pos.ch);
        self.dirty = true;
    }
}
