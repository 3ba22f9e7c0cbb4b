/// Cursor position within a buffer.
#[derive(Debug, Clone, Default)]
pub struct CursorState {
    /// Current line (0-indexed).
    pub row: usize,
    /// Current column (0-indexed, char offset within line).
    pub col: usize,
    /// Desired column for vertical movement ("sticky" column).
    pub desired_col: usize,
}

/// A (line, character) location in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct EditorPosition {
    pub line: usize,
    pub ch: usize,
}

impl EditorPosition {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

impl CursorState {
    pub fn position(&self) -> EditorPosition {
        EditorPosition::new(self.row, self.col)
    }

    pub fn move_to(&mut self, row: usize, col: usize) {
        self.row = row;
        self.col = col;
        self.desired_col = col;
    }
}
