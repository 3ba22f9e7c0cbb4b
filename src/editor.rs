use crate::model::cursor::EditorPosition;

/// Text surface the mention suggestor reads from and writes into.
pub trait Editor {
    /// Text of `line` without its line terminator.
    fn line(&self, line: usize) -> Option<String>;

    fn cursor(&self) -> EditorPosition;

    /// Replace the text between `start` and `end` (char offsets) with `text`.
    fn replace_range(&mut self, text: &str, start: EditorPosition, end: EditorPosition);
}
