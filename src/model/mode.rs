/// Application interaction modes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Navigation and commands.
    #[default]
    Normal,
    /// Text editing, with the mention popup when triggered.
    Insert,
    /// Command line (`:` prefix), including `:set` for people settings.
    Command,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Command => "COMMAND",
        }
    }
}
