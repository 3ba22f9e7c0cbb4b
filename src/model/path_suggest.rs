//! Path pickers for settings that name a vault folder or file.

/// Entries whose path contains `input`, case-insensitively, in the order given.
pub fn suggest_paths<'a>(paths: &'a [String], input: &str) -> Vec<&'a str> {
    let needle = input.to_lowercase();
    paths
        .iter()
        .filter(|path| path.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}

/// Tab-completion state for the command line.
#[derive(Debug, Default)]
pub struct PathCompletion {
    typed: String,
    candidates: Vec<String>,
    next: usize,
    last: Option<String>,
}

impl PathCompletion {
    /// Next candidate for `typed`, cycling on repeated calls with the same
    /// input or with the previously returned candidate.
    pub fn complete(&mut self, typed: &str, paths: &[String]) -> Option<String> {
        let continuing = !self.candidates.is_empty()
            && (typed == self.typed || self.last.as_deref() == Some(typed));

        if !continuing {
            self.typed = typed.to_string();
            self.candidates = suggest_paths(paths, typed)
                .into_iter()
                .map(str::to_string)
                .collect();
            self.next = 0;
            self.last = None;
        }

        if self.candidates.is_empty() {
            return None;
        }

        let candidate = self.candidates[self.next % self.candidates.len()].clone();
        self.next = (self.next + 1) % self.candidates.len();
        self.last = Some(candidate.clone());
        Some(candidate)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
