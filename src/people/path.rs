use std::sync::LazyLock;

use regex::Regex;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/@([^/]+)\.md$").expect("valid person name regex"));
static LAST_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+)$").expect("valid last name regex"));

/// Extract the person name from a vault path, if the path names a person file.
///
/// A person file lives under `people_folder`, ends in `.md` and has a file name
/// starting with `@`. The name is the text between the last `/@` and `.md`.
pub fn person_name<'a>(path: &'a str, people_folder: &str) -> Option<&'a str> {
    if !(path.starts_with(people_folder) && path.ends_with(".md") && path.contains("/@")) {
        return None;
    }

    NAME_RE
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Trailing run of non-whitespace characters, used as the last-name folder.
pub fn last_name_token(name: &str) -> Option<&str> {
    LAST_NAME_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Canonical vault path form: forward slashes, no repeated separators, no
/// leading or trailing slash. An empty result becomes the vault root `/`.
pub fn normalize_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;

    for ch in raw.chars() {
        let ch = match ch {
            '\\' => '/',
            '\u{00A0}' | '\u{202F}' => ' ',
            other => other,
        };

        if ch == '/' {
            if !last_was_sep {
                out.push('/');
            }
            last_was_sep = true;
        } else {
            out.push(ch);
            last_was_sep = false;
        }
    }

    let trimmed = out.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalized folder with exactly one trailing slash, so it can be used as a
/// plain prefix when building explicit links.
pub fn normalize_folder(raw: &str) -> String {
    let normalized = normalize_path(raw);
    if normalized == "/" {
        String::new()
    } else {
        format!("{normalized}/")
    }
}
