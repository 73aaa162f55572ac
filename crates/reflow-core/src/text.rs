//! Script detection and whitespace/character normalization shared by all
//! pipeline stages.

use serde::Serialize;

/// Writing system that dominates a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Script {
    Cyrillic,
    Latin,
    /// No Cyrillic or Latin letters at all (digits, punctuation, other scripts).
    Mixed,
}

/// Decide the dominant script of `text` by letter count.
///
/// Ties between a non-zero Cyrillic and Latin count go to Cyrillic.
pub fn dominant_script(text: &str) -> Script {
    let (mut cyrillic, mut latin) = (0usize, 0usize);
    for c in text.chars() {
        if is_cyrillic(c) {
            cyrillic += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }
    if cyrillic == 0 && latin == 0 {
        Script::Mixed
    } else if cyrillic >= latin {
        Script::Cyrillic
    } else {
        Script::Latin
    }
}

pub fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}')
}

/// Collapse every whitespace run to a single space and trim the ends.
///
/// Idempotent: `normalize_spaces(normalize_spaces(s)) == normalize_spaces(s)`.
pub fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Frequency key for a line: collapsed whitespace, lowercased.
pub fn normalize_key(text: &str) -> String {
    normalize_spaces(text).to_lowercase()
}

/// Share of uppercase letters among all letters, or 0.0 without letters.
pub fn uppercase_ratio(text: &str) -> f64 {
    let mut letters = 0usize;
    let mut upper = 0usize;
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if c.is_uppercase() {
            upper += 1;
        }
    }
    if letters == 0 {
        0.0
    } else {
        upper as f64 / letters as f64
    }
}

/// Drop byte-order marks and soft hyphens, turn no-break spaces into spaces.
pub fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{FEFF}' | '\u{00AD}' | '\u{200B}'))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect()
}

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    if !text.chars().any(|c| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
        return text.to_string();
    }
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace('\u{FB05}', "st")
        .replace('\u{FB06}', "st")
}

/// Character count, which is what every length threshold in the pipeline
/// measures (byte length would penalize Cyrillic).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_script_majority() {
        assert_eq!(dominant_script("Иванов И.И. Заголовок"), Script::Cyrillic);
        assert_eq!(dominant_script("Smith J. Title of paper"), Script::Latin);
        assert_eq!(dominant_script("2001. 10-20."), Script::Mixed);
    }

    #[test]
    fn test_dominant_script_tie_favors_cyrillic() {
        assert_eq!(dominant_script("ab вг"), Script::Cyrillic);
    }

    #[test]
    fn test_normalize_spaces_idempotent() {
        let once = normalize_spaces("  a \t b\n\nc  ");
        assert_eq!(once, "a b c");
        assert_eq!(normalize_spaces(&once), once);
    }

    #[test]
    fn test_normalize_key_lowercases() {
        assert_eq!(normalize_key("Журнал   Славяноведение"), "журнал славяноведение");
    }

    #[test]
    fn test_uppercase_ratio() {
        assert!((uppercase_ratio("ABC def") - 0.5).abs() < f64::EPSILON);
        assert_eq!(uppercase_ratio("123"), 0.0);
    }

    #[test]
    fn test_strip_invisible() {
        assert_eq!(strip_invisible("\u{FEFF}пере\u{00AD}нос\u{00A0}слова"), "перенос слова");
    }

    #[test]
    fn test_expand_ligatures() {
        assert_eq!(expand_ligatures("e\u{FB03}cient \u{FB01}le"), "efficient file");
        assert_eq!(expand_ligatures("plain"), "plain");
    }

    #[test]
    fn test_char_len_counts_chars() {
        assert_eq!(char_len("абв"), 3);
    }
}
