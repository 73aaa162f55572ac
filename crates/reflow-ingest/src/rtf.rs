//! RTF reader: a control-word stripper producing plain text lines.
//!
//! Handles groups, ignorable destinations (`{\*\...}`) and the usual
//! non-text destinations (font/color tables, stylesheet, info, pictures),
//! `\par`/`\line` breaks, `\tab`, `\'hh` byte escapes decoded with the
//! document's `\ansicpg` code page (Latin-1 without one), and `\uN` Unicode
//! escapes with their `\ucN` fallback characters skipped.

use std::path::Path;

use encoding_rs::Encoding;

use reflow_core::{DocumentBackend, ExtractionError, PageSource};

use crate::flow::{FlowOptions, blocks_to_lines};

/// Reads `.rtf` files as a single page of lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct RtfBackend {
    options: FlowOptions,
}

impl RtfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: FlowOptions) -> Self {
        Self { options }
    }
}

impl DocumentBackend for RtfBackend {
    fn name(&self) -> &str {
        "rtf"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rtf"]
    }

    fn read_pages(&self, path: &Path) -> Result<Vec<PageSource>, ExtractionError> {
        let data = std::fs::read(path).map_err(|e| ExtractionError::Open(format!("{}: {e}", path.display())))?;
        if !data.starts_with(b"{\\rtf") {
            return Err(ExtractionError::Read(format!("{}: missing {{\\rtf header", path.display())));
        }
        let text = rtf_to_text(&data);
        let blocks: Vec<String> = text.lines().map(str::to_string).collect();
        let lines = blocks_to_lines(&blocks, self.options);
        tracing::debug!(path = %path.display(), lines = lines.len(), "rtf read");
        Ok(vec![PageSource::Lines(lines)])
    }
}

/// Destinations whose content is never document text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "themedata",
    "datastore",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "latentstyles",
    "fldinst",
];

#[derive(Debug, Clone, Copy)]
struct GroupState {
    skip: bool,
    /// Fallback characters that follow each `\uN`.
    uc: usize,
}

impl Default for GroupState {
    fn default() -> Self {
        Self { skip: false, uc: 1 }
    }
}

/// Plain text of an RTF document; paragraphs and line breaks become `\n`.
pub fn rtf_to_text(data: &[u8]) -> String {
    RtfStripper::new(data).run()
}

struct RtfStripper<'a> {
    data: &'a [u8],
    pos: usize,
    out: String,
    group: GroupState,
    stack: Vec<GroupState>,
    encoding: Option<&'static Encoding>,
    /// `\'hh` bytes not yet decoded, so multi-byte code pages decode whole.
    pending_bytes: Vec<u8>,
    /// Fallback characters still to drop after a `\uN`.
    skip_chars: usize,
    /// Set by `\*`: the next control word starts an ignorable destination.
    ignorable: bool,
}

impl<'a> RtfStripper<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            out: String::new(),
            group: GroupState::default(),
            stack: Vec::new(),
            encoding: None,
            pending_bytes: Vec::new(),
            skip_chars: 0,
            ignorable: false,
        }
    }

    fn run(mut self) -> String {
        while let Some(&b) = self.data.get(self.pos) {
            self.pos += 1;
            match b {
                b'{' => {
                    self.flush_bytes();
                    self.stack.push(self.group);
                }
                b'}' => {
                    self.flush_bytes();
                    self.group = self.stack.pop().unwrap_or_default();
                    self.ignorable = false;
                }
                b'\\' => self.control(),
                b'\r' | b'\n' => {}
                _ => {
                    if self.consume_fallback() {
                        continue;
                    }
                    self.raw_byte(b);
                }
            }
        }
        self.flush_bytes();
        self.out
    }

    fn control(&mut self) {
        let Some(&next) = self.data.get(self.pos) else {
            return;
        };
        if next.is_ascii_alphabetic() {
            let (word, param) = self.read_control_word();
            self.flush_bytes();
            self.control_word(&word, param);
            return;
        }

        self.pos += 1;
        match next {
            b'\'' => {
                let hex = self.data.get(self.pos..self.pos + 2).and_then(|h| std::str::from_utf8(h).ok());
                if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    self.pos += 2;
                    if self.consume_fallback() {
                        return;
                    }
                    if !self.group.skip {
                        self.pending_bytes.push(byte);
                    }
                }
            }
            b'*' => self.ignorable = true,
            b'\\' | b'{' | b'}' => {
                self.flush_bytes();
                if !self.consume_fallback() {
                    self.emit(next as char);
                }
            }
            b'~' => {
                self.flush_bytes();
                self.emit(' ');
            }
            b'_' => {
                self.flush_bytes();
                self.emit('-');
            }
            // `\` before a line break is a paragraph mark
            b'\r' | b'\n' => {
                self.flush_bytes();
                self.emit('\n');
            }
            _ => {}
        }
    }

    fn read_control_word(&mut self) -> (String, Option<i32>) {
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(u8::is_ascii_alphabetic) {
            self.pos += 1;
        }
        let word = String::from_utf8_lossy(&self.data[start..self.pos]).into_owned();

        let num_start = self.pos;
        if self.data.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        while self.data.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        let param = std::str::from_utf8(&self.data[num_start..self.pos])
            .ok()
            .and_then(|s| s.parse::<i32>().ok());
        if param.is_none() {
            self.pos = num_start;
        }

        // a single space delimits the control word and is not text
        if self.data.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
        (word, param)
    }

    fn control_word(&mut self, word: &str, param: Option<i32>) {
        if std::mem::take(&mut self.ignorable) || SKIPPED_DESTINATIONS.contains(&word) {
            self.group.skip = true;
            return;
        }
        match word {
            "par" | "line" | "sect" | "page" | "row" => self.emit('\n'),
            "tab" | "cell" => self.emit('\t'),
            "emdash" => self.emit('\u{2014}'),
            "endash" => self.emit('\u{2013}'),
            "lquote" => self.emit('\u{2018}'),
            "rquote" => self.emit('\u{2019}'),
            "ldblquote" => self.emit('\u{201C}'),
            "rdblquote" => self.emit('\u{201D}'),
            "bullet" => self.emit('\u{2022}'),
            "ansicpg" => {
                self.encoding = param.and_then(|cp| Encoding::for_label(format!("cp{cp}").as_bytes()));
            }
            "uc" => self.group.uc = param.map_or(1, |n| n.max(0) as usize),
            "u" => {
                if let Some(n) = param {
                    // values above 32767 are written as negative numbers
                    let code = (if n < 0 { n + 65536 } else { n }) as u32;
                    self.emit(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    self.skip_chars = self.group.uc;
                }
            }
            _ => {}
        }
    }

    /// Drop one fallback character after `\uN`; true if the character was dropped.
    fn consume_fallback(&mut self) -> bool {
        if self.skip_chars > 0 {
            self.skip_chars -= 1;
            true
        } else {
            false
        }
    }

    fn raw_byte(&mut self, b: u8) {
        if self.group.skip {
            return;
        }
        if b.is_ascii() {
            self.flush_bytes();
            self.emit(b as char);
        } else {
            self.pending_bytes.push(b);
        }
    }

    fn emit(&mut self, c: char) {
        if !self.group.skip {
            self.out.push(c);
        }
    }

    fn flush_bytes(&mut self) {
        if self.pending_bytes.is_empty() {
            return;
        }
        let bytes = std::mem::take(&mut self.pending_bytes);
        match self.encoding {
            Some(encoding) => {
                let (decoded, _, _) = encoding.decode(&bytes);
                self.out.push_str(&decoded);
            }
            // raw UTF-8 text saved by non-RTF-aware tools, else Latin-1
            None => match std::str::from_utf8(&bytes) {
                Ok(text) => self.out.push_str(text),
                Err(_) => self.out.extend(bytes.iter().map(|&b| b as char)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(rtf: &str) -> String {
        rtf_to_text(rtf.as_bytes())
    }

    #[test]
    fn test_plain_paragraphs() {
        let out = text(r"{\rtf1\ansi{\fonttbl{\f0 Times New Roman;}}\f0\fs24 First line\par Second line\par}");
        assert_eq!(out, "First line\nSecond line\n");
    }

    #[test]
    fn test_cp1251_hex_escapes() {
        let out = text(r"{\rtf1\ansi\ansicpg1251 \'cf\'f0\'e8\'e2\'e5\'f2}");
        assert_eq!(out, "Привет");
    }

    #[test]
    fn test_latin1_without_code_page() {
        let out = text(r"{\rtf1\ansi caf\'e9}");
        assert_eq!(out, "café");
    }

    #[test]
    fn test_unicode_escape_skips_fallback() {
        let out = text(r"{\rtf1\uc1\u1055?\u1088?\u-3913?}");
        assert_eq!(out, "Пр\u{F0B7}");
        let out = text(r"{\rtf1\uc1\u1076\'e4 end}");
        assert_eq!(out, "д end");
    }

    #[test]
    fn test_ignorable_destination_dropped() {
        let out = text(r"{\rtf1{\*\generator Writer;}{\info{\title Secret}}Body{\*\bkmkstart x} text\line tail}");
        assert_eq!(out, "Body text\ntail");
    }

    #[test]
    fn test_escaped_braces_and_tab() {
        let out = text(r"{\rtf1 a\{b\}\tab c\\d}");
        assert_eq!(out, "a{b}\tc\\d");
    }

    #[test]
    fn test_raw_utf8_text_kept() {
        assert_eq!(rtf_to_text("{\\rtf1 Текст}".as_bytes()), "Текст");
    }

    #[test]
    fn test_uc_zero_keeps_following_text() {
        let out = text(r"{\rtf1\uc0\u1040 B}");
        assert_eq!(out, "АB");
    }
}
