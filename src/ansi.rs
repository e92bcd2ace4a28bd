//! ANSI-aware text measurement and slicing.
//!
//! Terminal text carries zero-width escape sequences (SGR styling, region
//! markers) interleaved with visible characters, some of which occupy two
//! display columns. This module provides the primitives the compositor needs
//! to treat such strings as grids of columns:
//!
//! - [`visible_width`] counts display columns, ignoring escape sequences.
//! - [`slice_visible`] cuts a string by column range, re-emitting the SGR
//!   styles active at the cut so the slice renders correctly in isolation.
//! - [`strip_ansi`] removes escape sequences entirely.
//!
//! Region markers use a private APC convention: `ESC _ <name> ESC \` opens a
//! region and `ESC _ / <name> ESC \` closes it. They are opaque, zero-width,
//! and preserved byte-for-byte wherever they fall inside a slice.

use std::fmt::Write as _;
use unicode_width::UnicodeWidthChar;

/// SGR reset sequence.
pub(crate) const RESET: &str = "\x1b[0m";

/// Build the opening region marker for `name`.
pub fn open_region_tag(name: &str) -> String {
    format!("\x1b_{name}\x1b\\")
}

/// Build the closing region marker for `name`.
pub fn close_region_tag(name: &str) -> String {
    format!("\x1b_/{name}\x1b\\")
}

/// Bracket `text` in open/close region markers for `name`.
pub fn wrap_region(name: &str, text: &str) -> String {
    format!("{}{}{}", open_region_tag(name), text, close_region_tag(name))
}

/// Display width of a single character in terminal columns.
///
/// Control characters are zero-width; East Asian wide characters occupy two
/// columns.
#[inline]
pub(crate) fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// A lexical unit of ANSI-escaped text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// A CSI sequence (`ESC [` through its final byte), raw bytes included.
    Csi(&'a str),
    /// An APC region marker (`ESC _` through `ESC \`), raw bytes included.
    Apc(&'a str),
    /// Any other escape, passed through opaque.
    Esc(&'a str),
    /// A visible (or at least non-escape) character.
    Char(char),
}

/// Iterator splitting a string into [`Token`]s. Zero-allocation; all escape
/// tokens borrow from the input.
pub(crate) struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn take(&mut self, len: usize) -> &'a str {
        let (head, tail) = self.rest.split_at(len);
        self.rest = tail;
        head
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let mut chars = self.rest.char_indices();
        let (_, first) = chars.next()?;

        if first != '\x1b' {
            self.take(first.len_utf8());
            return Some(Token::Char(first));
        }

        match chars.next() {
            Some((_, '[')) => {
                // CSI: parameter bytes 0x30-0x3F, intermediate bytes
                // 0x20-0x2F, one final byte 0x40-0x7E.
                for (i, c) in chars {
                    if ('\x40'..='\x7e').contains(&c) {
                        return Some(Token::Csi(self.take(i + 1)));
                    }
                    if !('\x20'..='\x3f').contains(&c) {
                        // Malformed; emit what we have up to here.
                        return Some(Token::Esc(self.take(i)));
                    }
                }
                Some(Token::Esc(self.take(self.rest.len())))
            }
            Some((_, '_')) => {
                // APC region marker, terminated by ST (ESC \).
                match self.rest[2..].find("\x1b\\") {
                    Some(i) => Some(Token::Apc(self.take(2 + i + 2))),
                    None => Some(Token::Apc(self.take(self.rest.len()))),
                }
            }
            Some((i, c)) => Some(Token::Esc(self.take(i + c.len_utf8()))),
            None => Some(Token::Esc(self.take(1))),
        }
    }
}

/// One SGR color in its wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SgrColor {
    /// A one-parameter color code (30-37, 40-47, 90-97, 100-107).
    Basic(u8),
    /// 256-color palette index (`38;5;N` / `48;5;N`).
    Indexed(u8),
    /// 24-bit color (`38;2;R;G;B` / `48;2;R;G;B`).
    Rgb(u8, u8, u8),
}

/// Accumulated SGR style state at a point in a string.
///
/// Tracks exactly what must be re-emitted for a suffix of the string to
/// render identically on its own. Emission is canonical (fixed attribute
/// order, one sequence per attribute) so that re-parsing emitted codes
/// reproduces the same state and the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SgrState {
    fg: Option<SgrColor>,
    bg: Option<SgrColor>,
    bold: bool,
    dim: bool,
    italic: bool,
    underline: bool,
    inverse: bool,
    strikethrough: bool,
}

impl SgrState {
    pub(crate) fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply a raw SGR sequence (must end in `m`) to this state.
    pub(crate) fn apply_raw(&mut self, raw: &str) {
        let body = raw
            .strip_prefix("\x1b[")
            .and_then(|s| s.strip_suffix('m'))
            .unwrap_or("");
        let mut params: Vec<u8> = Vec::new();
        for part in body.split(';') {
            if part.is_empty() {
                params.push(0);
            } else if let Ok(n) = part.parse::<u8>() {
                params.push(n);
            }
        }
        self.apply_params(&params);
    }

    fn apply_params(&mut self, params: &[u8]) {
        if params.is_empty() {
            *self = Self::default();
            return;
        }

        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => *self = Self::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                7 => self.inverse = true,
                9 => self.strikethrough = true,

                21 | 22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                27 => self.inverse = false,
                29 => self.strikethrough = false,

                c @ (30..=37 | 90..=97) => self.fg = Some(SgrColor::Basic(c)),
                38 => {
                    if let Some(color) = parse_extended_color(params, &mut i) {
                        self.fg = Some(color);
                    }
                }
                39 => self.fg = None,

                c @ (40..=47 | 100..=107) => self.bg = Some(SgrColor::Basic(c)),
                48 => {
                    if let Some(color) = parse_extended_color(params, &mut i) {
                        self.bg = Some(color);
                    }
                }
                49 => self.bg = None,

                _ => {} // Unknown code, ignore
            }
            i += 1;
        }
    }

    /// Emit the escape sequences reproducing this state from a reset
    /// terminal, in canonical order.
    pub(crate) fn emit_into(&self, out: &mut String) {
        if self.bold {
            out.push_str("\x1b[1m");
        }
        if self.dim {
            out.push_str("\x1b[2m");
        }
        if self.italic {
            out.push_str("\x1b[3m");
        }
        if self.underline {
            out.push_str("\x1b[4m");
        }
        if self.inverse {
            out.push_str("\x1b[7m");
        }
        if self.strikethrough {
            out.push_str("\x1b[9m");
        }
        if let Some(fg) = self.fg {
            emit_color(out, fg, 38);
        }
        if let Some(bg) = self.bg {
            emit_color(out, bg, 48);
        }
    }
}

fn emit_color(out: &mut String, color: SgrColor, extended_base: u8) {
    // Infallible for String targets.
    let _ = match color {
        SgrColor::Basic(code) => write!(out, "\x1b[{code}m"),
        SgrColor::Indexed(idx) => write!(out, "\x1b[{extended_base};5;{idx}m"),
        SgrColor::Rgb(r, g, b) => write!(out, "\x1b[{extended_base};2;{r};{g};{b}m"),
    };
}

/// Parse an extended color payload (256-color or 24-bit RGB) starting at
/// `params[*i]` (the 38/48 introducer). Advances `i` past consumed params.
fn parse_extended_color(params: &[u8], i: &mut usize) -> Option<SgrColor> {
    match params.get(*i + 1)? {
        5 => {
            let idx = *params.get(*i + 2)?;
            *i += 2;
            Some(SgrColor::Indexed(idx))
        }
        2 => {
            let r = *params.get(*i + 2)?;
            let g = *params.get(*i + 3)?;
            let b = *params.get(*i + 4)?;
            *i += 4;
            Some(SgrColor::Rgb(r, g, b))
        }
        _ => None,
    }
}

/// Count of terminal columns `s` occupies, excluding escape sequences.
///
/// Wide characters count as two columns. Single pass, O(len).
pub fn visible_width(s: &str) -> usize {
    Tokens::new(s)
        .map(|t| match t {
            Token::Char(c) => char_width(c),
            _ => 0,
        })
        .sum()
}

/// Strip all escape sequences from `s`, returning plain text.
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for token in Tokens::new(s) {
        if let Token::Char(c) = token {
            out.push(c);
        }
    }
    out
}

/// Return the substring of `s` covering visible columns `[start, end)`.
///
/// SGR styles active at `start` are re-emitted at the head of the slice so
/// it renders correctly in isolation; if styles remain active at `end`, a
/// reset is appended. Region markers falling within the slice are preserved
/// byte-for-byte. A wide character straddling either boundary is dropped
/// (its columns stay blank rather than rendering half a glyph).
///
/// Out-of-range column indices clamp to `[0, visible_width(s)]`;
/// `start >= end` returns the empty string.
pub fn slice_visible(s: &str, start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }

    let mut out = String::new();
    // Style state of the source string at the current column, and of the
    // bytes already emitted into `out`. They diverge when an SGR sequence
    // falls outside the slice.
    let mut state = SgrState::default();
    let mut emitted_state = SgrState::default();
    let mut emitted = false;
    let mut col = 0usize;

    for token in Tokens::new(s) {
        match token {
            Token::Csi(raw) => {
                if raw.ends_with('m') {
                    if emitted && col < end {
                        out.push_str(raw);
                        emitted_state.apply_raw(raw);
                    }
                    state.apply_raw(raw);
                } else if emitted && col < end {
                    out.push_str(raw);
                }
            }
            Token::Apc(raw) | Token::Esc(raw) => {
                // Zero-width; belongs to the slice if it sits between
                // columns start and end inclusive.
                if col >= start && col <= end {
                    out.push_str(raw);
                }
            }
            Token::Char(c) => {
                let w = char_width(c);
                if col >= start && col + w <= end {
                    if !emitted {
                        state.emit_into(&mut out);
                        emitted_state = state.clone();
                        emitted = true;
                    }
                    out.push(c);
                }
                col += w;
                if col > end {
                    break;
                }
            }
        }
    }

    if emitted && !emitted_state.is_default() {
        out.push_str(RESET);
    }

    out
}
