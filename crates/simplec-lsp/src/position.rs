//! UTF-16 code-unit <-> UTF-8 byte column conversion.
//!
//! Grounded on `yaram/simple-compiler`'s `server.cpp`
//! (`utf16_position_to_utf8_position`/`utf8_position_to_utf16_position`):
//! [`FileRange`] columns are 1-based UTF-8 byte offsets within a line (the
//! parser->core contract), while LSP wire positions are 0-based UTF-16
//! code-unit offsets. A `\r\n` line break counts as a single break; a
//! codepoint outside the BMP (`>= 0x10000`) costs two UTF-16 units.

/// A 0-based UTF-16 `(line, column)` pair, as LSP sends and expects them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Utf16Position {
    pub line: u32,
    pub column: u32,
}

fn utf16_units(ch: char) -> u32 {
    if (ch as u32) >= 0x10000 { 2 } else { 1 }
}

/// Lines of `text`, each with its trailing `\r\n`/`\n` stripped.
fn lines(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    loop {
        match rest.find('\n') {
            Some(idx) => {
                let line = rest[..idx].strip_suffix('\r').unwrap_or(&rest[..idx]);
                out.push(line);
                rest = &rest[idx + 1..];
            }
            None => {
                out.push(rest);
                break;
            }
        }
    }
    out
}

/// Converts a 0-based UTF-16 position into a 1-based UTF-8 byte column on
/// the same line. `one_past` allows the result to land one codepoint beyond
/// the last one counted, for mapping a range's exclusive end.
pub fn utf16_to_utf8_column(line_text: &str, utf16_column: u32) -> Option<u32> {
    let mut utf16_pos = 0u32;
    let mut utf8_pos = 1u32;
    for ch in line_text.chars() {
        if utf16_pos == utf16_column {
            return Some(utf8_pos);
        }
        utf16_pos += utf16_units(ch);
        utf8_pos += ch.len_utf8() as u32;
    }
    if utf16_pos == utf16_column {
        return Some(utf8_pos);
    }
    None
}

/// Converts a 1-based UTF-8 byte column into a 0-based UTF-16 column on the
/// same line. `one_past` mirrors `utf16_to_utf8_column`'s: when the byte
/// column lands exactly one past the last character (the usual case for a
/// range's end), the full line still resolves rather than failing.
pub fn utf8_to_utf16_column(line_text: &str, utf8_column: u32, one_past: bool) -> Option<u32> {
    let mut utf16_pos = 0u32;
    let mut utf8_pos = 1u32;
    for ch in line_text.chars() {
        if !one_past && utf8_pos == utf8_column {
            return Some(utf16_pos);
        }
        utf8_pos += ch.len_utf8() as u32;
        utf16_pos += utf16_units(ch);
        if one_past && utf8_pos == utf8_column {
            return Some(utf16_pos);
        }
    }
    if utf8_pos == utf8_column {
        return Some(utf16_pos);
    }
    None
}

/// Maps a 0-based UTF-16 `(line, column)` position in `text` to a
/// `simplec-common` 1-based `(line, column)` pair, where `line` is also
/// 1-based and `column` is a UTF-8 byte offset.
pub fn utf16_to_file_position(text: &str, pos: Utf16Position) -> Option<(u32, u32)> {
    let ls = lines(text);
    let line_text = *ls.get(pos.line as usize)?;
    let column = utf16_to_utf8_column(line_text, pos.column)?;
    Some((pos.line + 1, column))
}

/// Maps a `simplec-common` 1-based `(line, column)` pair (`column` a UTF-8
/// byte offset) back to a 0-based UTF-16 position, for sending to an LSP
/// client. `one_past` must match the mapping `column` was produced under.
pub fn file_position_to_utf16(text: &str, line: u32, column: u32, one_past: bool) -> Option<Utf16Position> {
    let ls = lines(text);
    let line_text = *ls.get(line.checked_sub(1)? as usize)?;
    let utf16_column = utf8_to_utf16_column(line_text, column, one_past)?;
    Some(Utf16Position { line: line - 1, column: utf16_column })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        let text = "let x = 1;\nlet y = 2;";
        let utf8 = utf16_to_file_position(text, Utf16Position { line: 1, column: 4 }).unwrap();
        assert_eq!(utf8, (2, 5));
        let back = file_position_to_utf16(text, 2, 5, false).unwrap();
        assert_eq!(back, Utf16Position { line: 1, column: 4 });
    }

    #[test]
    fn astral_codepoint_counts_as_two_units() {
        // "x\u{1F600}y": x (1 UTF-16 unit), emoji (2 units), y (1 unit).
        let text = "x\u{1F600}y";
        // UTF-16 column 3 is just past the emoji, at 'y'.
        let pos = utf16_to_file_position(text, Utf16Position { line: 0, column: 3 }).unwrap();
        assert_eq!(pos.0, 1);
        // byte offset: 'x' (1 byte) + emoji (4 bytes) + 1 = column 6.
        assert_eq!(pos.1, 6);
    }

    #[test]
    fn one_past_resolves_end_of_line() {
        let text = "ab";
        let end = file_position_to_utf16(text, 1, 3, true).unwrap();
        assert_eq!(end, Utf16Position { line: 0, column: 2 });
    }

    #[test]
    fn crlf_line_break_is_stripped() {
        let text = "a\r\nb";
        let pos = utf16_to_file_position(text, Utf16Position { line: 1, column: 0 }).unwrap();
        assert_eq!(pos, (2, 1));
    }
}
