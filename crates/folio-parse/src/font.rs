//! Font resources: turning the bytes of a shown string into text.
//!
//! Lookup order per character code is the font's `/ToUnicode` map, then its
//! `/Encoding /Differences`, then WinAnsi (Latin-1 with the typographic
//! quotes and dashes at `0x80..=0x9F`). Composite (`/Type0`) fonts use
//! two-byte codes and only the `/ToUnicode` map can name their glyphs.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::cmap::ToUnicodeMap;
use crate::decode::{resolve, stream_bytes};

const REPLACEMENT: char = '\u{FFFD}';

/// A font dictionary reduced to what text decoding needs.
#[derive(Debug, Clone, Default)]
pub(crate) struct Font {
    two_byte: bool,
    to_unicode: Option<ToUnicodeMap>,
    differences: HashMap<u8, String>,
}

/// Text decoded from one shown string.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Decoded {
    pub text: String,
    /// Character codes consumed; each is one glyph on the page.
    pub glyphs: usize,
}

impl Font {
    /// Read a font dictionary from a page's `/Resources /Font` entry.
    pub fn load(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Self {
        let two_byte = dict
            .get(b"Subtype")
            .and_then(lopdf::Object::as_name)
            .is_ok_and(|subtype| subtype == b"Type0");
        let base = dict
            .get(b"BaseFont")
            .and_then(lopdf::Object::as_name)
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .unwrap_or_default();

        let to_unicode = dict.get(b"ToUnicode").ok().and_then(|obj| {
            let stream = resolve(doc, obj).as_stream().ok()?;
            let data = stream_bytes(stream).ok()?;
            match ToUnicodeMap::parse(&data) {
                Ok(map) if !map.is_empty() => Some(map),
                Ok(_) => None,
                Err(err) => {
                    warn!(font = %base, %err, "ignoring unreadable /ToUnicode map");
                    None
                }
            }
        });
        if two_byte && to_unicode.is_none() {
            debug!(font = %base, "composite font without /ToUnicode; glyphs will be replaced");
        }

        let differences = if two_byte {
            HashMap::new()
        } else {
            differences(doc, dict)
        };

        Self {
            two_byte,
            to_unicode,
            differences,
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Decoded {
        let mut text = String::new();
        let mut glyphs = 0;
        if self.two_byte {
            for pair in bytes.chunks_exact(2) {
                let code = u32::from(u16::from_be_bytes([pair[0], pair[1]]));
                match self.to_unicode.as_ref().and_then(|map| map.get(code)) {
                    Some(mapped) => text.push_str(mapped),
                    None => text.push(REPLACEMENT),
                }
                glyphs += 1;
            }
        } else {
            for &byte in bytes {
                if let Some(mapped) = self.to_unicode.as_ref().and_then(|map| map.get(byte.into()))
                {
                    text.push_str(mapped);
                } else if let Some(mapped) = self.differences.get(&byte) {
                    text.push_str(mapped);
                } else if let Some(ch) = win_ansi(byte) {
                    text.push(ch);
                }
                glyphs += 1;
            }
        }
        Decoded { text, glyphs }
    }
}

/// `code -> text` overrides from an `/Encoding` dictionary's `/Differences`.
///
/// The array reads `[code /name /name … code /name …]`: each integer starts a
/// run and every following name takes the next code.
fn differences(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> HashMap<u8, String> {
    let mut overrides = HashMap::new();
    let Some(array) = dict
        .get(b"Encoding")
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .and_then(|encoding| encoding.get(b"Differences").ok())
        .and_then(|obj| resolve(doc, obj).as_array().ok())
    else {
        return overrides;
    };

    let mut code: Option<i64> = None;
    for item in array {
        match item {
            lopdf::Object::Integer(start) => code = Some(*start),
            lopdf::Object::Name(name) => {
                let Some(current) = code else {
                    continue;
                };
                if let (Ok(byte), Some(text)) = (
                    u8::try_from(current),
                    glyph_text(&String::from_utf8_lossy(name)),
                ) {
                    overrides.insert(byte, text);
                }
                code = Some(current + 1);
            }
            _ => {}
        }
    }
    overrides
}

/// Unicode text for a PostScript glyph name.
///
/// Handles `uniXXXX` and `uXXXX` forms, single-character names, and the
/// glyph names typeset prose actually uses. Suffixes such as `.sc` or `.alt`
/// are ignored.
fn glyph_text(name: &str) -> Option<String> {
    let name = name.split('.').next().unwrap_or(name);

    if let Some(hex) = name.strip_prefix("uni") {
        if !hex.is_empty() && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = hex
                .as_bytes()
                .chunks(4)
                .map(|chunk| u16::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok())
                .collect();
            return units.map(|units| String::from_utf16_lossy(&units));
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from);
        }
    }

    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphabetic() {
            return Some(ch.to_string());
        }
    }

    let text = match name {
        "space" | "nbspace" => " ",
        "exclam" => "!",
        "quotedbl" => "\"",
        "numbersign" => "#",
        "dollar" => "$",
        "percent" => "%",
        "ampersand" => "&",
        "quotesingle" => "'",
        "parenleft" => "(",
        "parenright" => ")",
        "asterisk" => "*",
        "plus" => "+",
        "comma" => ",",
        "hyphen" | "minus" => "-",
        "period" => ".",
        "slash" => "/",
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "colon" => ":",
        "semicolon" => ";",
        "less" => "<",
        "equal" => "=",
        "greater" => ">",
        "question" => "?",
        "at" => "@",
        "bracketleft" => "[",
        "backslash" => "\\",
        "bracketright" => "]",
        "underscore" => "_",
        "braceleft" => "{",
        "bar" => "|",
        "braceright" => "}",
        "quoteleft" => "\u{2018}",
        "quoteright" => "\u{2019}",
        "quotedblleft" => "\u{201C}",
        "quotedblright" => "\u{201D}",
        "endash" => "\u{2013}",
        "emdash" => "\u{2014}",
        "ellipsis" => "\u{2026}",
        "bullet" => "\u{2022}",
        "dagger" => "\u{2020}",
        "daggerdbl" => "\u{2021}",
        "section" => "\u{00A7}",
        "paragraph" => "\u{00B6}",
        "copyright" => "\u{00A9}",
        "registered" => "\u{00AE}",
        "trademark" => "\u{2122}",
        "degree" => "\u{00B0}",
        "multiply" => "\u{00D7}",
        "fi" => "fi",
        "fl" => "fl",
        "ff" => "ff",
        "ffi" => "ffi",
        "ffl" => "ffl",
        "eacute" => "\u{00E9}",
        "egrave" => "\u{00E8}",
        "aacute" => "\u{00E1}",
        "odieresis" => "\u{00F6}",
        "udieresis" => "\u{00FC}",
        _ => return None,
    };
    Some(text.to_string())
}

/// WinAnsiEncoding: Latin-1 except for the `0x80..=0x9F` block.
fn win_ansi(byte: u8) -> Option<char> {
    let ch = match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        0x81 | 0x8D | 0x8F | 0x90 | 0x9D => return None,
        other => char::from(other),
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, Stream, dictionary};

    fn tounicode(doc: &mut lopdf::Document, body: &str) -> Object {
        Object::Reference(doc.add_object(Stream::new(dictionary! {}, body.as_bytes().to_vec())))
    }

    #[test]
    fn type0_reads_two_byte_codes_through_tounicode() {
        let mut doc = lopdf::Document::with_version("1.5");
        let map = tounicode(
            &mut doc,
            "3 beginbfchar <0001> <0045> <0002> <004C> <0003> <0046> endbfchar",
        );
        let font = Font::load(
            &doc,
            &dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "ABCDEF+Papyrus",
                "Encoding" => "Identity-H",
                "ToUnicode" => map,
            },
        );
        let decoded = font.decode(&[0x00, 0x01, 0x00, 0x02, 0x00, 0x03]);
        assert_eq!(decoded.text, "ELF");
        assert_eq!(decoded.glyphs, 3);
    }

    #[test]
    fn type0_without_tounicode_replaces_glyphs() {
        let doc = lopdf::Document::with_version("1.5");
        let font = Font::load(&doc, &dictionary! { "Subtype" => "Type0" });
        assert_eq!(font.decode(&[0x00, 0x07]).text, "\u{FFFD}");
    }

    #[test]
    fn simple_font_uses_differences() {
        let doc = lopdf::Document::with_version("1.5");
        let font = Font::load(
            &doc,
            &dictionary! {
                "Subtype" => "Type1",
                "Encoding" => dictionary! {
                    "Type" => "Encoding",
                    "Differences" => vec![
                        Object::Integer(1),
                        Object::Name(b"fi".to_vec()),
                        Object::Name(b"quoteright".to_vec()),
                        Object::Integer(65),
                        Object::Name(b"uni00C9".to_vec()),
                    ],
                },
            },
        );
        assert_eq!(font.decode(&[0x01, b'n', b'e']).text, "fine");
        assert_eq!(font.decode(&[0x02, b's']).text, "\u{2019}s");
        assert_eq!(font.decode(b"Alan").text, "\u{00C9}lan");
    }

    #[test]
    fn tounicode_overrides_differences() {
        let mut doc = lopdf::Document::with_version("1.5");
        let map = tounicode(&mut doc, "1 beginbfchar <41> <0042> endbfchar");
        let font = Font::load(
            &doc,
            &dictionary! {
                "Subtype" => "TrueType",
                "ToUnicode" => map,
                "Encoding" => dictionary! {
                    "Differences" => vec![Object::Integer(65), Object::Name(b"C".to_vec())],
                },
            },
        );
        assert_eq!(font.decode(b"A").text, "B");
    }

    #[test]
    fn simple_font_falls_back_to_win_ansi() {
        let font = Font::default();
        let decoded = font.decode(&[b'T', b'y', b'r', 0x97, 0x93, b'x', 0x94, 0x81]);
        assert_eq!(decoded.text, "Tyr\u{2014}\u{201C}x\u{201D}");
        assert_eq!(decoded.glyphs, 8);
    }

    #[test]
    fn glyph_names() {
        assert_eq!(glyph_text("uni0054").as_deref(), Some("T"));
        assert_eq!(glyph_text("uni00660069").as_deref(), Some("fi"));
        assert_eq!(glyph_text("u1F409").as_deref(), Some("\u{1F409}"));
        assert_eq!(glyph_text("a.sc").as_deref(), Some("a"));
        assert_eq!(glyph_text("emdash").as_deref(), Some("\u{2014}"));
        assert_eq!(glyph_text("g123"), None);
    }
}
