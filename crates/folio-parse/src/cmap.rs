//! `/ToUnicode` CMap parsing.
//!
//! Only the `bfchar` and `bfrange` sections matter for text extraction; the
//! rest of the CMap program (codespace ranges, CIDSystemInfo boilerplate) is
//! skipped. Destination strings are UTF-16BE and may hold more than one
//! character, as ligature glyphs do.

use std::collections::HashMap;

use crate::error::ParseError;

/// Character code to Unicode text, as declared by a font's `/ToUnicode` stream.
#[derive(Debug, Clone, Default)]
pub(crate) struct ToUnicodeMap {
    mappings: HashMap<u32, String>,
}

impl ToUnicodeMap {
    /// Parse the decompressed bytes of a `/ToUnicode` stream.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let text = String::from_utf8_lossy(data);
        let mut mappings = HashMap::new();
        for section in sections(&text, "beginbfchar", "endbfchar") {
            parse_bfchar(section, &mut mappings)?;
        }
        for section in sections(&text, "beginbfrange", "endbfrange") {
            parse_bfrange(section, &mut mappings)?;
        }
        Ok(Self { mappings })
    }

    pub fn get(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// The bodies of every `begin … end` section, in order.
fn sections<'t>(text: &'t str, begin: &str, end: &str) -> Vec<&'t str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(begin) {
        let body = &rest[start + begin.len()..];
        let Some(stop) = body.find(end) else {
            break;
        };
        found.push(&body[..stop]);
        rest = &body[stop + end.len()..];
    }
    found
}

#[derive(Debug, PartialEq)]
enum Token<'t> {
    Hex(&'t str),
    Open,
    Close,
}

fn tokens(section: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut rest = section;
    while let Some(pos) = rest.find(['<', '[', ']']) {
        match rest.as_bytes()[pos] {
            b'[' => {
                out.push(Token::Open);
                rest = &rest[pos + 1..];
            }
            b']' => {
                out.push(Token::Close);
                rest = &rest[pos + 1..];
            }
            _ => {
                let body = &rest[pos + 1..];
                let Some(stop) = body.find('>') else {
                    break;
                };
                out.push(Token::Hex(&body[..stop]));
                rest = &body[stop + 1..];
            }
        }
    }
    out
}

fn parse_code(hex: &str) -> Result<u32, ParseError> {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    u32::from_str_radix(&digits, 16)
        .map_err(|e| ParseError::Parse(format!("bad CMap code <{hex}>: {e}")))
}

/// UTF-16BE code units from a hex destination string.
fn parse_units(hex: &str) -> Result<Vec<u16>, ParseError> {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    // Single-byte destinations show up in hand-written CMaps.
    let digits = if digits.len() == 2 {
        format!("00{digits}")
    } else {
        digits
    };
    if digits.len() % 4 != 0 {
        return Err(ParseError::Parse(format!(
            "CMap destination <{hex}> is not UTF-16BE"
        )));
    }
    digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            let chunk = std::str::from_utf8(chunk).unwrap_or_default();
            u16::from_str_radix(chunk, 16)
                .map_err(|e| ParseError::Parse(format!("bad CMap destination <{hex}>: {e}")))
        })
        .collect()
}

fn parse_bfchar(section: &str, mappings: &mut HashMap<u32, String>) -> Result<(), ParseError> {
    let hexes: Vec<&str> = tokens(section)
        .into_iter()
        .filter_map(|token| match token {
            Token::Hex(hex) => Some(hex),
            _ => None,
        })
        .collect();
    for pair in hexes.chunks_exact(2) {
        let code = parse_code(pair[0])?;
        mappings.insert(code, String::from_utf16_lossy(&parse_units(pair[1])?));
    }
    Ok(())
}

fn parse_bfrange(section: &str, mappings: &mut HashMap<u32, String>) -> Result<(), ParseError> {
    let tokens = tokens(section);
    let mut i = 0;
    while i + 2 < tokens.len() {
        let (Token::Hex(low), Token::Hex(high)) = (&tokens[i], &tokens[i + 1]) else {
            i += 1;
            continue;
        };
        let low = parse_code(low)?;
        // Codes are at most two bytes wide.
        let high = parse_code(high)?.clamp(low, low.saturating_add(0xFFFF));
        match &tokens[i + 2] {
            Token::Hex(start) => {
                // Incrementing the last code unit walks the destination range.
                let units = parse_units(start)?;
                for offset in 0..=(high - low) {
                    let mut units = units.clone();
                    if let Some(last) = units.last_mut() {
                        *last = last.wrapping_add(offset as u16);
                    }
                    mappings.insert(low + offset, String::from_utf16_lossy(&units));
                }
                i += 3;
            }
            Token::Open => {
                let mut code = low;
                i += 3;
                while let Some(Token::Hex(dest)) = tokens.get(i) {
                    if code <= high {
                        mappings.insert(code, String::from_utf16_lossy(&parse_units(dest)?));
                    }
                    code = code.saturating_add(1);
                    i += 1;
                }
                // Skip the closing bracket.
                i += 1;
            }
            Token::Close => i += 3,
        }
    }
    Ok(())
}
