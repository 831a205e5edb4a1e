use std::ops::RangeInclusive;

/// Printable ASCII, always part of a charset.
pub const ASCII: RangeInclusive<char> = ' '..='~';

/// Sorted, deduplicated set of characters to put into an atlas.
///
/// Control characters never make it into the set; whitespace other than the
/// space character is dropped too, since layout handles it without glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    chars: Vec<char>,
}

impl Default for Charset {
    fn default() -> Self {
        Self::ascii()
    }
}

impl Charset {
    pub fn ascii() -> Self {
        Self { chars: ASCII.collect() }
    }

    /// Adds every character of `range`.
    pub fn with_range(self, range: RangeInclusive<char>) -> Self {
        self.with_chars(range)
    }

    /// Adds the characters of `symbols`, e.g. the contents of a symbols file.
    pub fn with_symbols(self, symbols: &str) -> Self {
        self.with_chars(symbols.chars())
    }

    pub fn with_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.chars.extend(chars.into_iter().filter(|&c| is_atlas_char(c)));
        self.chars.sort_unstable();
        self.chars.dedup();
        self
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.binary_search(&c).is_ok()
    }
}

fn is_atlas_char(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace())
}

/// Parses `0x2580..0x259F` (inclusive) into a char range.
pub fn parse_unicode_range(s: &str) -> Result<RangeInclusive<char>, String> {
    let Some((start_str, end_str)) = s.split_once("..") else {
        return Err(format!("Invalid range format '{s}'. Expected format: 0x20..0x7f"));
    };

    let start_code = parse_hex(start_str.trim())
        .map_err(|e| format!("Invalid start value '{start_str}': {e}"))?;
    let end_code = parse_hex(end_str.trim().trim_start_matches('='))
        .map_err(|e| format!("Invalid end value '{end_str}': {e}"))?;

    if start_code > end_code {
        return Err(format!(
            "Start value (0x{start_code:x}) cannot be greater than end value (0x{end_code:x})"
        ));
    }

    let start_char = char::from_u32(start_code)
        .ok_or_else(|| format!("Invalid Unicode code point: 0x{start_code:x}"))?;
    let end_char = char::from_u32(end_code)
        .ok_or_else(|| format!("Invalid Unicode code point: 0x{end_code:x}"))?;

    Ok(start_char..=end_char)
}

fn parse_hex(s: &str) -> Result<u32, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| format!("Expected hexadecimal format (0x...), got: {s}"))?;

    u32::from_str_radix(hex, 16).map_err(|_| format!("Invalid hexadecimal number: {s}"))
}
