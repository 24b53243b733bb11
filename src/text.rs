//! Name normalization and Turtle literal decoding.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical comparable form of a person name or title.
///
/// Diacritics are stripped (NFKD then combining marks dropped), case is folded,
/// every non-alphanumeric character becomes a space and whitespace runs collapse.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.nfkd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Sorted, deduplicated aliases with the main name removed.
#[must_use]
pub fn clean_aliases<I, S>(name: &str, aliases: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = aliases
        .into_iter()
        .map(|alias| alias.as_ref().to_string())
        .filter(|alias| alias != name)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Decode the escape sequences allowed inside a Turtle string literal.
///
/// Unknown escapes are kept verbatim; malformed `\u` sequences fall back to
/// the replacement character.
#[must_use]
pub fn unescape_literal(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('u') => out.push(read_code_point(&mut chars, 4)),
            Some('U') => out.push(read_code_point(&mut chars, 8)),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn read_code_point(chars: &mut std::str::Chars<'_>, digits: usize) -> char {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return char::REPLACEMENT_CHARACTER;
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}
