use quick_xml::escape::resolve_html5_entity;
use std::borrow::Cow;

const REPLACEMENT: &str = "\u{FFFD}";
const MAX_NAME_CHARS: usize = 32;

// Named references that HTML still honours without a trailing `;`.
const LEGACY_NAMES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren", "deg",
    "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34", "gt",
    "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

// Code points a numeric reference may not produce directly; the C1 range
// is read as windows-1252, the way browsers do.
fn remapped(code: u32) -> Option<&'static str> {
    let text = match code {
        0x00 => REPLACEMENT,
        0x0D => "\r",
        0x80 => "\u{20AC}",
        0x81 => "\u{81}",
        0x82 => "\u{201A}",
        0x83 => "\u{0192}",
        0x84 => "\u{201E}",
        0x85 => "\u{2026}",
        0x86 => "\u{2020}",
        0x87 => "\u{2021}",
        0x88 => "\u{02C6}",
        0x89 => "\u{2030}",
        0x8A => "\u{0160}",
        0x8B => "\u{2039}",
        0x8C => "\u{0152}",
        0x8D => "\u{8D}",
        0x8E => "\u{017D}",
        0x8F => "\u{8F}",
        0x90 => "\u{90}",
        0x91 => "\u{2018}",
        0x92 => "\u{2019}",
        0x93 => "\u{201C}",
        0x94 => "\u{201D}",
        0x95 => "\u{2022}",
        0x96 => "\u{2013}",
        0x97 => "\u{2014}",
        0x98 => "\u{02DC}",
        0x99 => "\u{2122}",
        0x9A => "\u{0161}",
        0x9B => "\u{203A}",
        0x9C => "\u{0153}",
        0x9D => "\u{9D}",
        0x9E => "\u{017E}",
        0x9F => "\u{0178}",
        _ => return None,
    };
    Some(text)
}

fn is_dropped(code: u32) -> bool {
    matches!(code, 0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F..=0x9F | 0xFDD0..=0xFDEF)
        || code & 0xFFFE == 0xFFFE
}

fn numeric(code: Option<u32>) -> Cow<'static, str> {
    let Some(code) = code else {
        return Cow::Borrowed(REPLACEMENT);
    };
    if let Some(text) = remapped(code) {
        return Cow::Borrowed(text);
    }
    if (0xD800..=0xDFFF).contains(&code) || code > 0x10FFFF {
        return Cow::Borrowed(REPLACEMENT);
    }
    if is_dropped(code) {
        return Cow::Borrowed("");
    }
    match char::from_u32(code) {
        Some(ch) => Cow::Owned(ch.to_string()),
        None => Cow::Borrowed(REPLACEMENT),
    }
}

fn numeric_at(tail: &str) -> Option<(usize, Cow<'static, str>)> {
    let (start, radix) = match tail.as_bytes().get(1) {
        Some(b'x' | b'X') => (2, 16),
        _ => (1, 10),
    };
    let digits = tail[start..]
        .bytes()
        .take_while(|b| if radix == 16 { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
        .count();
    if digits == 0 {
        return None;
    }
    let body = &tail[start..start + digits];
    let mut consumed = start + digits;
    if tail[consumed..].starts_with(';') {
        consumed += 1;
    }
    Some((consumed, numeric(u32::from_str_radix(body, radix).ok())))
}

fn named_at(tail: &str) -> Option<(usize, Cow<'static, str>)> {
    let name_len: usize = tail
        .chars()
        .take_while(|c| !matches!(c, '\t' | '\n' | '\x0C' | ' ' | '<' | '&' | '#' | ';'))
        .take(MAX_NAME_CHARS)
        .map(char::len_utf8)
        .sum();
    if name_len == 0 {
        return None;
    }
    let name = &tail[..name_len];
    if tail[name_len..].starts_with(';')
        && let Some(text) = resolve_html5_entity(name)
    {
        return Some((name_len + 1, Cow::Borrowed(text)));
    }
    // longest legacy prefix, e.g. `&amp d` or `&eacutex`
    (2..=name_len)
        .rev()
        .filter(|&end| name.is_char_boundary(end))
        .map(|end| (end, &name[..end]))
        .filter(|(_, prefix)| LEGACY_NAMES.contains(prefix))
        .find_map(|(end, prefix)| {
            resolve_html5_entity(prefix).map(|text| (end, Cow::Borrowed(text)))
        })
}

/// Unrecognised references stay as written.
pub fn decode_html_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = if tail.starts_with('#') {
            numeric_at(tail)
        } else {
            named_at(tail)
        };
        match decoded {
            Some((consumed, text)) => {
                out.push_str(&text);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
