//! Defensive text cleanup for model output.
//!
//! Two audiences: `sanitize_raw` cleans the whole model turn before any
//! parse strategy runs, and `sanitize_assistant_message` cleans the
//! human-readable message field, which the model occasionally pollutes with
//! leaked JSON fragments (button options shaped like `{label, value}` are
//! the recurring offender).

/// Generic prompt substituted when sanitization leaves nothing readable.
pub const FALLBACK_PROMPT: &str = "How can I help you?";

/// Messages shorter than this after cleanup are considered destroyed.
const MIN_MESSAGE_LENGTH: usize = 5;

/// Prose the model wraps around its JSON despite instructions.
const PROSE_MARKERS: [&str; 4] = [
    "here's the json:",
    "here is the json:",
    "here's the response:",
    "json response:",
];

/// Cleans a raw model turn before any parse strategy runs.
///
/// Strips control characters and null bytes, removes "here's the JSON"
/// prose markers, and converts *literal* two-character escape sequences
/// (`\n` as backslash-n, not a real newline) into spaces — the model
/// sometimes returns pretty-printed JSON re-escaped as a single string.
/// Code fences are left in place; the parse strategies own those.
pub fn sanitize_raw(raw: &str) -> String {
    let mut text = strip_control_chars(raw);
    text = strip_prose_markers(&text);
    text = text.replace("\\n", " ").replace("\\r", " ").replace("\\t", " ");
    text.trim().to_string()
}

/// Cleans the human-readable assistant message.
///
/// Decodes literal `\uXXXX` escapes, rescues a trailing question when the
/// message looks corrupted, strips recognizable JSON fragments and orphaned
/// punctuation, collapses whitespace, and falls back to a generic prompt
/// when nothing readable survives.
pub fn sanitize_assistant_message(message: &str) -> String {
    let decoded = decode_unicode_escapes(message);

    let looks_corrupted = decoded.contains('{')
        || decoded.contains('[')
        || decoded.contains("\"label\"")
        || decoded.contains("\"value\"");

    if looks_corrupted {
        if let Some(question) = extract_trailing_question(&decoded) {
            return collapse_whitespace(&question);
        }
    }

    let cleaned = if looks_corrupted {
        strip_json_fragments(&decoded)
    } else {
        decoded
    };
    let cleaned = strip_orphan_punctuation(&cleaned);
    let cleaned = collapse_whitespace(&cleaned);

    if cleaned.chars().count() < MIN_MESSAGE_LENGTH {
        FALLBACK_PROMPT.to_string()
    } else {
        cleaned
    }
}

fn strip_control_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
        .collect()
}

fn strip_prose_markers(s: &str) -> String {
    let mut out = s.to_string();
    for marker in PROSE_MARKERS {
        loop {
            let lowered = out.to_ascii_lowercase();
            match lowered.find(marker) {
                Some(idx) => out.replace_range(idx..idx + marker.len(), ""),
                None => break,
            }
        }
    }
    out
}

/// Decodes literal `\uXXXX` sequences, including surrogate pairs.
///
/// Sequences that do not form a valid code point are left untouched.
fn decode_unicode_escapes(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < bytes.len() {
        match parse_unicode_escape(s, i) {
            Some((high, after_high)) if (0xD800..0xDC00).contains(&high) => {
                // high surrogate: needs a low surrogate right behind it
                match parse_unicode_escape(s, after_high) {
                    Some((low, after_low)) if (0xDC00..0xE000).contains(&low) => {
                        let combined =
                            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        if let Some(c) = char::from_u32(combined) {
                            out.push(c);
                            i = after_low;
                            continue;
                        }
                    }
                    _ => {}
                }
                out.push_str(&s[i..i + 1]);
                i += 1;
            }
            Some((code, after)) => {
                if let Some(c) = char::from_u32(code) {
                    out.push(c);
                    i = after;
                } else {
                    out.push_str(&s[i..i + 1]);
                    i += 1;
                }
            }
            None => {
                let c = s[i..].chars().next().unwrap_or('\u{FFFD}');
                out.push(c);
                i += c.len_utf8();
            }
        }
    }

    out
}

/// Parses `\uXXXX` at byte offset `at`, returning the code unit and the
/// offset just past it.
fn parse_unicode_escape(s: &str, at: usize) -> Option<(u32, usize)> {
    let rest = s.get(at..)?;
    let hex = rest.strip_prefix("\\u")?.get(..4)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let code = u32::from_str_radix(hex, 16).ok()?;
    Some((code, at + 6))
}

/// Rescues a well-formed trailing question from a corrupted message.
///
/// Takes the text up to the last `?`, backtracks to the start of that
/// sentence, and accepts it only when it starts with a capital letter and
/// carries no JSON residue.
fn extract_trailing_question(s: &str) -> Option<String> {
    let question_end = s.rfind('?')?;
    let head = &s[..question_end];

    let sentence_start = head
        .rfind(&['.', '!', '?', '}', ']', '\n'][..])
        .map(|i| i + 1)
        .unwrap_or(0);

    let candidate = s[sentence_start..=question_end].trim();
    let starts_upper = candidate.chars().next().is_some_and(char::is_uppercase);

    if candidate.is_empty()
        || !starts_upper
        || candidate.contains("label")
        || candidate.contains("value")
        || candidate.contains('{')
        || candidate.contains('}')
    {
        return None;
    }

    Some(candidate.to_string())
}

/// Removes balanced `{…}` and `[…]` spans, string-aware.
///
/// An unterminated opener swallows the rest of the text, which is the right
/// outcome for truncated JSON tails.
fn strip_json_fragments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for c in s.chars() {
        if depth > 0 {
            if escape_next {
                escape_next = false;
                continue;
            }
            match c {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                _ if in_string => {}
                '{' | '[' => depth += 1,
                '}' | ']' => depth -= 1,
                _ => {}
            }
            continue;
        }

        match c {
            '{' | '[' => depth = 1,
            _ => out.push(c),
        }
    }

    out
}

fn strip_orphan_punctuation(s: &str) -> String {
    s.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | ':' | '{' | '}' | '[' | ']' | '"')
    })
    .to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
