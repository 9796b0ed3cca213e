//! Multi-strategy recovery of structured replies from raw model output.
//!
//! The model is asked for a single JSON object but delivers it wrapped in
//! prose, fenced, re-escaped, or subtly malformed often enough that one
//! parse path is not survivable. Recovery is an ordered chain of pure
//! strategies, each owning one class of corruption and each independently
//! unit-testable. A strategy result only counts when it passes the full
//! wire-contract validation.

use thiserror::Error;

use super::reply::{ModelReply, ReplyValidationError};
use super::sanitizer::{sanitize_assistant_message, sanitize_raw};

/// Why one strategy declined the input.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StrategyError {
    #[error("not parseable JSON: {0}")]
    Json(String),

    #[error("no JSON candidate found")]
    NoCandidate,

    #[error(transparent)]
    Validation(#[from] ReplyValidationError),
}

/// Every strategy is exhausted and even salvage produced nothing usable.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("all parse strategies exhausted")]
pub struct ParseExhausted;

struct Strategy {
    name: &'static str,
    run: fn(&str) -> Result<ModelReply, StrategyError>,
}

/// Tried in order; the first validating result wins.
const STRATEGIES: [Strategy; 4] = [
    Strategy {
        name: "direct",
        run: direct_parse,
    },
    Strategy {
        name: "cleaned",
        run: cleaned_parse,
    },
    Strategy {
        name: "extracted",
        run: extracted_parse,
    },
    Strategy {
        name: "repaired",
        run: repaired_parse,
    },
];

/// Turns one raw model turn into a validated reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self
    }

    /// Runs the sanitize → strategy chain → salvage pipeline.
    ///
    /// `Err(ParseExhausted)` means the caller must answer with its own
    /// fallback and leave stage and data untouched.
    pub fn parse(&self, raw: &str) -> Result<ModelReply, ParseExhausted> {
        let sanitized = sanitize_raw(raw);

        for strategy in &STRATEGIES {
            match (strategy.run)(&sanitized) {
                Ok(mut reply) => {
                    tracing::debug!(strategy = strategy.name, "parsed model reply");
                    reply.assistant_message =
                        sanitize_assistant_message(&reply.assistant_message);
                    return Ok(reply);
                }
                Err(err) => {
                    tracing::debug!(strategy = strategy.name, %err, "parse strategy declined");
                }
            }
        }

        emergency_salvage(&sanitized).ok_or(ParseExhausted)
    }
}

fn parse_and_validate(text: &str) -> Result<ModelReply, StrategyError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| StrategyError::Json(e.to_string()))?;
    Ok(ModelReply::from_value(value)?)
}

/// Strategy 1: the whole text is the JSON object.
pub fn direct_parse(text: &str) -> Result<ModelReply, StrategyError> {
    parse_and_validate(text.trim())
}

/// Strategy 2: strip code-fence markers and leading blank lines, then parse.
pub fn cleaned_parse(text: &str) -> Result<ModelReply, StrategyError> {
    let without_fences = match fenced_block(text) {
        Some(inner) => inner.to_string(),
        None => text.replace("```json", "").replace("```", ""),
    };

    let cleaned = without_fences
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    parse_and_validate(cleaned.trim())
}

/// Strategy 3: hunt for brace-delimited candidates anywhere in the text,
/// including inside code fences, and take the first one that validates.
pub fn extracted_parse(text: &str) -> Result<ModelReply, StrategyError> {
    let mut last_error = StrategyError::NoCandidate;

    for candidate in candidates(text) {
        match parse_and_validate(&candidate) {
            Ok(reply) => return Ok(reply),
            Err(err) => last_error = err,
        }
    }

    Err(last_error)
}

/// Strategy 4: heuristic repair — normalize quotes, quote bare keys, drop
/// trailing commas, strip control characters — then extract and parse.
pub fn repaired_parse(text: &str) -> Result<ModelReply, StrategyError> {
    let repaired = repair(text);

    if let Some(span) = balanced_span(&repaired, 0) {
        if let Ok(reply) = parse_and_validate(span) {
            return Ok(reply);
        }
    }

    parse_and_validate(repaired.trim())
}

/// Strategy 5: give up on structure and rescue a human sentence.
///
/// Returns a minimal reply pinned to the initial stage with all data null.
/// `None` only when the input has nothing at all to offer.
fn emergency_salvage(text: &str) -> Option<ModelReply> {
    if text.trim().is_empty() {
        return None;
    }
    Some(ModelReply::fallback(sanitize_assistant_message(text)))
}

/// Returns the inner text of the first fenced block, if any.
fn fenced_block(s: &str) -> Option<&str> {
    for pattern in ["```json\n", "```json\r\n", "```\n", "```\r\n"] {
        if let Some(start) = s.find(pattern) {
            let inner_start = start + pattern.len();
            if let Some(end) = s[inner_start..].find("```") {
                return Some(s[inner_start..inner_start + end].trim());
            }
        }
    }
    None
}

/// Candidate JSON substrings, most specific first.
fn candidates(text: &str) -> Vec<String> {
    let mut found = Vec::new();

    if let Some(inner) = fenced_block(text) {
        found.push(inner.to_string());
    }

    // every balanced top-level object in the text
    let mut at = 0;
    while let Some(open) = text[at..].find('{').map(|i| at + i) {
        match balanced_span(text, open) {
            Some(span) => {
                found.push(span.to_string());
                at = open + span.len();
            }
            None => break,
        }
    }

    // widest cut as a last resort, for objects with unbalanced innards
    if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
        if first < last {
            found.push(text[first..=last].to_string());
        }
    }

    found.dedup();
    found
}

/// Extracts the balanced `{…}` span starting at `open`, string-aware.
fn balanced_span(s: &str, open: usize) -> Option<&str> {
    let rest = &s[open..];
    if !rest.starts_with('{') {
        return None;
    }

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in rest.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn repair(text: &str) -> String {
    let normalized: String = text
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            _ => c,
        })
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
        .collect();

    strip_trailing_commas(&quote_bare_keys(&normalized))
}

/// Quotes identifier-shaped object keys: `{stage: 1}` → `{"stage": 1}`.
fn quote_bare_keys(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape_next = false;
    let mut prev_significant = ' ';
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            prev_significant = c;
            i += 1;
            continue;
        }

        let key_position = matches!(prev_significant, '{' | ',');
        if key_position && (c.is_ascii_alphabetic() || c == '_') {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let mut lookahead = i;
            while lookahead < chars.len() && chars[lookahead].is_whitespace() {
                lookahead += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if lookahead < chars.len() && chars[lookahead] == ':' {
                out.push('"');
                out.push_str(&word);
                out.push('"');
            } else {
                out.push_str(&word);
            }
            prev_significant = chars[i - 1];
            continue;
        }

        out.push(c);
        if !c.is_whitespace() {
            prev_significant = c;
        }
        i += 1;
    }

    out
}

/// Drops commas that sit directly before a closing brace or bracket.
fn strip_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape_next = false;
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            continue;
        }

        if c == ',' {
            let next = chars[i + 1..].iter().copied().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }

        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discovery::sanitizer::FALLBACK_PROMPT;
    use crate::domain::discovery::stage::ConversationStage;

    fn reply_json() -> &'static str {
        r#"{"conversation_stage": "collecting_budget", "data_collected": {"origin_name": "São Paulo", "origin_iata": "GRU"}, "assistant_message": "Qual é o seu orçamento total?", "is_final_recommendation": false}"#
    }

    mod direct {
        use super::*;

        #[test]
        fn parses_plain_single_line_json() {
            let reply = direct_parse(reply_json()).unwrap();
            assert_eq!(reply.conversation_stage, ConversationStage::CollectingBudget);
            assert_eq!(reply.data_collected.origin_iata.as_deref(), Some("GRU"));
        }

        #[test]
        fn declines_prose() {
            assert!(matches!(
                direct_parse("hello there"),
                Err(StrategyError::Json(_))
            ));
        }

        #[test]
        fn declines_contract_violations() {
            let result = direct_parse(r#"{"conversation_stage": "collecting_origin"}"#);
            assert!(matches!(result, Err(StrategyError::Validation(_))));
        }
    }

    mod cleaned {
        use super::*;

        #[test]
        fn parses_fenced_json() {
            let text = format!("```json\n{}\n```", reply_json());
            let reply = cleaned_parse(&text).unwrap();
            assert_eq!(reply.conversation_stage, ConversationStage::CollectingBudget);
        }

        #[test]
        fn parses_fence_without_language_tag() {
            let text = format!("```\n{}\n```", reply_json());
            assert!(cleaned_parse(&text).is_ok());
        }

        #[test]
        fn skips_leading_blank_lines() {
            let text = format!("\n\n\n{}", reply_json());
            assert!(cleaned_parse(&text).is_ok());
        }
    }

    mod extracted {
        use super::*;

        #[test]
        fn finds_the_object_inside_prose() {
            let text = format!(
                "Claro! Segue a resposta estruturada: {} Espero que ajude.",
                reply_json()
            );
            let reply = extracted_parse(&text).unwrap();
            assert_eq!(reply.data_collected.origin_name.as_deref(), Some("São Paulo"));
        }

        #[test]
        fn skips_decoy_objects_until_one_validates() {
            let text = format!(r#"Opções: {{"label": "Sim", "value": "yes"}} e então {}"#, reply_json());
            assert!(extracted_parse(&text).is_ok());
        }

        #[test]
        fn declines_when_no_brace_exists() {
            assert_eq!(
                extracted_parse("nenhum json aqui"),
                Err(StrategyError::NoCandidate)
            );
        }
    }

    mod repaired {
        use super::*;

        #[test]
        fn fixes_trailing_commas() {
            let text = r#"{"conversation_stage": "collecting_budget", "data_collected": {"origin_name": "São Paulo", "origin_iata": "GRU",}, "assistant_message": "Qual é o seu orçamento?", "is_final_recommendation": false,}"#;
            assert!(repaired_parse(text).is_ok());
        }

        #[test]
        fn fixes_smart_quotes() {
            let text = reply_json().replace('"', "\u{201C}");
            assert!(repaired_parse(&text).is_ok());
        }

        #[test]
        fn quotes_bare_keys() {
            let text = r#"{conversation_stage: "collecting_budget", data_collected: {origin_name: "São Paulo", origin_iata: "GRU"}, assistant_message: "Qual é o seu orçamento?", is_final_recommendation: false}"#;
            assert!(repaired_parse(text).is_ok());
        }

        #[test]
        fn leaves_string_contents_alone() {
            let reply = repaired_parse(reply_json()).unwrap();
            assert_eq!(
                reply.assistant_message,
                "Qual é o seu orçamento total?"
            );
        }
    }

    mod full_chain {
        use super::*;

        #[test]
        fn literal_escapes_inside_the_blob_are_survivable() {
            let text = r#"{"conversation_stage": "collecting_budget",\n"data_collected": {"origin_name": "São Paulo", "origin_iata": "GRU"},\n"assistant_message": "Qual é o seu orçamento?",\n"is_final_recommendation": false}"#;
            let reply = ResponseParser::new().parse(text).unwrap();
            assert_eq!(reply.conversation_stage, ConversationStage::CollectingBudget);
        }

        #[test]
        fn garbage_falls_through_to_salvage() {
            let reply = ResponseParser::new()
                .parse("Desculpe, não consegui montar a resposta agora. Pode repetir?")
                .unwrap();

            assert_eq!(reply.conversation_stage, ConversationStage::CollectingOrigin);
            assert!(reply.data_collected.is_empty());
            assert!(reply.assistant_message.ends_with("Pode repetir?"));
        }

        #[test]
        fn pure_noise_salvages_the_generic_prompt() {
            let reply = ResponseParser::new().parse("{{{{").unwrap();
            assert_eq!(reply.assistant_message, FALLBACK_PROMPT);
        }

        #[test]
        fn empty_input_is_exhausted() {
            assert_eq!(ResponseParser::new().parse("   "), Err(ParseExhausted));
        }

        #[test]
        fn final_claim_without_destination_degrades_to_salvage() {
            let text = r#"{"conversation_stage": "recommendation_ready", "data_collected": {}, "assistant_message": "Pronto!", "is_final_recommendation": true}"#;
            let reply = ResponseParser::new().parse(text).unwrap();

            // the invalid claim is discarded wholesale
            assert!(!reply.is_final_recommendation);
            assert!(reply.data_collected.is_empty());
        }

        #[test]
        fn winning_reply_gets_its_message_sanitized() {
            let text = r#"{"conversation_stage": "collecting_budget", "data_collected": {"origin_name": "São Paulo", "origin_iata": "GRU"}, "assistant_message": "Ok! {\"label\":\"Sim\",\"value\":\"yes\"} Qual é o seu orçamento?", "is_final_recommendation": false}"#;
            let reply = ResponseParser::new().parse(text).unwrap();

            assert!(!reply.assistant_message.contains("label"));
            assert!(reply.assistant_message.ends_with("Qual é o seu orçamento?"));
        }
    }
}
