//! Layered JSON decoder for untrusted model output.
//!
//! Strategies run in order and each either yields a JSON object or passes.
//! Nothing in here returns an error: an exhausted chain is simply `None`.

use serde_json::Value;
use tracing::debug;

/// One way of pulling a JSON object out of a text blob.
pub trait DecodeStrategy: Sync {
    fn name(&self) -> &'static str;
    fn decode(&self, text: &str) -> Option<Value>;
}

/// The whole response is a JSON object.
pub struct StrictJson;

/// The object sits inside a ```json ... ``` (or bare ```) fence.
pub struct FencedBlock;

/// The first balanced `{...}` span that parses.
pub struct BraceSpan;

const CHAIN: [&dyn DecodeStrategy; 3] = [&StrictJson, &FencedBlock, &BraceSpan];

/// Runs the fallback chain and returns the first JSON object found.
pub fn decode_object(text: &str) -> Option<Value> {
    for strategy in CHAIN {
        if let Some(value) = strategy.decode(text) {
            debug!("Decoded model output via {}", strategy.name());
            return Some(value);
        }
    }
    None
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate.trim())
        .ok()
        .filter(Value::is_object)
}

impl DecodeStrategy for StrictJson {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn decode(&self, text: &str) -> Option<Value> {
        parse_object(text)
    }
}

impl DecodeStrategy for FencedBlock {
    fn name(&self) -> &'static str {
        "fenced-block"
    }

    fn decode(&self, text: &str) -> Option<Value> {
        let mut rest = text;
        while let Some(open) = rest.find("```") {
            let after_fence = &rest[open + 3..];
            // Skip the info string (`json`, `JSON`, nothing) up to the newline.
            let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
            let body = &after_fence[body_start..];
            let Some(close) = body.find("```") else {
                return None;
            };
            if let Some(value) = parse_object(&body[..close]) {
                return Some(value);
            }
            rest = &body[close + 3..];
        }
        None
    }
}

impl DecodeStrategy for BraceSpan {
    fn name(&self) -> &'static str {
        "brace-span"
    }

    fn decode(&self, text: &str) -> Option<Value> {
        let mut search_from = 0;
        while let Some(offset) = text[search_from..].find('{') {
            let start = search_from + offset;
            if let Some(end) = balanced_end(&text[start..]) {
                if let Some(value) = parse_object(&text[start..start + end]) {
                    return Some(value);
                }
            }
            search_from = start + 1;
        }
        None
    }
}

/// Byte length of the balanced `{...}` span at the start of `text`, ignoring
/// braces inside string literals.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}
