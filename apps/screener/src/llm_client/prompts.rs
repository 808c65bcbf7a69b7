// Prompt sizing and template filling shared by extraction and scoring.
// Instruction text lives in each module's own prompts.rs.

/// Documents and job descriptions are cut to this many characters before
/// being embedded in a prompt.
pub const MAX_PROMPT_TEXT_CHARS: usize = 10_000;

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncates to the prompt budget.
pub fn prompt_excerpt(text: &str) -> &str {
    truncate_chars(text, MAX_PROMPT_TEXT_CHARS)
}

/// Replaces `{name}` placeholders in one left-to-right pass. Substituted text
/// is never rescanned, so a value containing `{name}` stays literal. Braces
/// that do not name a known placeholder are kept as-is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let placeholder = values
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));

        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
