//! Free-form tag input.

use std::collections::BTreeSet;

/// Split user input into a sorted, de-duplicated tag list.
///
/// Text in double quotes is taken as one tag. The rest is split on commas
/// if it contains one (so tags may contain spaces), otherwise on whitespace.
/// An unterminated quote is read as plain text.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags = BTreeSet::new();
    let mut rest = String::new();
    let mut quoted: Option<String> = None;

    for ch in input.chars() {
        match quoted.as_mut() {
            None if ch == '"' => quoted = Some(String::new()),
            None => rest.push(ch),
            Some(buf) if ch == '"' => {
                tags.insert(buf.trim().to_string());
                quoted = None;
                rest.push(' ');
            }
            Some(buf) => buf.push(ch),
        }
    }
    if let Some(buf) = quoted {
        rest.push_str(&buf);
    }

    let parts: Box<dyn Iterator<Item = &str>> = if rest.contains(',') {
        Box::new(rest.split(','))
    } else {
        Box::new(rest.split_whitespace())
    };
    tags.extend(parts.map(|t| t.trim().to_string()));

    tags.into_iter().filter(|t| !t.is_empty()).collect()
}

/// Inverse of `parse_tags` for pre-filling the edit form. Tags holding a
/// comma or whitespace are quoted.
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| {
            if tag.contains(|c: char| c == ',' || c.is_whitespace()) {
                format!("\"{tag}\"")
            } else {
                tag.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
