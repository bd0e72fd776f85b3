use crate::error::{BugsheetError, Result};

/// Class marker Bugzilla puts on the element reporting how many bugs matched.
pub const RESULT_COUNT_CLASS: &str = "bz_result_count";

/// Inner text of the first element whose opening tag carries `class_name`.
/// Nested tags are stripped; whitespace is preserved verbatim because a
/// count rendered as a bare newline is meaningful to the caller.
pub fn first_text_with_class(html: &str, class_name: &str) -> Option<String> {
    let mut from = 0;
    while let Some(found) = html[from..].find(class_name) {
        let at = from + found;
        from = at + class_name.len();

        let Some(tag_start) = html[..at].rfind('<') else {
            continue;
        };
        // The marker must sit inside the opening tag, not in body text.
        if html[tag_start..at].contains('>') || !html[tag_start..at].contains("class") {
            continue;
        }
        let Some(open_len) = html[at..].find('>') else {
            continue;
        };
        let body_start = at + open_len + 1;

        let tag_name: String = html[tag_start + 1..]
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect();
        if tag_name.is_empty() {
            continue;
        }
        let close = format!("</{tag_name}");
        let Some(body_len) = html[body_start..].find(&close) else {
            continue;
        };
        return Some(strip_tags(&html[body_start..body_start + body_len]));
    }
    None
}

/// Drop tags, keep text as-is (no whitespace normalization).
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Extract the result count from a tracker query page.
///
/// The count element's text is split on the space character and the first
/// token taken. `"Zarro"` (Bugzilla's zero-result idiom) maps to `"0"`, a
/// bare newline token maps to `"1"` (markup edge where the count renders as
/// just a line break), anything else passes through verbatim.
pub fn parse_result_count(html: &str, url: &str) -> Result<String> {
    let text = first_text_with_class(html, RESULT_COUNT_CLASS).ok_or_else(|| {
        BugsheetError::parse(url, format!("no element with class {RESULT_COUNT_CLASS}"))
    })?;
    let token = text.split(' ').next().unwrap_or_default();
    Ok(match token {
        "Zarro" => "0".to_string(),
        "\n" => "1".to_string(),
        other => other.to_string(),
    })
}
