/// Turns heading text into a URL fragment id.
///
/// 1. Lowercase
/// 2. Replace each run of whitespace with a single hyphen
/// 3. Drop every character outside `[a-z0-9-]`
///
/// Identical input always yields identical output; there is no
/// per-document counter, so two headings with the same text share an anchor.
///
/// # Examples
///
/// ```
/// use quill_core::slug::slug;
///
/// assert_eq!(slug("Getting Started"), "getting-started");
/// assert_eq!(slug("What's new in v2?"), "whats-new-in-v2");
/// ```
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('-');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;

        // Lowercasing can expand to several chars (e.g. 'İ' -> "i\u{307}").
        for lower in ch.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '-' {
                out.push(lower);
            }
        }
    }

    out
}
