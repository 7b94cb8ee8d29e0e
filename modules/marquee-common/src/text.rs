use regex::Regex;
use std::sync::OnceLock;

fn bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"))
}

fn venue_paren_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Trailing parenthetical naming a venue: "(at Film Forum)", "(IFC Center)".
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*\((?:at\s+)?[^)]*(?:theater|theatre|cinema|center|forum|metrograph|moma|bam|ifc|angelika|drafthouse)[^)]*\)\s*$")
            .expect("valid regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Strip source decoration from a title: `[bracketed]` tags, a trailing
/// venue parenthetical, and runs of whitespace. Community posts in
/// particular arrive as "[Tickets] Anatomy of a Fall (Film Forum)".
pub fn clean_title(raw: &str) -> String {
    let no_brackets = bracket_re().replace_all(raw, "");
    let no_venue = venue_paren_re().replace(&no_brackets, "");
    whitespace_re().replace_all(no_venue.trim(), " ").into_owned()
}

/// Lowercased, punctuation-free form used for fuzzy title comparison.
pub fn normalize_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let stripped: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    whitespace_re().replace_all(stripped.trim(), " ").into_owned()
}
