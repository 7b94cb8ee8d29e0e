/// Special-screening keyword vocabulary and note extraction.
///
/// A screening from a non-curated source is only worth keeping when its
/// text carries at least one of these signals.

/// Keywords that indicate a special screening, matched case-insensitively
/// as substrings of title + note + description.
pub const SPECIAL_KEYWORDS: &[&str] = &[
    // Q&A and appearances
    "q&a",
    "q & a",
    "q and a",
    "question and answer",
    "director in person",
    "director present",
    "with director",
    "filmmaker in person",
    "with filmmaker",
    "in person",
    "special guest",
    "guest appearance",
    // Premieres and special events
    "premiere",
    "opening night",
    "closing night",
    "advance screening",
    "early access",
    "sneak preview",
    "sneak peek",
    "preview screening",
    // Film formats
    "imax",
    "dolby",
    "70mm",
    "35mm",
    "16mm",
    // Restorations and anniversaries
    "restoration",
    "restored",
    "remastered",
    "4k",
    "anniversary",
    // Festival and series
    "festival",
    "nyff",
    "retrospective",
    "tribute",
    "special program",
    "repertory",
    "revival",
    "classic screening",
    "classics",
    "cult",
    // Special programming
    "exclusive",
    "limited engagement",
    "limited release",
    "double feature",
    "marathon",
    "special screening",
    "special event",
    "midnight",
    "rare",
];

/// True when the text carries at least one special-screening signal.
pub fn special_signal(text: &str) -> bool {
    let lower = text.to_lowercase();
    SPECIAL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Labelled note rules: (label, any-of trigger substrings). The order here
/// is the order labels appear in a composed note.
const NOTE_RULES: &[(&str, &[&str])] = &[
    ("Q&A", &["q&a", "q & a", "q and a"]),
    (
        "Director Appearance",
        &[
            "director in person",
            "director present",
            "director appearance",
            "with director",
        ],
    ),
    ("IMAX", &["imax"]),
    ("70mm", &["70mm"]),
    ("35mm", &["35mm"]),
    ("16mm", &["16mm"]),
    ("Dolby", &["dolby"]),
    ("Restoration", &["restoration", "restored", "4k", "remaster"]),
    ("Premiere", &["premiere", "opening night"]),
    ("Festival", &["festival", "nyff"]),
    (
        "Special Series",
        &["retrospective", "series", "tribute", "special program"],
    ),
    ("Repertory", &["repertory", "revival", "classic", "cult"]),
    ("Exclusive", &["exclusive", "limited engagement"]),
    ("Advance Screening", &["advance screening", "sneak preview", "preview screening"]),
    ("Midnight", &["midnight"]),
];

/// Extract labelled special notes from free text, e.g.
/// "4K restoration with director Q&A" → "Q&A | Director Appearance | Restoration".
/// Empty string when nothing matches.
pub fn extract_notes(text: &str) -> String {
    let lower = text.to_lowercase();
    let labels: Vec<&str> = NOTE_RULES
        .iter()
        .filter(|(_, triggers)| triggers.iter().any(|t| lower.contains(t)))
        .map(|(label, _)| *label)
        .collect();
    labels.join(" | ")
}

/// Union two pipe-delimited notes, preserving the survivor's label order
/// and dropping duplicates from the newcomer.
pub fn union_notes(survivor: Option<&str>, other: Option<&str>) -> Option<String> {
    let mut labels: Vec<String> = Vec::new();
    for note in [survivor, other].into_iter().flatten() {
        for label in note.split('|').map(str::trim).filter(|l| !l.is_empty()) {
            if !labels.iter().any(|existing| existing.eq_ignore_ascii_case(label)) {
                labels.push(label.to_string());
            }
        }
    }
    if labels.is_empty() {
        None
    } else {
        Some(labels.join(" | "))
    }
}
