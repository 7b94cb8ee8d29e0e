/// Venue-name normalization against the fixed list of known NYC theaters.
///
/// Sources spell venues every way imaginable ("IFC", "the IFC Center",
/// "Film Society of Lincoln Center"). Normalization maps those onto one
/// canonical name so the aggregator's exact-theater identity check works.
/// Unrecognized venues are kept verbatim but flagged unmatched.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueMatch {
    pub name: String,
    pub matched: bool,
}

/// (canonical name, aliases matched case-insensitively as substrings).
/// Aliases are checked longest-first so "AMC Lincoln Square" wins over
/// a bare "lincoln" hit.
const KNOWN_VENUES: &[(&str, &[&str])] = &[
    ("AMC Lincoln Square", &["amc lincoln square", "lincoln square 13"]),
    ("AMC 84th Street", &["amc 84th", "84th street 6"]),
    (
        "Film at Lincoln Center",
        &[
            "film at lincoln center",
            "film society of lincoln center",
            "lincoln center",
            "filmlinc",
            "walter reade",
            "elinor bunin",
        ],
    ),
    ("Film Forum", &["film forum", "filmforum"]),
    ("IFC Center", &["ifc center", "ifc"]),
    ("Metrograph", &["metrograph"]),
    ("Paris Theater", &["paris theater", "paris theatre"]),
    (
        "Angelika Film Center",
        &["angelika film center", "angelika"],
    ),
    ("The Roxy Cinema", &["roxy cinema", "roxy"]),
    (
        "Alamo Drafthouse Lower Manhattan",
        &["alamo drafthouse", "drafthouse"],
    ),
    ("MoMA", &["museum of modern art", "moma"]),
    (
        "Anthology Film Archives",
        &["anthology film archives", "anthology"],
    ),
    ("Quad Cinema", &["quad cinema", "quad"]),
    ("BAM", &["bam rose", "brooklyn academy of music", "bam"]),
    ("Nitehawk Cinema", &["nitehawk"]),
];

/// Normalize a raw venue string. Returns None when the input is empty
/// after trimming; the caller drops such records rather than emitting a
/// screening with no theater.
pub fn normalize_venue(raw: &str) -> Option<VenueMatch> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();

    let mut best: Option<(&str, usize)> = None;
    for (canonical, aliases) in KNOWN_VENUES {
        for alias in *aliases {
            if lower.contains(alias) {
                let candidate = (*canonical, alias.len());
                match best {
                    Some((_, len)) if len >= alias.len() => {}
                    _ => best = Some(candidate),
                }
            }
        }
    }

    Some(match best {
        Some((canonical, _)) => VenueMatch {
            name: canonical.to_string(),
            matched: true,
        },
        None => VenueMatch {
            name: trimmed.to_string(),
            matched: false,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_map_to_themselves() {
        let m = normalize_venue("Film Forum").unwrap();
        assert_eq!(m.name, "Film Forum");
        assert!(m.matched);
    }

    #[test]
    fn aliases_resolve_to_canonical() {
        assert_eq!(normalize_venue("the IFC").unwrap().name, "IFC Center");
        assert_eq!(
            normalize_venue("Film Society of Lincoln Center").unwrap().name,
            "Film at Lincoln Center"
        );
        assert_eq!(
            normalize_venue("Walter Reade Theater").unwrap().name,
            "Film at Lincoln Center"
        );
    }

    #[test]
    fn longest_alias_wins() {
        // "AMC Lincoln Square" contains the "lincoln center" miss but the
        // longer AMC alias must win.
        let m = normalize_venue("AMC Lincoln Square 13").unwrap();
        assert_eq!(m.name, "AMC Lincoln Square");
    }

    #[test]
    fn unknown_venue_kept_verbatim_and_flagged() {
        let m = normalize_venue("Syndicated BK").unwrap();
        assert_eq!(m.name, "Syndicated BK");
        assert!(!m.matched);
    }

    #[test]
    fn empty_venue_is_rejected() {
        assert!(normalize_venue("").is_none());
        assert!(normalize_venue("   ").is_none());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let m = normalize_venue("METROGRAPH").unwrap();
        assert_eq!(m.name, "Metrograph");
        assert!(m.matched);
    }
}
