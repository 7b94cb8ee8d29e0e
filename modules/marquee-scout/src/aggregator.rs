use std::cmp::Reverse;

use chrono::{NaiveDate, NaiveTime};
use strsim::jaro_winkler;
use tracing::{debug, info};

use marquee_common::{clean_title, normalize_title, special_signal, union_notes, Screening, ShowDate};

use crate::awards::AwardsLookup;
use crate::sources;

/// Jaro-Winkler similarity on normalized titles at or above this value
/// counts as the same film. Tuned so decorated variants of one title
/// match while genuinely different films stay apart.
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.90;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregateStats {
    pub dropped_invalid: usize,
    pub duplicates_merged: usize,
    pub filtered_out: usize,
}

/// Collapse the union of all adapters' records into the final ordered,
/// deduplicated, filtered list.
///
/// The merge is order-independent: records are first sorted into a
/// canonical order by a total deterministic key, so whichever order the
/// adapters happened to deliver them in, the same survivor wins every
/// cluster and the output is identical.
pub fn aggregate(
    records: Vec<Screening>,
    awards: &dyn AwardsLookup,
) -> (Vec<Screening>, AggregateStats) {
    let mut stats = AggregateStats::default();

    let before = records.len();
    let mut records = sanitize(records);
    stats.dropped_invalid = before - records.len();

    records.sort_by_key(canonical_key);

    let mut survivors: Vec<Screening> = Vec::new();
    for record in records {
        match survivors.iter().position(|s| same_event(s, &record)) {
            Some(i) => {
                merge_into(&mut survivors[i], record);
                stats.duplicates_merged += 1;
            }
            None => survivors.push(record),
        }
    }

    let before = survivors.len();
    survivors.retain(is_keeper);
    stats.filtered_out = before - survivors.len();

    for screening in &mut survivors {
        enrich(screening, awards);
    }

    survivors.sort_by_key(output_key);

    info!(
        published = survivors.len(),
        merged = stats.duplicates_merged,
        filtered = stats.filtered_out,
        invalid = stats.dropped_invalid,
        "Aggregation complete"
    );

    (survivors, stats)
}

/// Enforce the non-empty invariants. A record that loses its title or
/// theater to normalization is dropped, never padded with placeholders.
fn sanitize(records: Vec<Screening>) -> Vec<Screening> {
    records
        .into_iter()
        .filter_map(|mut s| {
            s.title = clean_title(&s.title);
            s.theater = s.theater.trim().to_string();
            if s.title.is_empty() || s.theater.is_empty() {
                debug!(source = %s.source, "Dropping record that failed normalization");
                return None;
            }
            Some(s)
        })
        .collect()
}

/// Total deterministic pre-merge order: most important tier first, then
/// most specific, then provenance and content for a stable tail. The
/// head of each duplicate cluster under this order is exactly the record
/// the merge policy says should survive.
fn canonical_key(s: &Screening) -> impl Ord {
    (
        s.tier.rank(),
        Reverse(s.specificity()),
        s.source.clone(),
        normalize_title(&s.title),
        s.theater.to_lowercase(),
        date_key(&s.show_date),
    )
}

/// Final output order: tier, then date with dateless records last, then
/// theater and title for determinism.
fn output_key(s: &Screening) -> impl Ord {
    (
        s.tier.rank(),
        date_key(&s.show_date),
        s.theater.clone(),
        s.title.clone(),
        s.source.clone(),
    )
}

fn date_key(date: &Option<ShowDate>) -> (u8, NaiveDate, NaiveTime) {
    match date {
        Some(d) => (0, d.date, d.time.unwrap_or(NaiveTime::MIN)),
        None => (1, NaiveDate::MAX, NaiveTime::MIN),
    }
}

/// Fuzzy title identity. Symmetric by construction.
pub fn similar_titles(a: &str, b: &str) -> bool {
    jaro_winkler(&normalize_title(a), &normalize_title(b)) >= TITLE_SIMILARITY_THRESHOLD
}

/// The dedup identity rule: fuzzy-equal titles, exactly equal normalized
/// venues, and dates on the same calendar day (or absent on both sides).
fn same_event(a: &Screening, b: &Screening) -> bool {
    if !a.theater.eq_ignore_ascii_case(&b.theater) {
        return false;
    }
    match (&a.show_date, &b.show_date) {
        (Some(x), Some(y)) => {
            if !x.same_day(y) {
                return false;
            }
        }
        (None, None) => {}
        _ => return false,
    }
    similar_titles(&a.title, &b.title)
}

/// Fold a duplicate into its survivor: union note signals, fill optional
/// fields the survivor lacks. The survivor's identity fields stay put.
fn merge_into(survivor: &mut Screening, dup: Screening) {
    survivor.special_note =
        union_notes(survivor.special_note.as_deref(), dup.special_note.as_deref());

    if survivor.description.is_none() {
        survivor.description = dup.description;
    }
    if survivor.ticket_info.is_none() {
        survivor.ticket_info = dup.ticket_info;
    }
    if survivor.url.is_none() {
        survivor.url = dup.url;
    }
    // A duplicate can sharpen a date-only record with a showtime.
    if let (Some(mine), Some(theirs)) = (&mut survivor.show_date, &dup.show_date) {
        if mine.time.is_none() {
            mine.time = theirs.time;
        }
    }
    survivor.venue_matched |= dup.venue_matched;
}

/// Filter rule: curated sources and always-include venues pass outright;
/// everything else needs at least one special-screening signal.
fn is_keeper(s: &Screening) -> bool {
    s.tier.is_curated() || sources::always_include(&s.theater) || special_signal(&s.signal_text())
}

fn enrich(s: &mut Screening, awards: &dyn AwardsLookup) {
    if let Some(ctx) = awards.lookup(&s.title) {
        let line = ctx.summary();
        s.description = Some(match s.description.take() {
            Some(d) => format!("{d} {line}"),
            None => line,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awards::{AwardsContext, NoopAwards};
    use marquee_common::Tier;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn at(m: u32, d: u32, h: u32) -> ShowDate {
        ShowDate::at(day(m, d), NaiveTime::from_hms_opt(h, 0, 0).unwrap())
    }

    fn fingerprint(screenings: &[Screening]) -> Vec<(String, String, u8, Option<String>)> {
        screenings
            .iter()
            .map(|s| {
                (
                    s.title.clone(),
                    s.theater.clone(),
                    s.tier.rank(),
                    s.special_note.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn empty_input_is_a_valid_run() {
        let (out, stats) = aggregate(Vec::new(), &NoopAwards);
        assert!(out.is_empty());
        assert_eq!(stats, AggregateStats::default());
    }

    #[test]
    fn records_failing_normalization_are_dropped() {
        let records = vec![
            Screening::new("[Sold Out]", "IFC Center", Tier::Curated, "ifc_center"),
            Screening::new("Playtime", "   ", Tier::Curated, "film_forum"),
            Screening::new("Playtime", "Film Forum", Tier::Curated, "film_forum"),
        ];
        let (out, stats) = aggregate(records, &NoopAwards);
        assert_eq!(out.len(), 1);
        assert_eq!(stats.dropped_invalid, 2);
    }

    #[test]
    fn decorated_duplicate_merges_into_one_enriched_record() {
        let a = Screening::new("Anatomy of a Fall", "Film Forum", Tier::Aggregator, "screenslate")
            .with_date(at(11, 20, 19))
            .with_note("Q&A");
        let b = Screening::new(
            "Anatomy of a Fall (Film Forum)",
            "Film Forum",
            Tier::Community,
            "reddit",
        )
        .with_date(ShowDate::date_only(day(11, 20)))
        .with_description("Triet in attendance.");

        let (out, stats) = aggregate(vec![a, b], &NoopAwards);
        assert_eq!(out.len(), 1);
        assert_eq!(stats.duplicates_merged, 1);

        let s = &out[0];
        assert_eq!(s.title, "Anatomy of a Fall");
        assert_eq!(s.tier, Tier::Aggregator);
        assert_eq!(s.show_date.unwrap().date, day(11, 20));
        assert_eq!(s.special_note.as_deref(), Some("Q&A"));
        assert_eq!(s.description.as_deref(), Some("Triet in attendance."));
    }

    #[test]
    fn survivor_tier_is_the_minimum_of_the_pair() {
        let curated = Screening::new("Playtime", "Film Forum", Tier::Curated, "film_forum")
            .with_date(ShowDate::date_only(day(9, 4)));
        let community = Screening::new("Playtime!", "Film Forum", Tier::Community, "reddit")
            .with_date(ShowDate::date_only(day(9, 4)))
            .with_note("70mm")
            .with_description("Rare print.")
            .with_url("https://reddit.com/x");

        // The community copy is more specific, but tier wins first.
        let (out, _) = aggregate(vec![community, curated], &NoopAwards);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tier, Tier::Curated);
        assert_eq!(out[0].source, "film_forum");
        assert_eq!(out[0].special_note.as_deref(), Some("70mm"));
        assert_eq!(out[0].description.as_deref(), Some("Rare print."));
    }

    #[test]
    fn aggregation_is_order_independent() {
        let records = vec![
            Screening::new("Anatomy of a Fall", "Film Forum", Tier::Aggregator, "screenslate")
                .with_date(at(11, 20, 19))
                .with_note("Q&A"),
            Screening::new("Anatomy of a Fall", "Film Forum", Tier::Community, "reddit")
                .with_date(ShowDate::date_only(day(11, 20)))
                .with_note("35mm"),
            Screening::new("Playtime", "Film Forum", Tier::Curated, "film_forum")
                .with_note("Repertory | 70mm"),
            Screening::new("Suspiria", "IFC Center", Tier::Curated, "ifc_center")
                .with_date(at(8, 28, 23)),
        ];

        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(2);

        let (a, _) = aggregate(records, &NoopAwards);
        let (b, _) = aggregate(reversed, &NoopAwards);
        let (c, _) = aggregate(rotated, &NoopAwards);

        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = vec![
            Screening::new("Heat", "Metrograph", Tier::Curated, "metrograph")
                .with_date(at(9, 12, 19))
                .with_note("70mm"),
            Screening::new("Heat", "Metrograph", Tier::Community, "reddit")
                .with_date(ShowDate::date_only(day(9, 12))),
        ];
        let (once, _) = aggregate(records, &NoopAwards);
        let (twice, _) = aggregate(once.clone(), &NoopAwards);
        assert_eq!(fingerprint(&once), fingerprint(&twice));
    }

    #[test]
    fn identity_rule_is_symmetric() {
        let a = Screening::new("Anatomy of a Fall", "Film Forum", Tier::Curated, "x")
            .with_date(ShowDate::date_only(day(11, 20)));
        let b = Screening::new("Anatomy of a Fall (35mm)", "Film Forum", Tier::Community, "y")
            .with_date(at(11, 20, 19));
        let c = Screening::new("Oppenheimer", "Film Forum", Tier::Community, "z")
            .with_date(ShowDate::date_only(day(11, 20)));

        assert!(same_event(&a, &b));
        assert!(same_event(&b, &a));
        assert!(!same_event(&a, &c));
        assert!(!same_event(&c, &a));
    }

    #[test]
    fn different_days_and_missing_dates_do_not_merge() {
        let friday = Screening::new("Heat", "Metrograph", Tier::Curated, "metrograph")
            .with_date(ShowDate::date_only(day(9, 11)));
        let saturday = Screening::new("Heat", "Metrograph", Tier::Curated, "metrograph")
            .with_date(ShowDate::date_only(day(9, 12)));
        let undated = Screening::new("Heat", "Metrograph", Tier::Curated, "metrograph");

        let (out, stats) = aggregate(vec![friday, saturday, undated], &NoopAwards);
        assert_eq!(out.len(), 3);
        assert_eq!(stats.duplicates_merged, 0);
    }

    #[test]
    fn filter_requires_signal_outside_curated_and_priority_venues() {
        let records = vec![
            // Non-curated, no signal: dropped.
            Screening::new("Oppenheimer", "IFC Center", Tier::Aggregator, "screenslate"),
            // Same title with a format signal: kept.
            Screening::new("Oppenheimer", "AMC Village 7", Tier::Aggregator, "screenslate")
                .with_note("70mm"),
            // Curated tier passes without keywords.
            Screening::new("Quiet Drama", "Metrograph", Tier::Curated, "metrograph"),
            // Always-include venue passes without keywords.
            Screening::new("Frankenstein", "Paris Theater", Tier::Aggregator, "timeout"),
        ];

        let (out, stats) = aggregate(records, &NoopAwards);
        assert_eq!(stats.filtered_out, 1);
        assert!(!out
            .iter()
            .any(|s| s.title == "Oppenheimer" && s.theater == "IFC Center"));
        assert!(out
            .iter()
            .any(|s| s.title == "Oppenheimer" && s.special_note.as_deref() == Some("70mm")));
        assert!(out
            .iter()
            .all(|s| s.tier.is_curated()
                || sources::always_include(&s.theater)
                || special_signal(&s.signal_text())));
    }

    #[test]
    fn output_ordered_by_tier_then_date_then_theater() {
        let records = vec![
            Screening::new("Late Film", "Metrograph", Tier::Curated, "metrograph")
                .with_date(ShowDate::date_only(day(9, 20))),
            Screening::new("Dateless Film", "Film Forum", Tier::Curated, "film_forum"),
            Screening::new("Early Film", "Film Forum", Tier::Curated, "film_forum")
                .with_date(ShowDate::date_only(day(9, 1))),
            Screening::new("Community Pick", "IFC Center", Tier::Community, "reddit")
                .with_date(ShowDate::date_only(day(8, 30)))
                .with_note("Q&A"),
        ];

        let (out, _) = aggregate(records, &NoopAwards);
        let titles: Vec<&str> = out.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Early Film", "Late Film", "Dateless Film", "Community Pick"]
        );
    }

    struct OneFilm;

    impl AwardsLookup for OneFilm {
        fn lookup(&self, title: &str) -> Option<AwardsContext> {
            (normalize_title(title) == "anatomy of a fall").then(|| AwardsContext {
                festivals: vec!["Cannes 2023".to_string()],
                awards: vec!["Palme d'Or".to_string()],
                oscar_contender: false,
            })
        }
    }

    #[test]
    fn awards_context_lands_in_description() {
        let records = vec![Screening::new(
            "Anatomy of a Fall",
            "Film Forum",
            Tier::Curated,
            "film_forum",
        )];
        let (out, _) = aggregate(records, &OneFilm);
        let desc = out[0].description.as_deref().unwrap();
        assert_eq!(desc, "Awards watch: Cannes 2023; Palme d'Or");
    }
}
