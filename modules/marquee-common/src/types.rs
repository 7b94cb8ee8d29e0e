use serde::{Deserialize, Serialize};

use crate::dates::ShowDate;

/// Source tier. Lower rank is more important. The set is closed: adapters
/// assign one of these three, never an ad-hoc number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Hand-picked venues whose whole program is special screenings
    /// (Film Forum, Metrograph, Film at Lincoln Center...).
    Curated,
    /// Listings aggregators covering many venues (Screenslate, Time Out).
    Aggregator,
    /// Community posts (r/NYCmovies).
    Community,
}

impl Tier {
    pub fn rank(self) -> u8 {
        match self {
            Tier::Curated => 1,
            Tier::Aggregator => 2,
            Tier::Community => 3,
        }
    }

    /// Curated-tier records bypass the special-screening keyword filter:
    /// everything these sources list is worth including.
    pub fn is_curated(self) -> bool {
        matches!(self, Tier::Curated)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Curated => write!(f, "curated"),
            Tier::Aggregator => write!(f, "aggregator"),
            Tier::Community => write!(f, "community"),
        }
    }
}

/// One movie screening extracted from a source. Created fresh every run;
/// no identity survives across runs. Only the aggregator's merge step
/// mutates a record after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screening {
    pub title: String,
    /// Canonical venue name when recognized, the source's verbatim venue
    /// string otherwise (`venue_matched` distinguishes the two).
    pub theater: String,
    pub venue_matched: bool,
    pub show_date: Option<ShowDate>,
    pub special_note: Option<String>,
    pub description: Option<String>,
    pub ticket_info: Option<String>,
    pub url: Option<String>,
    pub tier: Tier,
    /// Which adapter produced this record. Provenance and tie-breaking only.
    pub source: String,
}

impl Screening {
    pub fn new(
        title: impl Into<String>,
        theater: impl Into<String>,
        tier: Tier,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            theater: theater.into(),
            venue_matched: false,
            show_date: None,
            special_note: None,
            description: None,
            ticket_info: None,
            url: None,
            tier,
            source: source.into(),
        }
    }

    pub fn with_date(mut self, date: ShowDate) -> Self {
        self.show_date = Some(date);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        if !note.is_empty() {
            self.special_note = Some(note);
        }
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.is_empty() {
            self.description = Some(description);
        }
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.is_empty() {
            self.url = Some(url);
        }
        self
    }

    /// Count of populated optional fields. Used as the merge tie-break:
    /// when two duplicates share a tier, the more specific record survives.
    pub fn specificity(&self) -> usize {
        [
            self.show_date.is_some(),
            self.special_note.is_some(),
            self.description.is_some(),
            self.ticket_info.is_some(),
            self.url.is_some(),
        ]
        .iter()
        .filter(|&&populated| populated)
        .count()
    }

    /// All free text carrying special-screening signal.
    pub fn signal_text(&self) -> String {
        let mut text = self.title.clone();
        if let Some(ref note) = self.special_note {
            text.push(' ');
            text.push_str(note);
        }
        if let Some(ref description) = self.description {
            text.push(' ');
            text.push_str(description);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn tier_ranks_are_ordered() {
        assert!(Tier::Curated.rank() < Tier::Aggregator.rank());
        assert!(Tier::Aggregator.rank() < Tier::Community.rank());
        assert!(Tier::Curated < Tier::Aggregator);
    }

    #[test]
    fn specificity_counts_populated_fields() {
        let bare = Screening::new("Playtime", "Film Forum", Tier::Curated, "film_forum");
        assert_eq!(bare.specificity(), 0);

        let full = Screening::new("Playtime", "Film Forum", Tier::Curated, "film_forum")
            .with_date(ShowDate::date_only(
                NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
            ))
            .with_note("70mm")
            .with_url("https://filmforum.org/film/playtime");
        assert_eq!(full.specificity(), 3);
    }

    #[test]
    fn empty_optional_strings_stay_absent() {
        let s = Screening::new("Playtime", "Film Forum", Tier::Curated, "film_forum")
            .with_note("")
            .with_description("")
            .with_url("");
        assert!(s.special_note.is_none());
        assert!(s.description.is_none());
        assert!(s.url.is_none());
    }

    #[test]
    fn signal_text_concatenates_title_note_description() {
        let s = Screening::new("Oppenheimer", "AMC Lincoln Square", Tier::Aggregator, "timeout")
            .with_note("70mm")
            .with_description("Nolan's biopic");
        let text = s.signal_text();
        assert!(text.contains("Oppenheimer"));
        assert!(text.contains("70mm"));
        assert!(text.contains("biopic"));
    }
}
