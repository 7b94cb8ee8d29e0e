use async_trait::async_trait;
use chrono::NaiveDate;
use url::Url;

use marquee_common::{clean_title, normalize_venue, Screening, Tier};

use crate::fetch::Fetcher;
use crate::sources;

mod angelika;
mod film_forum;
mod ifc_center;
mod lincoln_center;
mod metrograph;
mod new_yorker;
mod reddit;
mod screenslate;
mod timeout;

pub use angelika::AngelikaAdapter;
pub use film_forum::FilmForumAdapter;
pub use ifc_center::IfcCenterAdapter;
pub use lincoln_center::LincolnCenterAdapter;
pub use metrograph::MetrographAdapter;
pub use new_yorker::NewYorkerAdapter;
pub use reddit::RedditAdapter;
pub use screenslate::ScreenslateAdapter;
pub use timeout::TimeOutAdapter;

/// One origin site. `collect` is the whole contract: fetch, parse, emit.
///
/// Adapters never fail the run. A fetch error, a parse surprise, or an
/// empty page all yield an empty vec with a logged warning; sibling
/// adapters and the aggregator proceed regardless.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn collect(&self, fetcher: &dyn Fetcher, today: NaiveDate) -> Vec<Screening>;
}

/// The full adapter roster for one run.
pub fn all_adapters() -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(NewYorkerAdapter),
        Box::new(FilmForumAdapter),
        Box::new(MetrographAdapter),
        Box::new(IfcCenterAdapter),
        Box::new(LincolnCenterAdapter),
        Box::new(AngelikaAdapter),
        Box::new(ScreenslateAdapter),
        Box::new(TimeOutAdapter),
        Box::new(RedditAdapter),
    ]
}

/// Shared record construction: clean the title, normalize the venue, and
/// refuse to build a record that would violate the non-empty invariants.
pub(crate) fn build_screening(
    raw_title: &str,
    raw_venue: &str,
    tier: Tier,
    source: &'static str,
) -> Option<Screening> {
    // Non-empty after normalization is the whole requirement; one-letter
    // repertory titles ("M", "Z") are legitimate.
    let title = clean_title(raw_title);
    if title.is_empty() {
        return None;
    }
    let venue = normalize_venue(raw_venue)?;

    let mut screening = Screening::new(title, venue.name, tier, source);
    screening.venue_matched = venue.matched;
    Some(screening)
}

/// Resolve a scraped href against the page's base URL, falling back to
/// the venue homepage so published records always link somewhere.
pub(crate) fn resolve_url(href: Option<&str>, base: &str, theater: &str) -> Option<String> {
    if let Some(h) = href.map(str::trim).filter(|h| !h.is_empty()) {
        // Url::join handles absolute, root-relative, and protocol-relative
        // hrefs alike.
        if let Ok(joined) = Url::parse(base).and_then(|b| b.join(h)) {
            return Some(joined.to_string());
        }
    }
    sources::venue_url(theater).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_screening_normalizes_title_and_venue() {
        let s = build_screening(
            "[Tickets] Playtime",
            "the IFC",
            Tier::Community,
            "reddit",
        )
        .unwrap();
        assert_eq!(s.title, "Playtime");
        assert_eq!(s.theater, "IFC Center");
        assert!(s.venue_matched);
    }

    #[test]
    fn build_screening_rejects_empty_fields() {
        assert!(build_screening("", "Film Forum", Tier::Curated, "film_forum").is_none());
        assert!(build_screening("[Gone]", "Film Forum", Tier::Curated, "film_forum").is_none());
        assert!(build_screening("Playtime", "  ", Tier::Curated, "film_forum").is_none());
    }

    #[test]
    fn one_letter_titles_are_legitimate() {
        let s = build_screening("M", "Film Forum", Tier::Curated, "film_forum").unwrap();
        assert_eq!(s.title, "M");
    }

    #[test]
    fn resolve_url_joins_relative_and_falls_back() {
        assert_eq!(
            resolve_url(Some("/film/playtime"), "https://filmforum.org", "Film Forum").as_deref(),
            Some("https://filmforum.org/film/playtime")
        );
        assert_eq!(
            resolve_url(Some("https://x.org/t"), "https://filmforum.org", "Film Forum").as_deref(),
            Some("https://x.org/t")
        );
        assert_eq!(
            resolve_url(None, "https://filmforum.org", "Metrograph").as_deref(),
            Some("https://metrograph.com/")
        );
    }

    #[test]
    fn resolve_url_handles_protocol_relative_hrefs() {
        assert_eq!(
            resolve_url(
                Some("//cdn.timeout.com/film/heat"),
                "https://www.timeout.com",
                "Metrograph",
            )
            .as_deref(),
            Some("https://cdn.timeout.com/film/heat")
        );
        // Garbage hrefs fall through to the venue homepage.
        assert_eq!(
            resolve_url(Some("   "), "https://www.timeout.com", "Metrograph").as_deref(),
            Some("https://metrograph.com/")
        );
    }
}
