use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use marquee_common::{extract_notes, parse_show_date, union_notes, Screening, Tier};

use crate::adapters::{build_screening, resolve_url, SourceAdapter};
use crate::fetch::{FetchMode, Fetcher};

const BASE_URL: &str = "https://www.newyorker.com";
const LISTINGS_URL: &str = "https://www.newyorker.com/goings-on-about-town/movies";
// The section is hand-picked; allow a few more entries than the venue pages.
const MAX_FILMS: usize = 40;

/// The New Yorker's Goings On About Town film section: editorial picks
/// spanning many venues, the strongest curation signal we collect.
pub struct NewYorkerAdapter;

#[async_trait]
impl SourceAdapter for NewYorkerAdapter {
    fn name(&self) -> &'static str {
        "new_yorker"
    }

    async fn collect(&self, fetcher: &dyn Fetcher, today: NaiveDate) -> Vec<Screening> {
        let html = match fetcher.fetch(LISTINGS_URL, FetchMode::Static, None).await {
            Ok(html) => html,
            Err(e) => {
                warn!(source = self.name(), error = %e, "Fetch failed, yielding no records");
                return Vec::new();
            }
        };

        let screenings = parse_listings(&html, today);
        info!(source = self.name(), count = screenings.len(), "Collected screenings");
        screenings
    }
}

fn parse_listings(html: &str, today: NaiveDate) -> Vec<Screening> {
    let doc = Html::parse_document(html);
    let block_sel = Selector::parse(
        "div[class*='river-item'], li[class*='goings-on'], article[class*='listing'], \
         div[class*='movie'], div[class*='film'], article[class*='card']",
    )
    .expect("valid selector");

    doc.select(&block_sel)
        .take(MAX_FILMS)
        .filter_map(|block| parse_film(block, today))
        .collect()
}

fn parse_film(block: ElementRef<'_>, today: NaiveDate) -> Option<Screening> {
    let title_sel = Selector::parse("h1, h2, h3, h4, a[class*='title']").expect("valid selector");
    let venue_sel =
        Selector::parse("[class*='venue'], [class*='location'], [class*='theater'], [class*='where']")
            .expect("valid selector");
    let date_sel =
        Selector::parse("time, [class*='date'], [class*='when'], [class*='schedule']")
            .expect("valid selector");
    let desc_sel =
        Selector::parse("[class*='dek'], [class*='description'], [class*='excerpt'], [class*='body']")
            .expect("valid selector");
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let title = text_of(block.select(&title_sel).next()?);
    let title = strip_editorial_prefix(&title);

    // Picks without a named venue cover runs across the city; keep them
    // under a catch-all so the record still surfaces.
    let venue = block
        .select(&venue_sel)
        .next()
        .map(text_of)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "Various NYC Theaters".to_string());

    let mut screening = build_screening(title, &venue, Tier::Curated, "new_yorker")?;

    if let Some(date_el) = block.select(&date_sel).next() {
        let raw = date_el
            .value()
            .attr("datetime")
            .map(str::to_string)
            .unwrap_or_else(|| text_of(date_el));
        if let Some(date) = parse_show_date(&raw, today) {
            screening = screening.with_date(date);
        }
    }

    if let Some(desc_el) = block.select(&desc_sel).next() {
        screening = screening.with_description(truncate(&text_of(desc_el), 250));
    }

    let full_text: String = block.text().collect();
    let mut note = extract_notes(&full_text);
    let lower = full_text.to_lowercase();
    if lower.contains("critic's pick") || lower.contains("critics' pick") {
        note = union_notes(Some("Critic's Pick"), Some(&note)).unwrap_or_default();
    }
    screening = screening.with_note(note);

    let href = block
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"));
    screening.url = resolve_url(href, BASE_URL, &screening.theater);

    Some(screening)
}

/// Headings mix review framing into the film title; drop it.
fn strip_editorial_prefix(title: &str) -> &str {
    for prefix in ["Review:", "Critic's Pick:", "Now Showing:"] {
        if let Some(rest) = title.strip_prefix(prefix) {
            return rest.trim();
        }
    }
    title.trim()
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 26).unwrap()
    }

    const PAGE: &str = r#"
        <html><body>
          <div class="river-item">
            <h3>Critic's Pick: The Taste of Things</h3>
            <span class="venue">Film Forum</span>
            <span class="date">Sep 5</span>
            <p class="dek">Tran Anh Hung's sumptuous kitchen romance, in a new 35mm print.</p>
            <a href="/goings-on-about-town/movies/the-taste-of-things">Read</a>
          </div>
          <div class="river-item">
            <h3>In the Mood for Love</h3>
            <p class="dek">Wong Kar-wai's masterpiece returns for one week.</p>
          </div>
        </body></html>"#;

    #[test]
    fn strips_pick_prefix_and_calls_it_out() {
        let screenings = parse_listings(PAGE, today());
        let s = screenings
            .iter()
            .find(|s| s.title == "The Taste of Things")
            .unwrap();

        assert_eq!(s.theater, "Film Forum");
        assert_eq!(s.tier, Tier::Curated);
        let note = s.special_note.as_deref().unwrap();
        assert!(note.starts_with("Critic's Pick"));
        assert!(note.contains("35mm"));
        assert_eq!(
            s.url.as_deref(),
            Some("https://www.newyorker.com/goings-on-about-town/movies/the-taste-of-things")
        );
    }

    #[test]
    fn venueless_picks_get_the_catch_all_venue() {
        let screenings = parse_listings(PAGE, today());
        let s = screenings
            .iter()
            .find(|s| s.title == "In the Mood for Love")
            .unwrap();
        assert_eq!(s.theater, "Various NYC Theaters");
        assert!(!s.venue_matched);
    }

    #[test]
    fn empty_page_yields_no_records() {
        assert!(parse_listings("<html></html>", today()).is_empty());
    }
}
