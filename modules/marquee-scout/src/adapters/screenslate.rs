use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use marquee_common::{extract_notes, parse_show_date, Screening, Tier};

use crate::adapters::{build_screening, resolve_url, SourceAdapter};
use crate::fetch::{fetch_with_fallback, Fetcher};

const BASE_URL: &str = "https://www.screenslate.com";
const LISTINGS_URL: &str = "https://www.screenslate.com/listings";
// One article.tile per screening once the JS listings hydrate.
const WAIT_FOR: &str = "article.tile";
const MAX_TILES: usize = 100;

/// Screenslate: city-wide listings aggregator, one tile per screening
/// across every venue in town.
pub struct ScreenslateAdapter;

#[async_trait]
impl SourceAdapter for ScreenslateAdapter {
    fn name(&self) -> &'static str {
        "screenslate"
    }

    async fn collect(&self, fetcher: &dyn Fetcher, today: NaiveDate) -> Vec<Screening> {
        let html = match fetch_with_fallback(fetcher, LISTINGS_URL, Some(WAIT_FOR)).await {
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
    let tile_sel = Selector::parse("article.tile, article[class*='listing'], div[class*='screening']")
        .expect("valid selector");

    doc.select(&tile_sel)
        .take(MAX_TILES)
        .filter_map(|tile| parse_tile(tile, today))
        .filter(is_relevant)
        .collect()
}

fn parse_tile(tile: ElementRef<'_>, today: NaiveDate) -> Option<Screening> {
    let title_sel = Selector::parse("h3, h4, h2, h1").expect("valid selector");
    let venue_sel =
        Selector::parse("a[href*='/venues/'], [class*='venue'], [class*='location']")
            .expect("valid selector");
    let date_sel = Selector::parse("time, [class*='date'], [class*='showtime']").expect("valid selector");
    let desc_sel =
        Selector::parse("[class*='description'], [class*='synopsis'], [class*='summary']")
            .expect("valid selector");
    let screening_link_sel = Selector::parse("a[href*='/screenings/']").expect("valid selector");
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let title = text_of(tile.select(&title_sel).next()?);
    let venue = tile
        .select(&venue_sel)
        .next()
        .map(text_of)
        .unwrap_or_default();
    if venue.is_empty() {
        return None;
    }

    let mut screening = build_screening(&title, &venue, Tier::Aggregator, "screenslate")?;

    if let Some(date_el) = tile.select(&date_sel).next() {
        // The datetime attribute is machine-readable; prefer it over the
        // displayed text.
        let raw = date_el
            .value()
            .attr("datetime")
            .map(str::to_string)
            .unwrap_or_else(|| text_of(date_el));
        if let Some(date) = parse_show_date(&raw, today) {
            screening = screening.with_date(date);
        }
    }

    if let Some(desc_el) = tile.select(&desc_sel).next() {
        screening = screening.with_description(truncate(&text_of(desc_el), 200));
    }

    let full_text: String = tile.text().collect();
    screening = screening.with_note(extract_notes(&full_text));

    let href = tile
        .select(&screening_link_sel)
        .next()
        .or_else(|| tile.select(&link_sel).next())
        .and_then(|a| a.value().attr("href"));
    screening.url = resolve_url(href, BASE_URL, &screening.theater);

    Some(screening)
}

/// City-wide listings include plenty of ordinary first-run showtimes.
/// Keep a tile only when it carries a special signal or plays at a
/// recognized house whose program is inherently notable.
fn is_relevant(screening: &Screening) -> bool {
    if screening.special_note.is_some() {
        return true;
    }
    screening.venue_matched
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
