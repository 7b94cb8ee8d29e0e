use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use marquee_common::{extract_notes, parse_show_date, Screening, Tier};

use crate::adapters::{build_screening, resolve_url, SourceAdapter};
use crate::fetch::{fetch_with_fallback, Fetcher};
use crate::sources;

const BASE_URL: &str = "https://www.timeout.com";
const LISTINGS_URL: &str = "https://www.timeout.com/newyork/film";
const WAIT_FOR: &str = "article";
const MAX_TILES: usize = 30;

/// Time Out New York film section: JS-rendered article tiles mixing
/// reviews, roundups, and event announcements.
pub struct TimeOutAdapter;

#[async_trait]
impl SourceAdapter for TimeOutAdapter {
    fn name(&self) -> &'static str {
        "timeout"
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
    let tile_sel =
        Selector::parse("article[class*='tile'], article[class*='article'], article")
            .expect("valid selector");

    doc.select(&tile_sel)
        .take(MAX_TILES)
        .filter_map(|tile| parse_tile(tile, today))
        .filter(is_special)
        .collect()
}

fn parse_tile(tile: ElementRef<'_>, today: NaiveDate) -> Option<Screening> {
    let title_sel = Selector::parse("h3, h2, h4, a[class*='title']").expect("valid selector");
    let venue_sel =
        Selector::parse("[class*='venue'], [class*='location'], [class*='theater']")
            .expect("valid selector");
    let date_sel = Selector::parse("time, [class*='date'], [class*='when']").expect("valid selector");
    let desc_sel = Selector::parse("[class*='description'], [class*='summary'], [class*='excerpt']")
        .expect("valid selector");
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let title = text_of(tile.select(&title_sel).next()?);
    // Editorial prefixes mark reviews and listicles, not screenings.
    let title = title
        .trim_start_matches("Review:")
        .trim_start_matches("Preview:")
        .trim();
    let venue = tile
        .select(&venue_sel)
        .next()
        .map(text_of)
        .unwrap_or_default();
    if venue.is_empty() {
        return None;
    }

    let mut screening = build_screening(title, &venue, Tier::Aggregator, "timeout")?;

    if let Some(date_el) = tile.select(&date_sel).next() {
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
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"));
    screening.url = resolve_url(href, BASE_URL, &screening.theater);

    Some(screening)
}

/// Keep announcements with a special signal, anything at a recognized
/// specialty house, and everything at the always-include premiere venues.
fn is_special(screening: &Screening) -> bool {
    if sources::always_include(&screening.theater) {
        return true;
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 26).unwrap()
    }

    #[test]
    fn strips_editorial_prefix_and_keeps_premiere_house() {
        let page = r#"
            <article class="tile">
              <h3>Review: Frankenstein</h3>
              <span class="venue">Paris Theater</span>
              <span class="date">Oct 31</span>
              <p class="summary">Del Toro's monster on the big screen.</p>
              <a href="/newyork/film/frankenstein">Read</a>
            </article>"#;

        let screenings = parse_listings(page, today());
        assert_eq!(screenings.len(), 1);

        let s = &screenings[0];
        assert_eq!(s.title, "Frankenstein");
        assert_eq!(s.theater, "Paris Theater");
        assert_eq!(s.tier, Tier::Aggregator);
    }

    #[test]
    fn plain_roundup_articles_are_dropped() {
        let page = r#"
            <article class="tile">
              <h3>The best movies of the year so far</h3>
              <span class="venue">Regal Times Square</span>
            </article>"#;
        assert!(parse_listings(page, today()).is_empty());
    }
}
