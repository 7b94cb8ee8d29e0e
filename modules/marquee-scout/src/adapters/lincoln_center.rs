use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use marquee_common::{extract_notes, parse_show_date, union_notes, Screening, Tier};

use crate::adapters::{build_screening, resolve_url, SourceAdapter};
use crate::fetch::{fetch_with_fallback, Fetcher};

const BASE_URL: &str = "https://www.filmlinc.org";
// React app: nothing useful in the initial document, wait for cards.
const WAIT_FOR: &str = "[class*='film'], [class*='card'], article";
const MAX_FILMS: usize = 50;

/// Film at Lincoln Center: JavaScript-rendered, home of NYFF.
pub struct LincolnCenterAdapter;

#[async_trait]
impl SourceAdapter for LincolnCenterAdapter {
    fn name(&self) -> &'static str {
        "lincoln_center"
    }

    async fn collect(&self, fetcher: &dyn Fetcher, today: NaiveDate) -> Vec<Screening> {
        let html = match fetch_with_fallback(fetcher, BASE_URL, Some(WAIT_FOR)).await {
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
        "div[class*='film'], article[class*='film'], div[class*='card'], \
         article[class*='card'], li[class*='screening'], section[class*='series']",
    )
    .expect("valid selector");

    doc.select(&block_sel)
        .take(MAX_FILMS)
        .filter_map(|block| parse_film(block, today))
        .collect()
}

fn parse_film(block: ElementRef<'_>, today: NaiveDate) -> Option<Screening> {
    let title_sel = Selector::parse("h1, h2, h3, h4, h5").expect("valid selector");
    let date_sel =
        Selector::parse("time, [class*='date'], [class*='showtime'], [class*='session']")
            .expect("valid selector");
    let desc_sel =
        Selector::parse("[class*='description'], [class*='synopsis'], [class*='overview']")
            .expect("valid selector");
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let title = text_of(block.select(&title_sel).next()?);
    let mut screening = build_screening(
        &title,
        "Film at Lincoln Center",
        Tier::Curated,
        "lincoln_center",
    )?;

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
        screening = screening.with_description(truncate(&text_of(desc_el), 200));
    }

    let full_text: String = block.text().collect();
    let mut note = extract_notes(&full_text);
    // NYFF gets called out explicitly; it outranks the generic festival label.
    let lower = full_text.to_lowercase();
    if lower.contains("nyff") || lower.contains("new york film festival") {
        note = union_notes(Some("NYFF"), Some(&note)).unwrap_or_default();
    }
    screening = screening.with_note(note);

    let href = block
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"));
    screening.url = resolve_url(href, BASE_URL, &screening.theater);

    Some(screening)
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
    fn parses_rendered_cards() {
        let page = r#"
            <div class="film-card">
              <h3>The Zone of Interest</h3>
              <span class="session-date">Oct 3 6:00 PM</span>
              <p class="overview">NYFF Main Slate selection with director Q&amp;A.</p>
              <a href="/films/zone-of-interest">Tickets</a>
            </div>"#;

        let screenings = parse_listings(page, today());
        assert_eq!(screenings.len(), 1);

        let s = &screenings[0];
        assert_eq!(s.theater, "Film at Lincoln Center");
        assert_eq!(s.tier, Tier::Curated);
        let note = s.special_note.as_deref().unwrap();
        assert!(note.starts_with("NYFF"));
        assert!(note.contains("Q&A"));
    }

    #[test]
    fn titleless_cards_are_skipped() {
        let page = r#"<div class="film-card"><p class="overview">Coming soon.</p></div>"#;
        assert!(parse_listings(page, today()).is_empty());
    }
}
