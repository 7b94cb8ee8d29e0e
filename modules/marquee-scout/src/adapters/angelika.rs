use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use marquee_common::{extract_notes, parse_show_date, Screening, Tier};

use crate::adapters::{build_screening, resolve_url, SourceAdapter};
use crate::fetch::{fetch_with_fallback, Fetcher};

const BASE_URL: &str = "https://www.angelikafilmcenter.com";
const LISTINGS_URL: &str = "https://www.angelikafilmcenter.com/nyc";
// React app: wait for the movie grid to hydrate.
const WAIT_FOR: &str = ".movie-card, .film-card, [class*='movie'], [class*='film']";
const MAX_FILMS: usize = 40;

/// Words that mark concession and membership tiles sharing the movie-card
/// markup on the Angelika site.
const MENU_WORDS: &[&str] = &[
    "COFFEE",
    "ESPRESSO",
    "FOOD",
    "DRINK",
    "MENU",
    "CONCESSION",
    "BEVERAGE",
    "SNACK",
    "MEMBERSHIP",
    "GIFT CARD",
    "COMING SOON",
];

/// Angelika Film Center: arthouse first-run house, JavaScript-rendered
/// schedule.
pub struct AngelikaAdapter;

#[async_trait]
impl SourceAdapter for AngelikaAdapter {
    fn name(&self) -> &'static str {
        "angelika"
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
    let block_sel = Selector::parse(
        "div[class*='movie'], div[class*='film'], article[class*='movie'], \
         article[class*='film'], li[class*='session'], div[class*='showing']",
    )
    .expect("valid selector");

    doc.select(&block_sel)
        .take(MAX_FILMS)
        .filter_map(|block| parse_film(block, today))
        .collect()
}

fn parse_film(block: ElementRef<'_>, today: NaiveDate) -> Option<Screening> {
    let title_sel =
        Selector::parse("h1, h2, h3, h4, h5, a[class*='title']").expect("valid selector");
    let date_sel =
        Selector::parse("time, [class*='date'], [class*='session'], [class*='showing']")
            .expect("valid selector");
    let desc_sel =
        Selector::parse("[class*='synopsis'], [class*='description'], [class*='overview']")
            .expect("valid selector");
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let title = text_of(block.select(&title_sel).next()?);
    if !looks_like_film_title(&title) {
        return None;
    }

    let mut screening = build_screening(&title, "Angelika Film Center", Tier::Curated, "angelika")?;

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
    screening = screening.with_note(extract_notes(&full_text));

    let href = block
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"));
    screening.url = resolve_url(href, BASE_URL, &screening.theater);

    Some(screening)
}

/// The site reuses card markup for concessions and section headers.
/// Menu words and short all-caps labels are not films.
fn looks_like_film_title(title: &str) -> bool {
    let upper = title.to_uppercase();
    if MENU_WORDS.iter().any(|w| upper.contains(w)) {
        return false;
    }
    !(title == upper && title.split_whitespace().count() <= 3)
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
          <div class="movie-card">
            <h3>Perfect Days</h3>
            <span class="session-date">Sep 12 7:30 PM</span>
            <p class="synopsis">Wim Wenders, with a director Q&amp;A in person.</p>
            <a href="/nyc/film/perfect-days">Tickets</a>
          </div>
          <div class="movie-card">
            <h3>ESPRESSO BAR</h3>
            <a href="/nyc/menu">Order</a>
          </div>
          <div class="movie-card">
            <h3>NOW PLAYING</h3>
          </div>
        </body></html>"#;

    #[test]
    fn parses_rendered_cards_and_skips_concessions() {
        let screenings = parse_listings(PAGE, today());
        assert_eq!(screenings.len(), 1);

        let s = &screenings[0];
        assert_eq!(s.title, "Perfect Days");
        assert_eq!(s.theater, "Angelika Film Center");
        assert_eq!(s.tier, Tier::Curated);
        assert!(s.venue_matched);
        let note = s.special_note.as_deref().unwrap();
        assert!(note.contains("Q&A"));
        assert_eq!(
            s.url.as_deref(),
            Some("https://www.angelikafilmcenter.com/nyc/film/perfect-days")
        );
    }

    #[test]
    fn all_caps_labels_are_not_films() {
        assert!(!looks_like_film_title("NOW PLAYING"));
        assert!(!looks_like_film_title("GIFT CARDS"));
        assert!(looks_like_film_title("Perfect Days"));
        assert!(looks_like_film_title("KILLERS OF THE FLOWER MOON"));
    }

    #[test]
    fn empty_page_yields_no_records() {
        assert!(parse_listings("<html></html>", today()).is_empty());
    }
}
