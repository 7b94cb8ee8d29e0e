use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use marquee_common::{extract_notes, parse_show_date, union_notes, Screening, Tier};

use crate::adapters::{build_screening, resolve_url, SourceAdapter};
use crate::fetch::{FetchMode, Fetcher};

const BASE_URL: &str = "https://filmforum.org";
const LISTINGS_URL: &str = "https://filmforum.org/now-showing";
const MAX_FILMS: usize = 30;

/// Film Forum: server-rendered HTML, entirely repertory programming.
pub struct FilmForumAdapter;

#[async_trait]
impl SourceAdapter for FilmForumAdapter {
    fn name(&self) -> &'static str {
        "film_forum"
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
        "div[class*='film'], article[class*='film'], div[class*='event'], article[class*='event']",
    )
    .expect("valid selector");

    doc.select(&block_sel)
        .take(MAX_FILMS)
        .filter_map(|block| parse_film(block, today))
        .collect()
}

fn parse_film(block: ElementRef<'_>, today: NaiveDate) -> Option<Screening> {
    let title_sel = Selector::parse("h1, h2, h3, h4").expect("valid selector");
    let date_sel =
        Selector::parse("time, [class*='date'], [class*='showtime']").expect("valid selector");
    let desc_sel = Selector::parse("[class*='description'], [class*='synopsis'], [class*='summary']")
        .expect("valid selector");
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let title = text_of(block.select(&title_sel).next()?);
    let mut screening = build_screening(&title, "Film Forum", Tier::Curated, "film_forum")?;

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

    // Everything here is repertory; the page text may add more signals.
    let full_text: String = block.text().collect();
    let note = union_notes(Some("Repertory"), Some(&extract_notes(&full_text)));
    screening.special_note = note;

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
