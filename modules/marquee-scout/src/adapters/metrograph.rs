use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use marquee_common::{extract_notes, parse_show_date, Screening, Tier};

use crate::adapters::{build_screening, resolve_url, SourceAdapter};
use crate::fetch::{FetchMode, Fetcher};

const BASE_URL: &str = "https://metrograph.com";
const LISTINGS_URL: &str = "https://metrograph.com/film";
const MAX_FILMS: usize = 30;

/// Metrograph: server-rendered film cards, tightly curated program.
pub struct MetrographAdapter;

#[async_trait]
impl SourceAdapter for MetrographAdapter {
    fn name(&self) -> &'static str {
        "metrograph"
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
        "div[class*='film'], article[class*='film'], li[class*='film'], \
         div[class*='card'], li[class*='item']",
    )
    .expect("valid selector");

    doc.select(&block_sel)
        .take(MAX_FILMS)
        .filter_map(|block| parse_film(block, today))
        .collect()
}

fn parse_film(block: ElementRef<'_>, today: NaiveDate) -> Option<Screening> {
    let title_sel = Selector::parse("h1, h2, h3, h4, a[class*='title']").expect("valid selector");
    let date_sel = Selector::parse("time, [class*='date'], [class*='schedule']").expect("valid selector");
    let desc_sel =
        Selector::parse("[class*='description'], [class*='synopsis'], [class*='excerpt']")
            .expect("valid selector");
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let title = text_of(block.select(&title_sel).next()?);
    let mut screening = build_screening(&title, "Metrograph", Tier::Curated, "metrograph")?;

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
    let notes = extract_notes(&full_text);
    screening = screening.with_note(notes);

    if let Some(ticket_info) = ticket_status(&full_text) {
        screening.ticket_info = Some(ticket_info.to_string());
    }

    let href = block
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"));
    screening.url = resolve_url(href, BASE_URL, &screening.theater);

    Some(screening)
}

/// Sale-status phrases the listings surface near each card.
fn ticket_status(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if lower.contains("sold out") {
        Some("Sold out")
    } else if lower.contains("on sale") || lower.contains("tickets available") {
        Some("Tickets on sale")
    } else {
        None
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
