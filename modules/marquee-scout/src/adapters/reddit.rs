use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use marquee_common::{extract_notes, normalize_venue, parse_show_date, special_signal, Screening, Tier};

use crate::adapters::{build_screening, SourceAdapter};
use crate::fetch::{FetchMode, Fetcher};

// Public JSON listing, no API credentials needed.
const FEED_URL: &str = "https://www.reddit.com/r/NYCmovies/new.json?limit=50";
const MAX_POST_AGE_DAYS: i64 = 7;

/// Openers that mark discussion threads rather than announcements.
const QUESTION_OPENERS: &[&str] = &["what", "where", "how", "why", "does anyone", "is there"];

/// r/NYCmovies: community screening announcements via the subreddit's
/// public .json endpoint.
pub struct RedditAdapter;

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: Post,
}

#[derive(Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    #[serde(default)]
    stickied: bool,
    created_utc: f64,
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    fn name(&self) -> &'static str {
        "reddit"
    }

    async fn collect(&self, fetcher: &dyn Fetcher, today: NaiveDate) -> Vec<Screening> {
        let body = match fetcher.fetch(FEED_URL, FetchMode::Static, None).await {
            Ok(body) => body,
            Err(e) => {
                warn!(source = self.name(), error = %e, "Fetch failed, yielding no records");
                return Vec::new();
            }
        };

        let screenings = parse_feed(&body, today, Utc::now());
        info!(source = self.name(), count = screenings.len(), "Collected screenings");
        screenings
    }
}

fn parse_feed(body: &str, today: NaiveDate, now: DateTime<Utc>) -> Vec<Screening> {
    let listing: Listing = match serde_json::from_str(body) {
        Ok(listing) => listing,
        Err(e) => {
            warn!(source = "reddit", error = %e, "Unexpected feed shape, yielding no records");
            return Vec::new();
        }
    };

    listing
        .data
        .children
        .into_iter()
        .filter_map(|child| parse_post(child.data, today, now))
        .collect()
}

fn parse_post(post: Post, today: NaiveDate, now: DateTime<Utc>) -> Option<Screening> {
    let age_secs = now.timestamp() - post.created_utc as i64;
    if age_secs > MAX_POST_AGE_DAYS * 86_400 {
        return None;
    }

    let text = format!("{} {}", post.title, post.selftext);
    if !is_announcement(&text) {
        return None;
    }

    // Pinned posts are subreddit-official roundups; ordinary posts are
    // individual community tips.
    let tier = if post.stickied {
        Tier::Aggregator
    } else {
        Tier::Community
    };

    let theater = extract_theater(&text);
    let mut screening = build_screening(&post.title, &theater, tier, "reddit")?;

    if let Some(date) = parse_show_date(&text, today) {
        screening = screening.with_date(date);
    }
    screening = screening
        .with_note(extract_notes(&text))
        .with_description(truncate(&post.selftext, 300))
        .with_url(format!("https://reddit.com{}", post.permalink));

    Some(screening)
}

/// Announcement gate: recent, keyword-bearing, and not a question thread.
fn is_announcement(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    if QUESTION_OPENERS.iter().any(|q| lower.starts_with(q)) {
        return false;
    }
    special_signal(&lower) || lower.contains("screening") || lower.contains("tickets")
}

/// Posts rarely structure the venue; scan the text against the known
/// venue table and fall back to a pointer at the post itself.
fn extract_theater(text: &str) -> String {
    match normalize_venue(text) {
        Some(m) if m.matched => m.name,
        _ => "Check Post".to_string(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
