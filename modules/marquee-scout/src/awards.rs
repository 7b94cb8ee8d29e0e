use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::warn;

use marquee_common::normalize_title;

/// Cache refresh horizon. The cache file is rebuilt weekly by an external
/// job; past this age we keep serving it but flag it stale.
const MAX_CACHE_AGE_DAYS: i64 = 7;

/// Festival and awards context for one film.
#[derive(Debug, Clone, Default)]
pub struct AwardsContext {
    pub festivals: Vec<String>,
    pub awards: Vec<String>,
    pub oscar_contender: bool,
}

impl AwardsContext {
    /// One line suitable for appending to a screening's description.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.festivals.is_empty() {
            parts.push(self.festivals.join(", "));
        }
        if !self.awards.is_empty() {
            parts.push(self.awards.join(", "));
        }
        if self.oscar_contender {
            parts.push("Oscar contender".to_string());
        }
        format!("Awards watch: {}", parts.join("; "))
    }
}

/// Read side of the awards metadata collaborator. Keyed by normalized
/// title; absence is the common case, not an error.
pub trait AwardsLookup: Send + Sync {
    fn lookup(&self, title: &str) -> Option<AwardsContext>;
}

/// Used when no cache file is configured.
pub struct NoopAwards;

impl AwardsLookup for NoopAwards {
    fn lookup(&self, _title: &str) -> Option<AwardsContext> {
        None
    }
}

#[derive(Deserialize)]
struct CacheFile {
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    festival_films: HashMap<String, FilmEntry>,
    #[serde(default)]
    oscar_contenders: Vec<String>,
}

#[derive(Deserialize, Default)]
struct FilmEntry {
    #[serde(default)]
    festivals: Vec<String>,
    #[serde(default)]
    awards: Vec<String>,
}

/// File-backed awards cache as written by the weekly updater job.
pub struct CachedAwards {
    films: HashMap<String, AwardsContext>,
}

impl CachedAwards {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read awards cache {}", path.display()))?;
        let cache = Self::from_json(&raw)?;
        Ok(cache)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CacheFile = serde_json::from_str(raw).context("Malformed awards cache")?;

        if is_stale(file.last_updated, Utc::now()) {
            warn!(
                max_age_days = MAX_CACHE_AGE_DAYS,
                "Awards cache is stale, serving anyway"
            );
        }

        let mut films: HashMap<String, AwardsContext> = HashMap::new();
        for (title, entry) in file.festival_films {
            films.insert(
                normalize_title(&title),
                AwardsContext {
                    festivals: entry.festivals,
                    awards: entry.awards,
                    oscar_contender: false,
                },
            );
        }
        for title in file.oscar_contenders {
            films
                .entry(normalize_title(&title))
                .or_default()
                .oscar_contender = true;
        }

        Ok(Self { films })
    }
}

impl AwardsLookup for CachedAwards {
    fn lookup(&self, title: &str) -> Option<AwardsContext> {
        self.films.get(&normalize_title(title)).cloned()
    }
}

fn is_stale(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_updated {
        Some(updated) => now - updated >= Duration::days(MAX_CACHE_AGE_DAYS),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CACHE: &str = r#"{
        "last_updated": "2026-08-24T06:00:00Z",
        "festival_films": {
            "Anatomy of a Fall": {
                "festivals": ["Cannes 2023"],
                "awards": ["Palme d'Or"]
            }
        },
        "oscar_contenders": ["Anatomy of a Fall", "The Zone of Interest"]
    }"#;

    #[test]
    fn lookup_is_keyed_by_normalized_title() {
        let cache = CachedAwards::from_json(CACHE).unwrap();
        let ctx = cache.lookup("ANATOMY OF A FALL!").unwrap();
        assert_eq!(ctx.festivals, vec!["Cannes 2023"]);
        assert!(ctx.oscar_contender);
        assert!(cache.lookup("Oppenheimer").is_none());
    }

    #[test]
    fn contender_without_festival_entry_still_resolves() {
        let cache = CachedAwards::from_json(CACHE).unwrap();
        let ctx = cache.lookup("The Zone of Interest").unwrap();
        assert!(ctx.oscar_contender);
        assert!(ctx.festivals.is_empty());
    }

    #[test]
    fn staleness_follows_weekly_horizon() {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 0, 0, 0).unwrap();
        let fresh = Utc.with_ymd_and_hms(2026, 8, 22, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2026, 8, 12, 0, 0, 0).unwrap();
        assert!(!is_stale(Some(fresh), now));
        assert!(is_stale(Some(old), now));
        assert!(is_stale(None, now));
    }

    #[test]
    fn summary_reads_as_one_line() {
        let cache = CachedAwards::from_json(CACHE).unwrap();
        let line = cache.lookup("Anatomy of a Fall").unwrap().summary();
        assert_eq!(line, "Awards watch: Cannes 2023; Palme d'Or; Oscar contender");
    }

    #[test]
    fn malformed_cache_is_an_error() {
        assert!(CachedAwards::from_json("not json").is_err());
    }
}
