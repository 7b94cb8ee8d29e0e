use std::path::Path;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use marquee_common::{Config, Screening};

use crate::adapters::{self, SourceAdapter};
use crate::aggregator;
use crate::awards::{AwardsLookup, CachedAwards, NoopAwards};
use crate::fetch::{Fetcher, PageFetcher};

/// Adapters dispatched concurrently. Rendered fetches are separately
/// bounded by the fetch layer's semaphore.
const CONCURRENT_ADAPTERS: usize = 4;

/// Stats from one collection run.
#[derive(Debug, Default)]
pub struct ScoutStats {
    pub by_source: Vec<(String, usize)>,
    pub collected: usize,
    pub dropped_invalid: usize,
    pub duplicates_merged: usize,
    pub filtered_out: usize,
    pub published: usize,
}

impl std::fmt::Display for ScoutStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Marquee Run Complete ===")?;
        for (source, count) in &self.by_source {
            writeln!(f, "  {source}: {count}")?;
        }
        writeln!(f, "Collected:       {}", self.collected)?;
        writeln!(f, "Dropped invalid: {}", self.dropped_invalid)?;
        writeln!(f, "Merged dupes:    {}", self.duplicates_merged)?;
        writeln!(f, "Filtered out:    {}", self.filtered_out)?;
        writeln!(f, "Published:       {}", self.published)?;
        Ok(())
    }
}

pub struct ScoutReport {
    pub screenings: Vec<Screening>,
    pub stats: ScoutStats,
}

/// Runs the whole pipeline: every adapter, best-effort, then one
/// aggregation pass. Never fails for upstream conditions; an empty list
/// is a valid, reportable outcome.
pub struct Scout {
    fetcher: Arc<dyn Fetcher>,
    awards: Box<dyn AwardsLookup>,
}

impl Scout {
    pub fn new(config: &Config) -> Self {
        let fetcher = PageFetcher::new(
            &config.browserless_url,
            config.browserless_token.as_deref(),
        );

        let awards: Box<dyn AwardsLookup> = match &config.awards_cache_path {
            Some(path) => match CachedAwards::load(Path::new(path)) {
                Ok(cache) => Box::new(cache),
                Err(e) => {
                    warn!(path = %path, error = %e, "Awards cache unavailable, continuing without");
                    Box::new(NoopAwards)
                }
            },
            None => Box::new(NoopAwards),
        };

        Self {
            fetcher: Arc::new(fetcher),
            awards,
        }
    }

    /// Injection point for tests: canned fetcher, canned awards.
    pub fn with_parts(fetcher: Arc<dyn Fetcher>, awards: Box<dyn AwardsLookup>) -> Self {
        Self { fetcher, awards }
    }

    pub async fn run(&self) -> ScoutReport {
        self.run_for(Local::now().date_naive()).await
    }

    /// Run with an explicit "today", which anchors year-less and
    /// weekday-only date parsing.
    pub async fn run_for(&self, today: NaiveDate) -> ScoutReport {
        let adapters = adapters::all_adapters();
        info!(sources = adapters.len(), %today, "Starting collection");

        let results: Vec<(String, Vec<Screening>)> =
            stream::iter(adapters.into_iter().map(|adapter| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let name = adapter.name().to_string();
                    let records = collect_one(adapter.as_ref(), fetcher.as_ref(), today).await;
                    (name, records)
                }
            }))
            .buffer_unordered(CONCURRENT_ADAPTERS)
            .collect()
            .await;

        let mut stats = ScoutStats::default();
        let mut all_records = Vec::new();
        let mut by_source: Vec<(String, usize)> = results
            .into_iter()
            .map(|(name, records)| {
                let count = records.len();
                all_records.extend(records);
                (name, count)
            })
            .collect();
        by_source.sort();

        stats.by_source = by_source;
        stats.collected = all_records.len();

        let (screenings, agg) = aggregator::aggregate(all_records, self.awards.as_ref());
        stats.dropped_invalid = agg.dropped_invalid;
        stats.duplicates_merged = agg.duplicates_merged;
        stats.filtered_out = agg.filtered_out;
        stats.published = screenings.len();

        ScoutReport { screenings, stats }
    }
}

async fn collect_one(
    adapter: &dyn SourceAdapter,
    fetcher: &dyn Fetcher,
    today: NaiveDate,
) -> Vec<Screening> {
    let records = adapter.collect(fetcher, today).await;
    if records.is_empty() {
        warn!(source = adapter.name(), "Source produced no records this run");
    }
    records
}
