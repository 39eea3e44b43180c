//! Link analytics
//!
//! Computes the link dashboard payload from the event log: detection/click
//! partitioning, unique-link and per-conversation counts, click-through
//! rates, per-domain stats, a daily time series, and the most-clicked list.
//!
//! Events arrive in append order; daily bucketing groups by each event's own
//! `timestamp` field, never by array position. Events with an unparseable
//! timestamp still count toward totals but are left out of the daily series.

use crate::types::{
    ClickedLink, DailyBucket, DomainEntry, DomainStat, LinkEvent, LinkEventType, LinkStats,
};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::round2;

/// The daily series always covers at least this many trailing days.
const MIN_SERIES_DAYS: i64 = 7;

/// Default window for the daily series.
pub const DEFAULT_WINDOW_DAYS: usize = 30;

/// Default length of the most-clicked list.
pub const DEFAULT_TOP_CLICKED: usize = 10;

/// Partition events into (detections, clicks).
pub fn classify(events: &[LinkEvent]) -> (Vec<&LinkEvent>, Vec<&LinkEvent>) {
    let mut detections = Vec::new();
    let mut clicks = Vec::new();
    for event in events {
        match event.event_type {
            LinkEventType::LinkDetected => detections.push(event),
            LinkEventType::LinkClicked => clicks.push(event),
        }
    }
    (detections, clicks)
}

/// Number of distinct `link` values among detection events.
pub fn unique_link_count(detections: &[&LinkEvent]) -> u64 {
    detections
        .iter()
        .map(|e| e.link.as_str())
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Detection count per conversation id.
pub fn per_conversation_link_counts(detections: &[&LinkEvent]) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for event in detections {
        *counts.entry(event.conversation_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Mean of per-conversation detection counts, rounded to 2 decimals.
/// 0 when no conversation has detections.
pub fn links_per_conversation(counts: &HashMap<String, u64>) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    let total: u64 = counts.values().sum();
    round2(total as f64 / counts.len() as f64)
}

/// 100 * clicks / detections, rounded to 2 decimals; 0 when no detections.
pub fn click_through_rate(detections: u64, clicks: u64) -> f64 {
    if detections == 0 {
        return 0.0;
    }
    round2(100.0 * clicks as f64 / detections as f64)
}

/// URL host of a link, or the literal "unknown" when the link does not parse
/// or has no host component.
pub fn domain_of(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-domain detection/click counters with CTR, sorted descending by
/// combined detection+click volume. Ties keep first-encountered order.
pub fn domain_stats(detections: &[&LinkEvent], clicks: &[&LinkEvent]) -> Vec<DomainEntry> {
    // (stat, first-encountered index) per domain; detections are walked
    // before clicks, so click-only domains rank after detected ones at
    // equal volume.
    let mut domains: HashMap<String, (DomainStat, usize)> = HashMap::new();
    let mut next_index = 0usize;

    for event in detections {
        let entry = domains.entry(domain_of(&event.link)).or_insert_with(|| {
            let idx = next_index;
            next_index += 1;
            (DomainStat::default(), idx)
        });
        entry.0.detections += 1;
    }
    for event in clicks {
        let entry = domains.entry(domain_of(&event.link)).or_insert_with(|| {
            let idx = next_index;
            next_index += 1;
            (DomainStat::default(), idx)
        });
        entry.0.clicks += 1;
    }

    let mut entries: Vec<(String, DomainStat, usize)> = domains
        .into_iter()
        .map(|(domain, (mut stat, index))| {
            stat.ctr = click_through_rate(stat.detections, stat.clicks);
            (domain, stat, index)
        })
        .collect();

    entries.sort_by(|a, b| {
        let volume_a = a.1.detections + a.1.clicks;
        let volume_b = b.1.detections + b.1.clicks;
        volume_b.cmp(&volume_a).then(a.2.cmp(&b.2))
    });

    entries
        .into_iter()
        .map(|(domain, stat, _)| DomainEntry { domain, stat })
        .collect()
}

/// One bucket per calendar day over the observed range, zero-filling the
/// trailing seven days up to `today`, truncated to the most recent
/// `window_days` buckets in chronological order.
pub fn daily_series(events: &[LinkEvent], today: NaiveDate, window_days: usize) -> Vec<DailyBucket> {
    let mut days: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();

    // Trailing week is always present, even with no events at all.
    for offset in (0..MIN_SERIES_DAYS).rev() {
        days.entry(today - Duration::days(offset)).or_insert((0, 0));
    }

    for event in events {
        let day = match event.parsed_timestamp() {
            Some(ts) => ts.date(),
            None => continue,
        };
        let bucket = days.entry(day).or_insert((0, 0));
        match event.event_type {
            LinkEventType::LinkDetected => bucket.0 += 1,
            LinkEventType::LinkClicked => bucket.1 += 1,
        }
    }

    let skip = days.len().saturating_sub(window_days);
    days.into_iter()
        .skip(skip)
        .map(|(day, (detections, clicks))| DailyBucket {
            day: day.format("%Y-%m-%d").to_string(),
            detections,
            clicks,
            ctr: click_through_rate(detections, clicks),
        })
        .collect()
}

/// Top-N most clicked links, descending by click count, ties by
/// first-encountered order.
pub fn most_clicked(clicks: &[&LinkEvent], top_n: usize) -> Vec<ClickedLink> {
    let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
    let mut next_index = 0usize;

    for event in clicks {
        let entry = counts.entry(event.link.as_str()).or_insert_with(|| {
            let idx = next_index;
            next_index += 1;
            (0, idx)
        });
        entry.0 += 1;
    }

    let mut ranked: Vec<(&str, (u64, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(link, (clicks, _))| ClickedLink {
            link: link.to_string(),
            clicks,
        })
        .collect()
}

impl LinkStats {
    /// Compute the full dashboard payload from the event log.
    ///
    /// `today` anchors the zero-filled trailing week of the daily series and
    /// is injected so tests stay deterministic.
    pub fn compute(events: &[LinkEvent], today: NaiveDate) -> LinkStats {
        let (detections, clicks) = classify(events);

        let per_conversation = per_conversation_link_counts(&detections);

        LinkStats {
            total_links: detections.len() as u64,
            total_unique_links: unique_link_count(&detections),
            total_clicks: clicks.len() as u64,
            click_through_rate: click_through_rate(detections.len() as u64, clicks.len() as u64),
            links_per_conversation: links_per_conversation(&per_conversation),
            most_clicked_links: most_clicked(&clicks, DEFAULT_TOP_CLICKED),
            daily_link_counts: daily_series(events, today, DEFAULT_WINDOW_DAYS),
            links_by_domain: domain_stats(&detections, &clicks),
        }
    }
}
