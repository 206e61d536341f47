//! Per-author cumulative beer counts, bucketed by UTC calendar day.
//!
//! Every author with at least one post gets one point per day from their
//! first post to their latest, carrying the running total across days
//! without posts. Authors are ranked by their final total.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::models::BeerWithAuthor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub user_name: String,
    #[serde(rename = "monthly_data")]
    pub series: Vec<BucketTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketTotal {
    /// Day formatted as `YYYY-MM-DD`.
    #[serde(rename = "month")]
    pub bucket: String,
    #[serde(rename = "total_drinks")]
    pub total: u64,
}

impl LeaderboardEntry {
    pub fn final_total(&self) -> u64 {
        self.series.last().map(|b| b.total).unwrap_or(0)
    }
}

struct AuthorTally {
    name: String,
    per_day: BTreeMap<NaiveDate, u64>,
}

pub fn build(posts: &[BeerWithAuthor]) -> Vec<LeaderboardEntry> {
    let mut authors: HashMap<&str, AuthorTally> = HashMap::new();

    for post in posts {
        let tally = authors.entry(post.user_id.as_str()).or_insert_with(|| AuthorTally {
            name: post.user_name.clone(),
            per_day: BTreeMap::new(),
        });
        *tally.per_day.entry(post.created_at.date_naive()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, LeaderboardEntry)> = authors
        .into_iter()
        .map(|(user_id, tally)| {
            let entry = LeaderboardEntry {
                user_name: tally.name,
                series: cumulative(&tally.per_day),
            };
            (user_id, entry)
        })
        .collect();

    ranked.sort_by(|(a_id, a), (b_id, b)| {
        b.final_total()
            .cmp(&a.final_total())
            .then_with(|| a.user_name.cmp(&b.user_name))
            .then_with(|| a_id.cmp(b_id))
    });

    ranked.into_iter().map(|(_, entry)| entry).collect()
}

/// Running totals for every day between the first and last key, inclusive.
fn cumulative(per_day: &BTreeMap<NaiveDate, u64>) -> Vec<BucketTotal> {
    let (Some((&first, _)), Some((&last, _))) = (per_day.first_key_value(), per_day.last_key_value())
    else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut total = 0;
    for day in first.iter_days().take_while(|d| *d <= last) {
        total += per_day.get(&day).copied().unwrap_or(0);
        series.push(BucketTotal {
            bucket: day.format("%Y-%m-%d").to_string(),
            total,
        });
    }
    series
}
