use std::collections::HashMap;

use rand::seq::SliceRandom;
use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use super::{CpServer, check_range, text_result};
use crate::convert::{format_histogram, format_recent_solves, format_recommendations, format_upsolve};
use crate::error::bad_request;
use crate::models::ProblemId;
use crate::stats;

/// Submissions scanned for recent solves.
const RECENT_WINDOW: u32 = 100;
/// Submissions scanned for rating breakdowns.
pub(super) const HISTORY_WINDOW: u32 = 5000;
const RATING_BOUNDS: std::ops::RangeInclusive<i32> = 0..=5000;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct RecommendParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handle to find unsolved problems for. Defaults to the configured handle")]
    pub handle: Option<String>,

    #[serde(default)]
    #[schemars(description = "Minimum problem rating (0-5000)")]
    pub min_rating: Option<i32>,

    #[serde(default)]
    #[schemars(description = "Maximum problem rating (0-5000)")]
    pub max_rating: Option<i32>,

    #[serde(default)]
    #[schemars(description = "Number of problems to recommend (1-20, default: 5)")]
    pub count: Option<usize>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct SolvedParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handle. Defaults to the configured handle")]
    pub handle: Option<String>,

    #[serde(default)]
    #[schemars(description = "Number of problems to show (1-50, default: 10)")]
    pub count: Option<usize>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct HistogramParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handle. Defaults to the configured handle")]
    pub handle: Option<String>,

    #[serde(default)]
    #[schemars(description = "Size of each rating bin (100-400, default: 100)")]
    pub bin_size: Option<i32>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct UpsolveParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handle. Defaults to the configured handle")]
    pub handle: Option<String>,

    #[serde(default)]
    #[schemars(description = "Number of contests to show (1-20, default: 5)")]
    pub count: Option<usize>,
}

pub async fn recommend(server: &CpServer, params: RecommendParams) -> Result<CallToolResult, ErrorData> {
    let count = check!(check_range("count", params.count.unwrap_or(5), 1..=20));
    if let Some(min) = params.min_rating {
        check!(check_range("min_rating", min, RATING_BOUNDS));
    }
    if let Some(max) = params.max_rating {
        check!(check_range("max_rating", max, RATING_BOUNDS));
    }
    let handle = check!(server.resolve_handle(params.handle.as_deref()));
    let cf = &server.codeforces;

    let users = upstream!(
        cf.user_info(std::slice::from_ref(&handle)).await,
        "generating recommendations"
    );
    let Some(user) = users.first() else {
        return Ok(text_result(format!("Could not find user '{handle}'.")));
    };

    let (lo, hi) = match stats::recommendation_window(user.rating, params.min_rating, params.max_rating) {
        Ok(window) => window,
        Err(w) => {
            return Ok(bad_request(format!(
                "min_rating ({}) must not exceed max_rating ({})",
                w.min, w.max
            )));
        }
    };

    let (submissions, problemset) = upstream!(
        tokio::try_join!(cf.user_status(&handle, None), cf.problemset()),
        "generating recommendations"
    );

    let solved = stats::solved_problem_ids(&submissions);
    let mut candidates = stats::unsolved_in_window(&problemset.problems, &solved, lo, hi);
    if candidates.is_empty() {
        return Ok(text_result(format!(
            "Couldn't find any unsolved problems for {handle} in rating range {lo}-{hi}."
        )));
    }

    candidates.shuffle(&mut rand::rng());
    candidates.truncate(count);

    let solved_counts: HashMap<ProblemId, u64> = problemset
        .problem_statistics
        .iter()
        .map(|s| {
            let id = ProblemId {
                contest_id: s.contest_id,
                index: s.index.clone(),
            };
            (id, s.solved_count)
        })
        .collect();
    let picks: Vec<_> = candidates
        .into_iter()
        .map(|p| (p, solved_counts.get(&p.id()).copied()))
        .collect();

    Ok(text_result(format_recommendations(&handle, lo, hi, &picks)))
}

pub async fn solved(server: &CpServer, params: SolvedParams) -> Result<CallToolResult, ErrorData> {
    let count = check!(check_range("count", params.count.unwrap_or(10), 1..=50));
    let handle = check!(server.resolve_handle(params.handle.as_deref()));

    let submissions = upstream!(
        server.codeforces.user_status(&handle, Some(RECENT_WINDOW)).await,
        "fetching solved problems"
    );

    let mut recent = stats::recent_unique_solves(&submissions);
    if recent.is_empty() {
        return Ok(text_result(format!(
            "No recent accepted submissions found for {handle}."
        )));
    }
    recent.truncate(count);
    Ok(text_result(format_recent_solves(&handle, &recent)))
}

pub async fn histogram(server: &CpServer, params: HistogramParams) -> Result<CallToolResult, ErrorData> {
    let bin_size = check!(check_range("bin_size", params.bin_size.unwrap_or(100), 100..=400));
    let handle = check!(server.resolve_handle(params.handle.as_deref()));

    let submissions = upstream!(
        server.codeforces.user_status(&handle, Some(HISTORY_WINDOW)).await,
        "generating histogram"
    );

    let ratings = stats::solved_ratings(&submissions);
    if ratings.is_empty() {
        return Ok(text_result(format!("No rated problems solved by {handle}.")));
    }
    let bins = stats::rating_histogram(&ratings, bin_size);
    Ok(text_result(format_histogram(&handle, &bins, bin_size)))
}

pub async fn upsolve(server: &CpServer, params: UpsolveParams) -> Result<CallToolResult, ErrorData> {
    let count = check!(check_range("count", params.count.unwrap_or(5), 1..=20));
    let handle = check!(server.resolve_handle(params.handle.as_deref()));
    let cf = &server.codeforces;

    let (changes, submissions, problemset) = upstream!(
        tokio::try_join!(
            cf.user_rating(&handle),
            cf.user_status(&handle, None),
            cf.problemset()
        ),
        "finding upsolve targets"
    );
    if changes.is_empty() {
        return Ok(text_result(format!(
            "{handle} has not taken part in any rated contest yet."
        )));
    }

    let mut targets = stats::upsolve_targets(&changes, &submissions, &problemset);
    if targets.is_empty() {
        return Ok(text_result(format!(
            "{handle} has fully solved every rated contest they took part in."
        )));
    }
    targets.truncate(count);
    Ok(text_result(format_upsolve(&handle, &targets)))
}
