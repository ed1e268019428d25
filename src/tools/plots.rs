use futures::future::try_join_all;
use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use super::practice::HISTORY_WINDOW;
use super::{CpServer, check_range, image_result};
use crate::chart;
use crate::error::not_found;
use crate::stats;

const MAX_PLOTTED_HANDLES: usize = 10;
const MAX_PIE_LANGUAGES: usize = 8;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct HandleParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handle. Defaults to the configured handle")]
    pub handle: Option<String>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct RatingGraphParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handles to plot (1-10)")]
    pub handles: Option<Vec<String>>,

    #[serde(default)]
    #[schemars(description = "A single Codeforces handle (alternative to handles)")]
    pub handle: Option<String>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct DistributionParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handle. Defaults to the configured handle")]
    pub handle: Option<String>,

    #[serde(default)]
    #[schemars(description = "Width of each rating bar (100-400, default: 100)")]
    pub bin_size: Option<i32>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct TagParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handle. Defaults to the configured handle")]
    pub handle: Option<String>,

    #[serde(default)]
    #[schemars(description = "Number of top tags to show (1-30, default: 15)")]
    pub count: Option<usize>,
}

pub async fn rating_graph(server: &CpServer, params: RatingGraphParams) -> Result<CallToolResult, ErrorData> {
    let requested = match (params.handle, params.handles) {
        (Some(h), None) => Some(vec![h]),
        (Some(h), Some(hs)) if hs.is_empty() => Some(vec![h]),
        (_, hs) => hs,
    };
    let handles = check!(server.resolve_handles(requested, MAX_PLOTTED_HANDLES));

    let cf = &server.codeforces;
    let all_changes = upstream!(
        try_join_all(handles.iter().map(|h| cf.user_rating(h))).await,
        "plotting rating graph"
    );
    if all_changes.iter().all(Vec::is_empty) {
        return Ok(not_found(
            "No rating changes found for any of the specified users.",
        ));
    }

    let series: Vec<(String, Vec<_>)> = handles
        .iter()
        .zip(&all_changes)
        .map(|(h, changes)| {
            if changes.is_empty() {
                tracing::debug!(handle = %h, "no rating changes, skipping");
            }
            (h.clone(), stats::chronological(changes))
        })
        .collect();

    image_result(
        format!("Here is the rating graph for {}:", handles.join(", ")),
        chart::rating_history(&series),
    )
}

pub async fn performance(server: &CpServer, params: HandleParams) -> Result<CallToolResult, ErrorData> {
    let handle = check!(server.resolve_handle(params.handle.as_deref()));

    let changes = upstream!(
        server.codeforces.user_rating(&handle).await,
        "plotting performance graph"
    );
    if changes.is_empty() {
        return Ok(not_found(format!(
            "No rating changes found for {handle}. They might be unrated."
        )));
    }

    let ordered = stats::chronological(&changes);
    image_result(
        format!("Here is the performance graph for {handle}:"),
        chart::performance(&handle, &ordered),
    )
}

pub async fn rating_distribution(
    server: &CpServer,
    params: DistributionParams,
) -> Result<CallToolResult, ErrorData> {
    let bin_size = check!(check_range("bin_size", params.bin_size.unwrap_or(100), 100..=400));
    let handle = check!(server.resolve_handle(params.handle.as_deref()));

    let submissions = upstream!(
        server.codeforces.user_status(&handle, Some(HISTORY_WINDOW)).await,
        "plotting rating distribution"
    );

    let ratings = stats::solved_ratings(&submissions);
    if ratings.is_empty() {
        return Ok(not_found(format!("No rated problems solved by {handle}.")));
    }
    let bins = stats::rating_histogram(&ratings, bin_size);
    image_result(
        format!("Here's a histogram of solved problem ratings for {handle}:"),
        chart::rating_distribution(&handle, &bins, bin_size),
    )
}

pub async fn verdicts(server: &CpServer, params: HandleParams) -> Result<CallToolResult, ErrorData> {
    let handle = check!(server.resolve_handle(params.handle.as_deref()));

    let submissions = upstream!(
        server.codeforces.user_status(&handle, Some(HISTORY_WINDOW)).await,
        "plotting verdicts"
    );
    if submissions.is_empty() {
        return Ok(not_found(format!("No submissions found for {handle}.")));
    }

    let slices = stats::verdict_distribution(&submissions);
    image_result(
        format!("Here is the verdict distribution for {handle}:"),
        chart::pie(&format!("Submission Verdicts for {handle}"), &slices),
    )
}

pub async fn tags(server: &CpServer, params: TagParams) -> Result<CallToolResult, ErrorData> {
    let count = check!(check_range("count", params.count.unwrap_or(15), 1..=30));
    let handle = check!(server.resolve_handle(params.handle.as_deref()));

    let submissions = upstream!(
        server.codeforces.user_status(&handle, Some(HISTORY_WINDOW)).await,
        "plotting tag distribution"
    );

    let tags = stats::tag_distribution(&submissions, count);
    if tags.is_empty() {
        return Ok(not_found(format!("No tagged problems solved by {handle}.")));
    }
    image_result(
        format!("Here are the most solved tags for {handle}:"),
        chart::horizontal_bars(&format!("Top {} Tags for {handle}", tags.len()), "Problems Solved", &tags),
    )
}

pub async fn languages(server: &CpServer, params: HandleParams) -> Result<CallToolResult, ErrorData> {
    let handle = check!(server.resolve_handle(params.handle.as_deref()));

    let submissions = upstream!(
        server.codeforces.user_status(&handle, Some(HISTORY_WINDOW)).await,
        "plotting language distribution"
    );
    if submissions.is_empty() {
        return Ok(not_found(format!("No submissions found for {handle}.")));
    }

    let slices = stats::language_distribution(&submissions, MAX_PIE_LANGUAGES);
    image_result(
        format!("Here is the language distribution for {handle}:"),
        chart::pie(&format!("Languages Used by {handle}"), &slices),
    )
}
