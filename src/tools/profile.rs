use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use super::{CpServer, check_range, text_result};
use crate::convert::{format_rating_changes, format_user_stats};

const MAX_HANDLES: usize = 20;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct UserStatsParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handles to look up (1-20). Defaults to the configured handle")]
    pub handles: Option<Vec<String>>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct RatingChangesParams {
    #[serde(default)]
    #[schemars(description = "Codeforces handle. Defaults to the configured handle")]
    pub handle: Option<String>,

    #[serde(default)]
    #[schemars(description = "Number of recent contests to show (1-50, default: 5)")]
    pub count: Option<usize>,
}

pub async fn user_stats(server: &CpServer, params: UserStatsParams) -> Result<CallToolResult, ErrorData> {
    let handles = check!(server.resolve_handles(params.handles, MAX_HANDLES));

    let users = upstream!(
        server.codeforces.user_info(&handles).await,
        "fetching user stats"
    );
    if users.is_empty() {
        return Ok(text_result(format!(
            "Could not find user(s): {}",
            handles.join(", ")
        )));
    }

    Ok(text_result(format_user_stats(&users, handles.len() > 1)))
}

pub async fn rating_changes(
    server: &CpServer,
    params: RatingChangesParams,
) -> Result<CallToolResult, ErrorData> {
    let count = check!(check_range("count", params.count.unwrap_or(5), 1..=50));
    let handle = check!(server.resolve_handle(params.handle.as_deref()));

    let changes = upstream!(
        server.codeforces.user_rating(&handle).await,
        "fetching rating changes"
    );
    if changes.is_empty() {
        return Ok(text_result(format!(
            "No rating changes found for {handle}. They might be unrated."
        )));
    }

    let mut recent: Vec<_> = changes.iter().collect();
    recent.sort_by_key(|c| std::cmp::Reverse(c.rating_update_time_seconds));
    recent.truncate(count);
    Ok(text_result(format_rating_changes(&handle, &recent)))
}
