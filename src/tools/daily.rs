use rmcp::model::{CallToolResult, ErrorData};

use super::text_result;
use crate::client::LeetCodeClient;
use crate::convert::format_daily;
use crate::error::not_found;

pub async fn run(client: &LeetCodeClient) -> Result<CallToolResult, ErrorData> {
    let daily = upstream!(
        client.daily_question().await,
        "fetching LeetCode daily problem"
    );

    match daily {
        Some(daily) => Ok(text_result(format_daily(&daily, client.base_url()))),
        None => Ok(not_found("LeetCode returned no daily problem.")),
    }
}
