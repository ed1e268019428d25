use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use super::{CpServer, check_range, text_result};
use crate::convert::format_contests;
use crate::models::Contest;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct UpcomingParams {
    #[serde(default)]
    #[schemars(description = "Maximum contests to list (1-30, default: 10)")]
    pub count: Option<usize>,
}

/// Contests that have not started yet, soonest first.
fn upcoming_only(contests: &[Contest], count: usize) -> Vec<&Contest> {
    let mut upcoming: Vec<&Contest> = contests.iter().filter(|c| c.phase == "BEFORE").collect();
    upcoming.sort_by_key(|c| c.start_time_seconds.unwrap_or(i64::MAX));
    upcoming.truncate(count);
    upcoming
}

pub async fn upcoming(server: &CpServer, params: UpcomingParams) -> Result<CallToolResult, ErrorData> {
    let count = check!(check_range("count", params.count.unwrap_or(10), 1..=30));

    let contests = upstream!(
        server.codeforces.contest_list().await,
        "fetching contests"
    );

    let upcoming = upcoming_only(&contests, count);
    if upcoming.is_empty() {
        return Ok(text_result("No upcoming Codeforces contests are scheduled.".into()));
    }
    let now = chrono::Utc::now().timestamp();
    Ok(text_result(format_contests(&upcoming, now)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contest(id: i64, phase: &str, start: Option<i64>) -> Contest {
        Contest {
            id,
            name: format!("Round {id}"),
            phase: phase.into(),
            start_time_seconds: start,
            duration_seconds: 7200,
        }
    }

    #[test]
    fn only_future_contests_soonest_first() {
        let contests = vec![
            contest(1, "FINISHED", Some(10)),
            contest(2, "BEFORE", Some(300)),
            contest(3, "BEFORE", None),
            contest(4, "CODING", Some(50)),
            contest(5, "BEFORE", Some(200)),
        ];
        let ids: Vec<i64> = upcoming_only(&contests, 10).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![5, 2, 3]);
        assert_eq!(upcoming_only(&contests, 1).len(), 1);
    }
}
