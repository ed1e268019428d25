use rmcp::model::{CallToolResult, Content};

use super::Settings;
use crate::error::not_found;

const ABOUT: &str = "\
# Competitive Programming Assistant

Stats, practice suggestions and charts for Codeforces, plus the LeetCode daily challenge.

## Profile & Stats
- `get_codeforces_user_stats`: rating, max rating, rank and registration date; several handles form a leaderboard
- `get_rating_changes`: recent contests with rank and rating delta
- `get_solved_problems`: most recent accepted problems

## Practice
- `recommend_problems`: unsolved problems around your rating, or in a range you choose
- `get_solved_rating_histogram`: solved problems per rating bin
- `get_upsolve_targets`: contests you took part in but have not fully solved
- `get_leetcode_daily_problem`: today's LeetCode Daily Coding Challenge

## Contests
- `get_upcoming_contests`: scheduled Codeforces rounds with start time and duration

## Charts
- `plot_rating_graph`: rating history of one or more users
- `plot_performance_graph`: rating history with per-contest deltas
- `plot_solved_rating_distribution`: histogram of solved problem ratings
- `plot_verdict_distribution`: pie chart of submission verdicts
- `plot_tag_distribution`: most solved problem tags
- `plot_language_distribution`: programming languages used

## Quick start
- \"Show my Codeforces stats\"
- \"Compare tourist with Benq\"
- \"Recommend problems for my level\"
- \"What's today's LeetCode daily?\"
- \"Plot my rating graph\"

Tools that take a handle use the configured default handle when none is given.";

pub fn about() -> CallToolResult {
    CallToolResult::success(vec![Content::text(ABOUT)])
}

pub fn validate(settings: &Settings) -> CallToolResult {
    match settings.owner_number.as_deref() {
        Some(number) => CallToolResult::success(vec![Content::text(number)]),
        None => not_found("No owner number is configured (set MY_NUMBER)."),
    }
}
