/// Unwraps an upstream API result, returning the tool response on failure.
macro_rules! upstream {
    ($call:expr, $context:expr) => {
        match $call {
            Ok(v) => v,
            Err(e) => return e.into_tool_result($context),
        }
    };
}

/// Unwraps an argument check, returning the tool error on failure.
macro_rules! check {
    ($res:expr) => {
        match $res {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        }
    };
}

mod about;
mod contests;
mod daily;
mod plots;
mod practice;
mod profile;

use std::ops::RangeInclusive;
use std::sync::Arc;

use base64::Engine;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ServerHandler, tool, tool_handler, tool_router};

use crate::chart::{self, ChartError};
use crate::client::{CodeforcesClient, LeetCodeClient};
use crate::convert::truncate_output;
use crate::error::{bad_request, protocol_error};

const MAX_HANDLE_LEN: usize = 24;

/// Read-only settings shared by every tool.
pub struct Settings {
    pub default_handle: Option<String>,
    pub owner_number: Option<String>,
}

#[derive(Clone)]
pub struct CpServer {
    codeforces: CodeforcesClient,
    leetcode: LeetCodeClient,
    settings: Arc<Settings>,
    tool_router: ToolRouter<Self>,
}

fn is_valid_handle(handle: &str) -> bool {
    (1..=MAX_HANDLE_LEN).contains(&handle.chars().count())
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn validate_handle(handle: &str) -> Result<String, CallToolResult> {
    let handle = handle.trim();
    if !is_valid_handle(handle) {
        return Err(bad_request(format!(
            "invalid handle '{handle}': expected 1-{MAX_HANDLE_LEN} letters, digits, '_', '.' or '-'"
        )));
    }
    Ok(handle.to_owned())
}

fn check_range<T>(name: &str, value: T, range: RangeInclusive<T>) -> Result<T, CallToolResult>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if !range.contains(&value) {
        return Err(bad_request(format!(
            "{name} must be between {} and {}",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

fn text_result(md: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(truncate_output(md))])
}

fn image_result(caption: String, rendered: Result<String, ChartError>) -> Result<CallToolResult, ErrorData> {
    let svg = rendered.map_err(|e| protocol_error(e.to_string()))?;
    let data = base64::engine::general_purpose::STANDARD.encode(svg.as_bytes());
    Ok(CallToolResult::success(vec![
        Content::text(caption),
        Content::image(data, chart::MIME_TYPE),
    ]))
}

impl CpServer {
    /// Picks the explicit handle, falling back to the configured default.
    fn resolve_handle(&self, handle: Option<&str>) -> Result<String, CallToolResult> {
        let explicit = handle.map(str::trim).filter(|h| !h.is_empty());
        match explicit.or(self.settings.default_handle.as_deref()) {
            Some(h) => validate_handle(h),
            None => Err(bad_request(
                "Please specify a handle or set DEFAULT_HANDLE.",
            )),
        }
    }

    /// Resolves a list of handles; an empty list means the default handle.
    fn resolve_handles(&self, handles: Option<Vec<String>>, max: usize) -> Result<Vec<String>, CallToolResult> {
        let explicit: Vec<String> = handles
            .unwrap_or_default()
            .into_iter()
            .filter(|h| !h.trim().is_empty())
            .collect();
        if explicit.is_empty() {
            return match self.settings.default_handle.as_deref() {
                Some(h) => Ok(vec![validate_handle(h)?]),
                None => Err(bad_request(
                    "No handles provided, and no default handle is configured.",
                )),
            };
        }
        if explicit.len() > max {
            return Err(bad_request(format!("at most {max} handles are supported")));
        }
        explicit.iter().map(|h| validate_handle(h)).collect()
    }
}

#[tool_router]
impl CpServer {
    pub fn new(codeforces: CodeforcesClient, leetcode: LeetCodeClient, settings: Settings) -> Self {
        Self {
            codeforces,
            leetcode,
            settings: Arc::new(settings),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Fetch Codeforces profile stats (rating, max rating, rank, registration date, profile link) for one or more users. Several handles are shown as a leaderboard sorted by rating. Uses the configured default handle when none is given."
    )]
    async fn get_codeforces_user_stats(
        &self,
        params: Parameters<profile::UserStatsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        profile::user_stats(self, params.0).await
    }

    #[tool(
        description = "Recommend unsolved Codeforces problems in a rating window. Without bounds the window is [rating, rating+199] based on the user's current rating."
    )]
    async fn recommend_problems(
        &self,
        params: Parameters<practice::RecommendParams>,
    ) -> Result<CallToolResult, ErrorData> {
        practice::recommend(self, params.0).await
    }

    #[tool(
        description = "List the most recently solved (accepted) Codeforces problems of a user, one entry per problem, newest first."
    )]
    async fn get_solved_problems(
        &self,
        params: Parameters<practice::SolvedParams>,
    ) -> Result<CallToolResult, ErrorData> {
        practice::solved(self, params.0).await
    }

    #[tool(
        description = "Show recent Codeforces rating changes: contest, rank, old and new rating, and delta."
    )]
    async fn get_rating_changes(
        &self,
        params: Parameters<profile::RatingChangesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        profile::rating_changes(self, params.0).await
    }

    #[tool(
        description = "Text histogram of solved Codeforces problems grouped into rating bins, showing strengths and gaps."
    )]
    async fn get_solved_rating_histogram(
        &self,
        params: Parameters<practice::HistogramParams>,
    ) -> Result<CallToolResult, ErrorData> {
        practice::histogram(self, params.0).await
    }

    #[tool(
        description = "Find rated Codeforces contests the user took part in but has not fully solved, closest to a full solve first."
    )]
    async fn get_upsolve_targets(
        &self,
        params: Parameters<practice::UpsolveParams>,
    ) -> Result<CallToolResult, ErrorData> {
        practice::upsolve(self, params.0).await
    }

    #[tool(description = "List upcoming Codeforces contests with start time and duration")]
    async fn get_upcoming_contests(
        &self,
        params: Parameters<contests::UpcomingParams>,
    ) -> Result<CallToolResult, ErrorData> {
        contests::upcoming(self, params.0).await
    }

    #[tool(description = "Plot the Codeforces rating history of one or more users")]
    async fn plot_rating_graph(
        &self,
        params: Parameters<plots::RatingGraphParams>,
    ) -> Result<CallToolResult, ErrorData> {
        plots::rating_graph(self, params.0).await
    }

    #[tool(
        description = "Plot a user's Codeforces rating history together with the rating change of each contest"
    )]
    async fn plot_performance_graph(
        &self,
        params: Parameters<plots::HandleParams>,
    ) -> Result<CallToolResult, ErrorData> {
        plots::performance(self, params.0).await
    }

    #[tool(description = "Plot a histogram of the ratings of a user's solved Codeforces problems")]
    async fn plot_solved_rating_distribution(
        &self,
        params: Parameters<plots::DistributionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        plots::rating_distribution(self, params.0).await
    }

    #[tool(description = "Plot a pie chart of a user's Codeforces submission verdicts")]
    async fn plot_verdict_distribution(
        &self,
        params: Parameters<plots::HandleParams>,
    ) -> Result<CallToolResult, ErrorData> {
        plots::verdicts(self, params.0).await
    }

    #[tool(description = "Plot a bar chart of the tags of a user's solved Codeforces problems")]
    async fn plot_tag_distribution(
        &self,
        params: Parameters<plots::TagParams>,
    ) -> Result<CallToolResult, ErrorData> {
        plots::tags(self, params.0).await
    }

    #[tool(description = "Plot a pie chart of the programming languages a user submits with on Codeforces")]
    async fn plot_language_distribution(
        &self,
        params: Parameters<plots::HandleParams>,
    ) -> Result<CallToolResult, ErrorData> {
        plots::languages(self, params.0).await
    }

    #[tool(description = "Get today's LeetCode Daily Coding Challenge problem")]
    async fn get_leetcode_daily_problem(&self) -> Result<CallToolResult, ErrorData> {
        daily::run(&self.leetcode).await
    }

    #[tool(description = "Describe this assistant, its tools and supported platforms")]
    async fn about(&self) -> Result<CallToolResult, ErrorData> {
        Ok(about::about())
    }

    #[tool(description = "Return the owner number configured for this server")]
    async fn validate(&self) -> Result<CallToolResult, ErrorData> {
        Ok(about::validate(&self.settings))
    }
}

#[tool_handler]
impl ServerHandler for CpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: Some(false) }),
                ..Default::default()
            },
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Competitive programming assistant for Codeforces and LeetCode: profile stats, \
                 rating history, problem recommendations, upsolve targets, upcoming contests and \
                 charts. Tools that take a handle fall back to the configured default handle."
                    .into(),
            ),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::HttpClient;

    fn server(default_handle: Option<&str>) -> CpServer {
        let http = HttpClient::new(Duration::from_secs(1)).unwrap();
        CpServer::new(
            CodeforcesClient::new(http.clone(), "http://127.0.0.1:9".into()),
            LeetCodeClient::new(http, "http://127.0.0.1:9".into()),
            Settings {
                default_handle: default_handle.map(str::to_owned),
                owner_number: None,
            },
        )
    }

    #[test]
    fn handles_are_validated() {
        assert!(is_valid_handle("tourist"));
        assert!(is_valid_handle("Um_nik"));
        assert!(is_valid_handle("a.b-c"));
        assert!(!is_valid_handle(""));
        assert!(!is_valid_handle("bad handle"));
        assert!(!is_valid_handle("x;y"));
        assert!(!is_valid_handle(&"a".repeat(25)));
    }

    #[test]
    fn explicit_handle_wins_over_default() {
        let s = server(Some("fallback"));
        assert_eq!(s.resolve_handle(Some(" tourist ")).unwrap(), "tourist");
        assert_eq!(s.resolve_handle(Some("  ")).unwrap(), "fallback");
        assert_eq!(s.resolve_handle(None).unwrap(), "fallback");
    }

    #[test]
    fn missing_handle_without_default_is_rejected() {
        let s = server(None);
        let err = s.resolve_handle(None).unwrap_err();
        assert_eq!(err.is_error, Some(true));
        assert!(s.resolve_handles(Some(vec![]), 10).is_err());
    }

    #[test]
    fn handle_lists_are_capped() {
        let s = server(None);
        let many = (0..11).map(|i| format!("user{i}")).collect();
        assert!(s.resolve_handles(Some(many), 10).is_err());
        let two = vec!["a1".to_owned(), "b2".to_owned()];
        assert_eq!(s.resolve_handles(Some(two.clone()), 10).unwrap(), two);
    }

    #[test]
    fn ranges_are_checked() {
        assert_eq!(check_range("count", 5, 1..=20).unwrap(), 5);
        assert!(check_range("count", 0, 1..=20).is_err());
        assert!(check_range("bin_size", 450, 100..=400).is_err());
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_upstream() {
        let s = server(None);
        let result = s
            .get_rating_changes(Parameters(profile::RatingChangesParams {
                handle: Some("tourist".into()),
                count: Some(0),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));

        let result = s
            .plot_performance_graph(Parameters(plots::HandleParams { handle: None }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn out_of_range_ratings_are_rejected() {
        let s = server(Some("tourist"));
        for (min, max) in [(Some(i32::MAX), None), (None, Some(i32::MIN)), (Some(-1), Some(1000))] {
            let result = s
                .recommend_problems(Parameters(practice::RecommendParams {
                    handle: None,
                    min_rating: min,
                    max_rating: max,
                    count: None,
                }))
                .await
                .unwrap();
            assert_eq!(result.is_error, Some(true));
        }
    }

    #[test]
    fn images_are_base64_svg() {
        let result = image_result("caption".into(), Ok("<svg/>".into())).unwrap();
        assert_eq!(result.content.len(), 2);
        let json = serde_json::to_value(&result.content[1]).unwrap();
        assert_eq!(json["mimeType"], "image/svg+xml");
        assert_eq!(json["data"], "PHN2Zy8+");
    }
}
