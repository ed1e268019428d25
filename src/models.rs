use std::fmt;

use serde::Deserialize;

/// Response wrapper shared by every Codeforces API method.
#[derive(Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "none")]
    pub result: Option<T>,
}

fn none<T>() -> Option<T> {
    None
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub handle: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub max_rating: Option<i32>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub max_rank: Option<String>,
    #[serde(default)]
    pub registration_time_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProblemId {
    pub contest_id: Option<i64>,
    pub index: String,
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.contest_id {
            Some(c) => write!(f, "{c}{}", self.index),
            None => f.write_str(&self.index),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(default)]
    pub contest_id: Option<i64>,
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Problem {
    pub fn id(&self) -> ProblemId {
        ProblemId {
            contest_id: self.contest_id,
            index: self.index.clone(),
        }
    }

    pub fn url(&self) -> String {
        match self.contest_id {
            Some(c) => format!("https://codeforces.com/problemset/problem/{c}/{}", self.index),
            None => "https://codeforces.com/problemset".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub creation_time_seconds: i64,
    pub problem: Problem,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub programming_language: String,
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        self.verdict.as_deref() == Some("OK")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingChange {
    pub contest_id: i64,
    pub contest_name: String,
    pub rank: i64,
    pub rating_update_time_seconds: i64,
    pub old_rating: i32,
    pub new_rating: i32,
}

impl RatingChange {
    pub fn delta(&self) -> i32 {
        self.new_rating - self.old_rating
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatistics {
    #[serde(default)]
    pub contest_id: Option<i64>,
    pub index: String,
    pub solved_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problemset {
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub problem_statistics: Vec<ProblemStatistics>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: i64,
    pub name: String,
    pub phase: String,
    #[serde(default)]
    pub start_time_seconds: Option<i64>,
    pub duration_seconds: i64,
}

#[derive(Deserialize)]
pub struct GraphQlResponse<T> {
    #[serde(default = "none")]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyData {
    #[serde(default)]
    pub active_daily_coding_challenge_question: Option<DailyQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyQuestion {
    pub date: String,
    pub link: String,
    pub question: Question,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_frontend_id: String,
    pub title: String,
    pub title_slug: String,
    pub difficulty: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub topic_tags: Vec<TopicTag>,
    #[serde(default)]
    pub ac_rate: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicTag {
    pub name: String,
}
