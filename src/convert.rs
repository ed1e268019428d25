use std::collections::BTreeMap;

use chrono::DateTime;

use crate::models::{Contest, DailyQuestion, Problem, RatingChange, Submission, User};
use crate::stats::UpsolveTarget;

const HISTOGRAM_WIDTH: usize = 40;

fn looks_like_html(s: &str) -> bool {
    let trimmed = s.trim();
    if !trimmed.contains('<') {
        return false;
    }
    const TAGS: &[&str] = &[
        "<p>", "<p ", "<div", "<ul", "<ol", "<li", "<table", "<br", "<h1", "<h2",
        "<h3", "<h4", "<h5", "<h6", "<pre>", "<pre ", "<code>", "<code ",
        "<strong", "<em>", "<em ", "<span", "<img", "<a ", "<sup", "<sub",
    ];
    let lower = trimmed.to_ascii_lowercase();
    TAGS.iter().any(|tag| lower.contains(tag))
}

pub fn html_to_markdown(content: &str) -> String {
    if content.trim().is_empty() {
        return "No description available.".into();
    }
    if !looks_like_html(content) {
        return content.to_owned();
    }
    match std::panic::catch_unwind(|| htmd::convert(content)) {
        Ok(Ok(md)) if !md.trim().is_empty() => md,
        _ => ammonia::clean_text(content),
    }
}

pub fn format_date(secs: i64, fmt: &str) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(fmt).to_string())
        .unwrap_or_else(|| "N/A".into())
}

pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let days = secs / 86_400;
    let hours = secs % 86_400 / 3_600;
    let minutes = secs % 3_600 / 60;
    match (days, hours) {
        (0, 0) => format!("{minutes}m"),
        (0, h) => format!("{h}h {minutes:02}m"),
        (d, h) => format!("{d}d {h}h"),
    }
}

fn or_na<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "N/A".into())
}

pub fn format_user_stats(users: &[User], leaderboard: bool) -> String {
    let mut sorted: Vec<&User> = users.iter().collect();
    sorted.sort_by_key(|u| std::cmp::Reverse(u.rating.unwrap_or(0)));

    let heading = if leaderboard { "Leaderboard" } else { "Stats" };
    let mut out = format!(
        "\
# Codeforces User {heading}

| # | Handle | Rank | Rating | Max Rating | Member Since |
|---|--------|------|--------|------------|--------------|
"
    );

    for (i, u) in sorted.iter().enumerate() {
        out.push_str(&format!(
            "| {} | [{handle}](https://codeforces.com/profile/{handle}) | {} | {} | {} | {} |\n",
            i + 1,
            u.rank.as_deref().unwrap_or("Unrated"),
            or_na(u.rating),
            match (u.max_rating, u.max_rank.as_deref()) {
                (Some(r), Some(rank)) => format!("{r} ({rank})"),
                (r, _) => or_na(r),
            },
            format_date(u.registration_time_seconds, "%b %Y"),
            handle = u.handle,
        ));
    }

    out
}

pub fn format_recommendations(
    handle: &str,
    lo: i32,
    hi: i32,
    picks: &[(&Problem, Option<u64>)],
) -> String {
    let mut out = format!("# Recommended Problems for {handle} ({lo}-{hi})\n\n");
    for (i, (p, solved_count)) in picks.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}]({}) - Rating: {}",
            i + 1,
            p.name,
            p.url(),
            or_na(p.rating),
        ));
        if !p.tags.is_empty() {
            out.push_str(&format!(" - Tags: {}", p.tags.join(", ")));
        }
        if let Some(n) = solved_count {
            out.push_str(&format!(" - Solved by {}", format_number(*n)));
        }
        out.push('\n');
    }
    out
}

fn submission_url(s: &Submission) -> String {
    match s.problem.contest_id {
        Some(c) => format!("https://codeforces.com/contest/{c}/submission/{}", s.id),
        None => format!("https://codeforces.com/problemset/submission/0/{}", s.id),
    }
}

pub fn format_recent_solves(handle: &str, solves: &[&Submission]) -> String {
    let mut out = format!("# Recently Solved by {handle}\n\n");
    for (i, s) in solves.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}]({}) - **{}** (Solved on {}, [submission]({}))\n",
            i + 1,
            s.problem.name,
            s.problem.url(),
            or_na(s.problem.rating),
            format_date(s.creation_time_seconds, "%Y-%m-%d"),
            submission_url(s),
        ));
    }
    out
}

/// Expects `changes` newest first.
pub fn format_rating_changes(handle: &str, changes: &[&RatingChange]) -> String {
    let mut out = format!("# Recent Rating Changes for {handle}\n\n");
    for c in changes {
        let delta = c.delta();
        let arrow = match delta.signum() {
            1 => "▲",
            -1 => "▼",
            _ => "=",
        };
        out.push_str(&format!(
            "- [{}](https://codeforces.com/contest/{}) ({})\n",
            c.contest_name,
            c.contest_id,
            format_date(c.rating_update_time_seconds, "%Y-%m-%d"),
        ));
        out.push_str(&format!(
            "  - Rank: {}, {arrow} {} -> **{}** ({delta:+})\n",
            c.rank, c.old_rating, c.new_rating,
        ));
    }
    out
}

pub fn format_histogram(handle: &str, bins: &BTreeMap<i32, usize>, bin_size: i32) -> String {
    let max_count = bins.values().copied().max().unwrap_or(0);
    let total: usize = bins.values().sum();
    let mut out = format!("# Solved Problems Histogram for {handle}\n\n```\n");
    for (&rating, &count) in bins {
        let bar_len = if max_count > 0 {
            count * HISTOGRAM_WIDTH / max_count
        } else {
            0
        };
        let bar = "█".repeat(bar_len);
        out.push_str(&format!(
            "{rating:4}-{:<4} | {bar}{pad} ({count})\n",
            rating + bin_size - 1,
            pad = " ".repeat(HISTOGRAM_WIDTH - bar_len),
        ));
    }
    out.push_str(&format!("```\n\nTotal rated problems solved: {}", format_number(total as u64)));
    out
}

pub fn format_upsolve(handle: &str, targets: &[UpsolveTarget]) -> String {
    let mut out = format!(
        "\
# Upsolve Targets for {handle}

| # | Contest | Solved | Remaining | Date |
|---|---------|--------|-----------|------|
"
    );
    for (i, t) in targets.iter().enumerate() {
        out.push_str(&format!(
            "| {} | [{}](https://codeforces.com/contest/{}) | {}/{} | {} | {} |\n",
            i + 1,
            t.contest_name,
            t.contest_id,
            t.solved,
            t.total,
            t.unsolved(),
            format_date(t.time, "%Y-%m-%d"),
        ));
    }
    out
}

pub fn format_daily(daily: &DailyQuestion, base_url: &str) -> String {
    let q = &daily.question;
    let tags = if q.topic_tags.is_empty() {
        "N/A".to_owned()
    } else {
        q.topic_tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let ac_rate = q
        .ac_rate
        .map(|v| format!("{v:.1}%"))
        .unwrap_or_else(|| "N/A".into());
    let content = html_to_markdown(q.content.as_deref().unwrap_or(""));

    format!(
        "\
# Today's LeetCode Daily Problem ({date})

**{id}. {title}** ({difficulty})

- Tags: {tags}
- AC Rate: {ac_rate}
- Link: {base_url}{link}
- Solutions: {base_url}/problems/{slug}/solutions/

---

{content}",
        date = daily.date,
        id = q.question_frontend_id,
        title = q.title,
        difficulty = q.difficulty,
        link = daily.link,
        slug = q.title_slug,
    )
}

/// Expects `contests` soonest first.
pub fn format_contests(contests: &[&Contest], now: i64) -> String {
    let mut out = String::from(
        "\
# Upcoming Codeforces Contests

| Contest | Starts (UTC) | Starts In | Duration |
|---------|--------------|-----------|----------|
",
    );
    for c in contests {
        let (starts, starts_in) = match c.start_time_seconds {
            Some(t) => (format_date(t, "%Y-%m-%d %H:%M"), format_duration(t - now)),
            None => ("TBA".to_owned(), "TBA".to_owned()),
        };
        out.push_str(&format!(
            "| [{}](https://codeforces.com/contests/{}) | {starts} | {starts_in} | {} |\n",
            c.name,
            c.id,
            format_duration(c.duration_seconds),
        ));
    }
    out
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn truncate_output(s: String) -> String {
    if s.len() <= 102_400 {
        return s;
    }
    let boundary = s.floor_char_boundary(102_400);
    let mut truncated = s[..boundary].to_owned();
    truncated.push_str("\n\n... (truncated)");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, TopicTag};
    use crate::stats::fixtures::{problem, rating_change, submission};

    fn user(handle: &str, rating: Option<i32>) -> User {
        User {
            handle: handle.into(),
            rating,
            max_rating: rating.map(|r| r + 100),
            rank: rating.map(|_| "expert".to_owned()),
            max_rank: rating.map(|_| "candidate master".to_owned()),
            registration_time_seconds: 1_600_000_000,
        }
    }

    #[test]
    fn leaderboard_is_sorted_by_rating() {
        let users = vec![user("low", Some(1400)), user("unrated", None), user("high", Some(2100))];
        let out = format_user_stats(&users, true);
        assert!(out.starts_with("# Codeforces User Leaderboard"));
        let high = out.find("[high]").unwrap();
        let low = out.find("[low]").unwrap();
        let unrated = out.find("[unrated]").unwrap();
        assert!(high < low && low < unrated);
        assert!(out.contains("| Unrated | N/A | N/A | Sep 2020 |"));
        assert!(out.contains("2200 (candidate master)"));
    }

    #[test]
    fn single_user_gets_stats_heading() {
        let out = format_user_stats(&[user("solo", Some(1500))], false);
        assert!(out.starts_with("# Codeforces User Stats"));
        assert!(out.contains("https://codeforces.com/profile/solo"));
    }

    #[test]
    fn rating_changes_show_signed_delta() {
        let up = rating_change(100, 1_700_000_000, 1500, 1575);
        let down = rating_change(101, 1_700_100_000, 1575, 1540);
        let out = format_rating_changes("me", &[&down, &up]);
        assert!(out.contains("▼ 1575 -> **1540** (-35)"));
        assert!(out.contains("▲ 1500 -> **1575** (+75)"));
        assert!(out.find("Round 101").unwrap() < out.find("Round 100").unwrap());
    }

    #[test]
    fn histogram_bars_scale_to_widest_bin() {
        let bins = BTreeMap::from([(800, 10), (900, 5), (1000, 0)]);
        let out = format_histogram("me", &bins, 100);
        let lines: Vec<&str> = out.lines().filter(|l| l.contains(" | ")).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(" 800-899  | "));
        assert_eq!(lines[0].matches('█').count(), 40);
        assert_eq!(lines[1].matches('█').count(), 20);
        assert!(lines[2].ends_with("(0)"));
        assert!(out.ends_with("Total rated problems solved: 15"));
    }

    #[test]
    fn recommendations_link_problems() {
        let p = problem(1900, "C", Some(1500), &["dp", "greedy"]);
        let out = format_recommendations("me", 1500, 1699, &[(&p, Some(12345))]);
        assert!(out.contains("1. [Problem 1900C](https://codeforces.com/problemset/problem/1900/C)"));
        assert!(out.contains("Tags: dp, greedy"));
        assert!(out.contains("Solved by 12,345"));
    }

    #[test]
    fn recent_solves_show_date() {
        let s = submission(1, 1_700_000_000, problem(5, "A", None, &[]), "OK", "Rust");
        let out = format_recent_solves("me", &[&s]);
        assert!(out.contains("**N/A** (Solved on 2023-11-14, [submission](https://codeforces.com/contest/5/submission/1))"));
    }

    #[test]
    fn upsolve_table_lists_remaining() {
        let t = UpsolveTarget {
            contest_id: 42,
            contest_name: "Round 42".into(),
            solved: 3,
            total: 7,
            time: 0,
        };
        let out = format_upsolve("me", &[t]);
        assert!(out.contains("| 1 | [Round 42](https://codeforces.com/contest/42) | 3/7 | 4 | 1970-01-01 |"));
    }

    #[test]
    fn contests_show_countdown() {
        let c = Contest {
            id: 2000,
            name: "Div. 2".into(),
            phase: "BEFORE".into(),
            start_time_seconds: Some(90_000),
            duration_seconds: 7_200,
        };
        let out = format_contests(&[&c], 0);
        assert!(out.contains("| 1d 1h | 2h 00m |"));
    }

    #[test]
    fn daily_renders_markdown() {
        let daily = DailyQuestion {
            date: "2026-10-16".into(),
            link: "/problems/two-sum/".into(),
            question: Question {
                question_frontend_id: "1".into(),
                title: "Two Sum".into(),
                title_slug: "two-sum".into(),
                difficulty: "Easy".into(),
                content: Some("Plain text statement".into()),
                topic_tags: vec![TopicTag { name: "Array".into() }],
                ac_rate: Some(55.123),
            },
        };
        let out = format_daily(&daily, "https://leetcode.com");
        assert!(out.contains("**1. Two Sum** (Easy)"));
        assert!(out.contains("- AC Rate: 55.1%"));
        assert!(out.contains("- Link: https://leetcode.com/problems/two-sum/"));
        assert!(out.contains("- Solutions: https://leetcode.com/problems/two-sum/solutions/"));
        assert!(out.ends_with("Plain text statement"));
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(59), "0m");
        assert_eq!(format_duration(5_400), "1h 30m");
        assert_eq!(format_duration(-10), "0m");
    }

    #[test]
    fn numbers_get_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn long_output_is_truncated() {
        let out = truncate_output("é".repeat(60_000));
        assert!(out.ends_with("... (truncated)"));
        assert!(out.len() < 102_500);
    }
}
