use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{Problem, ProblemId, Problemset, RatingChange, Submission};

pub const DEFAULT_RATING: i32 = 1200;
pub const WINDOW_SPAN: i32 = 199;

const MAIN_VERDICTS: &[&str] = &[
    "OK",
    "WRONG_ANSWER",
    "TIME_LIMIT_EXCEEDED",
    "MEMORY_LIMIT_EXCEEDED",
    "RUNTIME_ERROR",
    "COMPILATION_ERROR",
];

pub fn solved_problem_ids(submissions: &[Submission]) -> HashSet<ProblemId> {
    submissions
        .iter()
        .filter(|s| s.is_accepted())
        .map(|s| s.problem.id())
        .collect()
}

/// Accepted submissions, newest first, one per problem.
pub fn recent_unique_solves(submissions: &[Submission]) -> Vec<&Submission> {
    let mut accepted: Vec<&Submission> = submissions.iter().filter(|s| s.is_accepted()).collect();
    accepted.sort_by(|a, b| b.creation_time_seconds.cmp(&a.creation_time_seconds));

    let mut seen = HashSet::new();
    accepted.retain(|s| seen.insert(s.problem.id()));
    accepted
}

/// Ratings of distinct solved problems; unrated problems are skipped.
pub fn solved_ratings(submissions: &[Submission]) -> Vec<i32> {
    let mut seen = HashSet::new();
    submissions
        .iter()
        .filter(|s| s.is_accepted())
        .filter_map(|s| {
            let rating = s.problem.rating?;
            seen.insert(s.problem.id()).then_some(rating)
        })
        .collect()
}

pub fn rating_histogram(ratings: &[i32], bin_size: i32) -> BTreeMap<i32, usize> {
    let mut bins = BTreeMap::new();
    for &r in ratings {
        *bins.entry(r.div_euclid(bin_size) * bin_size).or_insert(0) += 1;
    }
    bins
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidWindow {
    pub min: i32,
    pub max: i32,
}

pub fn recommendation_window(
    user_rating: Option<i32>,
    min: Option<i32>,
    max: Option<i32>,
) -> Result<(i32, i32), InvalidWindow> {
    let (lo, hi) = match (min, max) {
        (Some(lo), Some(hi)) => (lo, hi),
        (Some(lo), None) => (lo, lo.saturating_add(WINDOW_SPAN)),
        (None, Some(hi)) => (hi.saturating_sub(WINDOW_SPAN), hi),
        (None, None) => {
            let r = user_rating.unwrap_or(DEFAULT_RATING);
            (r, r.saturating_add(WINDOW_SPAN))
        }
    };
    if lo > hi {
        return Err(InvalidWindow { min: lo, max: hi });
    }
    Ok((lo, hi))
}

pub fn unsolved_in_window<'a>(
    problems: &'a [Problem],
    solved: &HashSet<ProblemId>,
    lo: i32,
    hi: i32,
) -> Vec<&'a Problem> {
    problems
        .iter()
        .filter(|p| p.rating.is_some_and(|r| (lo..=hi).contains(&r)))
        .filter(|p| !solved.contains(&p.id()))
        .collect()
}

fn sorted_counts(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut v: Vec<_> = counts.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v
}

pub fn verdict_distribution(submissions: &[Submission]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for s in submissions {
        let verdict = s.verdict.as_deref().unwrap_or("UNKNOWN");
        let key = if MAIN_VERDICTS.contains(&verdict) {
            verdict
        } else {
            "OTHER"
        };
        *counts.entry(key.to_owned()).or_insert(0) += 1;
    }
    sorted_counts(counts)
}

/// Tag frequency over distinct solved problems.
pub fn tag_distribution(submissions: &[Submission], top: usize) -> Vec<(String, usize)> {
    let mut seen = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for s in submissions.iter().filter(|s| s.is_accepted()) {
        if !seen.insert(s.problem.id()) {
            continue;
        }
        for tag in &s.problem.tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    let mut v = sorted_counts(counts);
    v.truncate(top);
    v
}

pub fn language_distribution(submissions: &[Submission], top: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for s in submissions {
        let lang = if s.programming_language.is_empty() {
            "Unknown"
        } else {
            s.programming_language.as_str()
        };
        *counts.entry(lang.to_owned()).or_insert(0) += 1;
    }
    let mut v = sorted_counts(counts);
    if v.len() > top {
        let other: usize = v.drain(top..).map(|(_, c)| c).sum();
        v.push(("Other".into(), other));
    }
    v
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsolveTarget {
    pub contest_id: i64,
    pub contest_name: String,
    pub solved: usize,
    pub total: usize,
    pub time: i64,
}

impl UpsolveTarget {
    pub fn unsolved(&self) -> usize {
        self.total - self.solved
    }
}

/// Rated contests the user took part in but has not fully solved, closest to
/// a full solve first.
pub fn upsolve_targets(
    changes: &[RatingChange],
    submissions: &[Submission],
    problemset: &Problemset,
) -> Vec<UpsolveTarget> {
    let solved = solved_problem_ids(submissions);
    let mut per_contest: HashMap<i64, (usize, usize)> = HashMap::new();
    for p in &problemset.problems {
        if let Some(c) = p.contest_id {
            let entry = per_contest.entry(c).or_insert((0, 0));
            entry.1 += 1;
            if solved.contains(&p.id()) {
                entry.0 += 1;
            }
        }
    }

    let mut targets: Vec<UpsolveTarget> = changes
        .iter()
        .filter_map(|rc| {
            let &(solved, total) = per_contest.get(&rc.contest_id)?;
            (solved < total).then(|| UpsolveTarget {
                contest_id: rc.contest_id,
                contest_name: rc.contest_name.clone(),
                solved,
                total,
                time: rc.rating_update_time_seconds,
            })
        })
        .collect();

    targets.sort_by(|a, b| {
        a.unsolved()
            .cmp(&b.unsolved())
            .then_with(|| b.time.cmp(&a.time))
    });
    targets
}

/// Rating changes in chronological order.
pub fn chronological(changes: &[RatingChange]) -> Vec<&RatingChange> {
    let mut v: Vec<_> = changes.iter().collect();
    v.sort_by_key(|c| c.rating_update_time_seconds);
    v
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Problem, RatingChange, Submission};

    pub fn problem(contest_id: i64, index: &str, rating: Option<i32>, tags: &[&str]) -> Problem {
        Problem {
            contest_id: Some(contest_id),
            index: index.into(),
            name: format!("Problem {contest_id}{index}"),
            rating,
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    pub fn submission(id: i64, time: i64, problem: Problem, verdict: &str, lang: &str) -> Submission {
        Submission {
            id,
            creation_time_seconds: time,
            problem,
            verdict: Some(verdict.into()),
            programming_language: lang.into(),
        }
    }

    pub fn rating_change(contest_id: i64, time: i64, old: i32, new: i32) -> RatingChange {
        RatingChange {
            contest_id,
            contest_name: format!("Codeforces Round {contest_id}"),
            rank: 100,
            rating_update_time_seconds: time,
            old_rating: old,
            new_rating: new,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn sample() -> Vec<Submission> {
        vec![
            submission(1, 100, problem(1, "A", Some(800), &["math"]), "OK", "GNU C++17"),
            submission(2, 200, problem(1, "A", Some(800), &["math"]), "OK", "GNU C++17"),
            submission(3, 300, problem(1, "B", Some(1200), &["greedy", "math"]), "WRONG_ANSWER", "Python 3"),
            submission(4, 400, problem(1, "B", Some(1200), &["greedy", "math"]), "OK", "Python 3"),
            submission(5, 500, problem(2, "C", None, &["dp"]), "OK", "GNU C++17"),
            submission(6, 600, problem(2, "D", Some(1250), &["dp"]), "TIME_LIMIT_EXCEEDED", "Rust 2021"),
            submission(7, 700, problem(2, "E", Some(1900), &["graphs"]), "CHALLENGED", "GNU C++17"),
        ]
    }

    #[test]
    fn duplicate_accepted_solutions_count_once() {
        let solved = solved_problem_ids(&sample());
        assert_eq!(solved.len(), 3);
        assert!(solved.contains(&problem(1, "A", None, &[]).id()));
        assert!(!solved.contains(&problem(2, "D", None, &[]).id()));
    }

    #[test]
    fn recent_solves_are_newest_first_and_unique() {
        let subs = sample();
        let recent = recent_unique_solves(&subs);
        let ids: Vec<i64> = recent.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 4, 2]);
    }

    #[test]
    fn histogram_counts_sum_to_distinct_rated_solves() {
        let subs = sample();
        let ratings = solved_ratings(&subs);
        assert_eq!(ratings.len(), 2);

        let hist = rating_histogram(&ratings, 100);
        assert_eq!(hist.values().sum::<usize>(), ratings.len());
        assert_eq!(hist.get(&800), Some(&1));
        assert_eq!(hist.get(&1200), Some(&1));
    }

    #[test]
    fn histogram_bins_floor_to_bin_size() {
        let hist = rating_histogram(&[800, 899, 900, 1250, 1399], 200);
        assert_eq!(hist.into_iter().collect::<Vec<_>>(), vec![(800, 3), (1200, 2)]);
    }

    #[test]
    fn window_defaults_to_user_rating() {
        assert_eq!(recommendation_window(Some(1543), None, None), Ok((1543, 1742)));
        assert_eq!(recommendation_window(None, None, None), Ok((1200, 1399)));
    }

    #[test]
    fn window_derives_missing_bound() {
        assert_eq!(recommendation_window(Some(2000), Some(1000), None), Ok((1000, 1199)));
        assert_eq!(recommendation_window(Some(2000), None, Some(1600)), Ok((1401, 1600)));
        assert_eq!(recommendation_window(None, Some(800), Some(3500)), Ok((800, 3500)));
    }

    #[test]
    fn window_bounds_saturate_at_extremes() {
        assert_eq!(
            recommendation_window(None, Some(i32::MAX), None),
            Ok((i32::MAX, i32::MAX))
        );
        assert_eq!(
            recommendation_window(None, None, Some(i32::MIN)),
            Ok((i32::MIN, i32::MIN))
        );
        assert_eq!(
            recommendation_window(Some(i32::MAX), None, None),
            Ok((i32::MAX, i32::MAX))
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(
            recommendation_window(None, Some(1500), Some(1000)),
            Err(InvalidWindow { min: 1500, max: 1000 })
        );
    }

    #[test]
    fn recommendations_exclude_solved_and_out_of_window() {
        let problems = vec![
            problem(1, "A", Some(800), &[]),
            problem(1, "B", Some(1200), &[]),
            problem(3, "A", Some(1200), &[]),
            problem(3, "B", Some(1300), &[]),
            problem(3, "C", None, &[]),
            problem(3, "D", Some(1500), &[]),
        ];
        let solved = solved_problem_ids(&sample());
        let picked = unsolved_in_window(&problems, &solved, 1200, 1399);
        let ids: Vec<String> = picked.iter().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, vec!["3A", "3B"]);
    }

    #[test]
    fn verdicts_fold_rare_outcomes_into_other() {
        let dist = verdict_distribution(&sample());
        assert_eq!(dist[0], ("OK".to_owned(), 4));
        assert!(dist.contains(&("OTHER".to_owned(), 1)));
        assert!(dist.contains(&("WRONG_ANSWER".to_owned(), 1)));
        assert_eq!(dist.iter().map(|(_, c)| c).sum::<usize>(), 7);
    }

    #[test]
    fn tags_count_distinct_solved_problems() {
        let tags = tag_distribution(&sample(), 10);
        assert_eq!(
            tags,
            vec![
                ("math".to_owned(), 2),
                ("dp".to_owned(), 1),
                ("greedy".to_owned(), 1)
            ]
        );
        assert_eq!(tag_distribution(&sample(), 1).len(), 1);
    }

    #[test]
    fn languages_beyond_top_are_grouped() {
        let dist = language_distribution(&sample(), 1);
        assert_eq!(
            dist,
            vec![("GNU C++17".to_owned(), 4), ("Other".to_owned(), 3)]
        );
    }

    #[test]
    fn upsolve_targets_prefer_nearly_complete_contests() {
        let problemset = Problemset {
            problems: vec![
                problem(1, "A", Some(800), &[]),
                problem(1, "B", Some(1200), &[]),
                problem(1, "C", Some(1600), &[]),
                problem(2, "C", None, &[]),
                problem(2, "D", Some(1250), &[]),
                problem(2, "E", Some(1900), &[]),
                problem(2, "F", Some(2400), &[]),
                problem(4, "A", Some(800), &[]),
            ],
            problem_statistics: vec![],
        };
        let changes = vec![
            rating_change(1, 1_000, 1500, 1550),
            rating_change(2, 2_000, 1550, 1500),
            rating_change(4, 3_000, 1500, 1520),
            rating_change(9, 4_000, 1520, 1530),
        ];
        let targets = upsolve_targets(&changes, &sample(), &problemset);
        let summary: Vec<(i64, usize, usize)> = targets
            .iter()
            .map(|t| (t.contest_id, t.solved, t.total))
            .collect();
        assert_eq!(summary, vec![(4, 0, 1), (1, 2, 3), (2, 1, 4)]);
    }

    #[test]
    fn upsolve_ignores_solves_outside_the_problemset() {
        let problemset = Problemset {
            problems: vec![problem(1, "A", Some(800), &[]), problem(1, "B", Some(1200), &[])],
            problem_statistics: vec![],
        };
        let subs = vec![
            submission(1, 100, problem(1, "A", Some(800), &[]), "OK", "Rust 2021"),
            submission(2, 200, problem(1, "C", None, &[]), "OK", "Rust 2021"),
        ];
        let changes = vec![rating_change(1, 1_000, 1500, 1550)];
        let targets = upsolve_targets(&changes, &subs, &problemset);
        assert_eq!(targets.len(), 1);
        assert_eq!((targets[0].solved, targets[0].total), (1, 2));
        assert_eq!(targets[0].unsolved(), 1);
    }

    #[test]
    fn chronological_sorts_oldest_first() {
        let changes = vec![rating_change(2, 200, 0, 1), rating_change(1, 100, 0, 1)];
        let sorted = chronological(&changes);
        assert_eq!(sorted[0].contest_id, 1);
    }
}
