//! Pure scoring functions for timed answers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Speed-reward formula applied to correct answers.
///
/// Both formulas are kept as named, selectable policies: the codebase this
/// engine replaces used full-decay in one submission flow and the 50% floor in
/// another, and callers must be able to pick either rather than having one
/// silently unified into the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// `time_factor = max(0, 1 - t/T)`; a correct answer at the buzzer earns 0.
    FullDecay,
    /// `time_factor = 0.5 + 0.5 * max(0, 1 - t/T)`; correct answers always
    /// earn at least half the base points.
    FloorHalf,
}

impl ScoringPolicy {
    /// Multiplier applied to base points, rewarding faster answers.
    pub fn time_factor(self, time_spent: Duration, time_limit: Duration) -> f64 {
        let limit = time_limit.as_secs_f64();
        let remaining = if limit > 0.0 {
            (1.0 - time_spent.as_secs_f64() / limit).max(0.0)
        } else {
            0.0
        };

        match self {
            ScoringPolicy::FullDecay => remaining,
            ScoringPolicy::FloorHalf => 0.5 + 0.5 * remaining,
        }
    }

    /// Points awarded for a submission. Incorrect answers always score zero.
    pub fn score(
        self,
        is_correct: bool,
        base_points: u32,
        time_spent: Duration,
        time_limit: Duration,
    ) -> u32 {
        if !is_correct {
            return 0;
        }

        let raw = f64::from(base_points) * self.time_factor(time_spent, time_limit);
        raw.round() as u32
    }
}

/// How the per-question answer window is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeLimitRule {
    /// Every question gets the same fixed window.
    PerQuestion {
        /// Window length in seconds.
        seconds: u64,
    },
    /// A quiz-level time budget split evenly across its questions.
    QuizBudget {
        /// Total budget in seconds for the whole quiz.
        total_seconds: u64,
    },
}

impl TimeLimitRule {
    /// Resolve the concrete window for a quiz with `question_count` questions.
    pub fn question_limit(self, question_count: usize) -> Duration {
        match self {
            TimeLimitRule::PerQuestion { seconds } => Duration::from_secs(seconds),
            TimeLimitRule::QuizBudget { total_seconds } => {
                let count = question_count.max(1) as u32;
                Duration::from_secs(total_seconds) / count
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LIMIT: Duration = Duration::from_secs(20);

    #[test]
    fn incorrect_answers_score_zero_under_both_policies() {
        for policy in [ScoringPolicy::FullDecay, ScoringPolicy::FloorHalf] {
            assert_eq!(policy.score(false, 1000, Duration::ZERO, LIMIT), 0);
        }
    }

    #[test]
    fn faster_correct_answers_earn_more() {
        for policy in [ScoringPolicy::FullDecay, ScoringPolicy::FloorHalf] {
            let fast = policy.score(true, 1000, Duration::from_secs(2), LIMIT);
            let slow = policy.score(true, 1000, Duration::from_secs(15), LIMIT);
            assert!(fast > slow, "{policy:?}: {fast} <= {slow}");
        }
    }

    #[test]
    fn full_decay_reaches_zero_at_the_limit() {
        assert_eq!(ScoringPolicy::FullDecay.score(true, 1000, LIMIT, LIMIT), 0);
        assert_eq!(
            ScoringPolicy::FullDecay.score(true, 1000, LIMIT * 2, LIMIT),
            0
        );
    }

    #[test]
    fn floor_half_never_drops_below_half_base() {
        assert_eq!(ScoringPolicy::FloorHalf.score(true, 1000, LIMIT, LIMIT), 500);
        assert_eq!(
            ScoringPolicy::FloorHalf.score(true, 1000, LIMIT * 3, LIMIT),
            500
        );
    }

    #[test]
    fn instant_answer_earns_full_base() {
        assert_eq!(
            ScoringPolicy::FullDecay.score(true, 750, Duration::ZERO, LIMIT),
            750
        );
        assert_eq!(
            ScoringPolicy::FloorHalf.score(true, 750, Duration::ZERO, LIMIT),
            750
        );
    }

    #[test]
    fn points_round_to_nearest() {
        // 1s of 20s leaves a 0.95 factor: 101 * 0.95 = 95.95 -> 96.
        let points =
            ScoringPolicy::FullDecay.score(true, 101, Duration::from_secs(1), LIMIT);
        assert_eq!(points, 96);
    }

    #[test]
    fn quiz_budget_splits_evenly_across_questions() {
        let rule = TimeLimitRule::QuizBudget { total_seconds: 300 };
        assert_eq!(rule.question_limit(10), Duration::from_secs(30));
    }

    #[test]
    fn quiz_budget_tolerates_empty_quizzes() {
        let rule = TimeLimitRule::QuizBudget { total_seconds: 300 };
        assert_eq!(rule.question_limit(0), Duration::from_secs(300));
    }

    #[test]
    fn fixed_rule_ignores_question_count() {
        let rule = TimeLimitRule::PerQuestion { seconds: 20 };
        assert_eq!(rule.question_limit(3), rule.question_limit(30));
    }
}
