//! Point scoring for tasks.
//!
//! A task's point value is fixed at creation from two closed enums:
//! the estimated duration gives a base value, the difficulty scales it.
//! Settlement later uses the stored value and never recomputes it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How hard a task is. Scales the duration's base points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Epic,
}

impl Difficulty {
    /// Point multiplier applied to the duration's base value.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Normal => 1.5,
            Difficulty::Hard => 2.0,
            Difficulty::Epic => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Epic => "epic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            "epic" => Some(Difficulty::Epic),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated duration bucket. The wire format keeps the historical
/// string-of-minutes encoding ("5", "15", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Duration {
    #[serde(rename = "5")]
    Min5,
    #[serde(rename = "15")]
    Min15,
    #[serde(rename = "30")]
    Min30,
    #[serde(rename = "60")]
    Min60,
    #[serde(rename = "120")]
    Min120,
}

impl Duration {
    /// Base point value before the difficulty multiplier.
    pub fn base_points(self) -> i64 {
        match self {
            Duration::Min5 => 5,
            Duration::Min15 => 10,
            Duration::Min30 => 15,
            Duration::Min60 => 25,
            Duration::Min120 => 40,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Duration::Min5 => "5",
            Duration::Min15 => "15",
            Duration::Min30 => "30",
            Duration::Min60 => "60",
            Duration::Min120 => "120",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "5" => Some(Duration::Min5),
            "15" => Some(Duration::Min15),
            "30" => Some(Duration::Min30),
            "60" => Some(Duration::Min60),
            "120" => Some(Duration::Min120),
            _ => None,
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display ordering bucket, derived 1:1 from difficulty at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Rank used by the board ordering: URGENT > HIGH > MEDIUM > LOW.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Priority::Low),
            "MEDIUM" => Some(Priority::Medium),
            "HIGH" => Some(Priority::High),
            "URGENT" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point value for a new task: `round(base_points(duration) * multiplier(difficulty))`.
///
/// All inputs are positive, so `f64::round` gives round-half-up (half away
/// from zero), e.g. normal + 15 min = round(10 * 1.5) = 15.
pub fn compute_points(difficulty: Difficulty, duration: Duration) -> i64 {
    (duration.base_points() as f64 * difficulty.multiplier()).round() as i64
}

/// Display priority for a new task, fixed 1:1 from difficulty.
pub fn derive_priority(difficulty: Difficulty) -> Priority {
    match difficulty {
        Difficulty::Easy => Priority::Low,
        Difficulty::Normal => Priority::Medium,
        Difficulty::Hard => Priority::High,
        Difficulty::Epic => Priority::Urgent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_points_full_table() {
        let expected = [
            // (difficulty, duration, points)
            (Difficulty::Easy, Duration::Min5, 5),
            (Difficulty::Easy, Duration::Min15, 10),
            (Difficulty::Easy, Duration::Min30, 15),
            (Difficulty::Easy, Duration::Min60, 25),
            (Difficulty::Easy, Duration::Min120, 40),
            (Difficulty::Normal, Duration::Min5, 8),
            (Difficulty::Normal, Duration::Min15, 15),
            (Difficulty::Normal, Duration::Min30, 23),
            (Difficulty::Normal, Duration::Min60, 38),
            (Difficulty::Normal, Duration::Min120, 60),
            (Difficulty::Hard, Duration::Min5, 10),
            (Difficulty::Hard, Duration::Min15, 20),
            (Difficulty::Hard, Duration::Min30, 30),
            (Difficulty::Hard, Duration::Min60, 50),
            (Difficulty::Hard, Duration::Min120, 80),
            (Difficulty::Epic, Duration::Min5, 15),
            (Difficulty::Epic, Duration::Min15, 30),
            (Difficulty::Epic, Duration::Min30, 45),
            (Difficulty::Epic, Duration::Min60, 75),
            (Difficulty::Epic, Duration::Min120, 120),
        ];
        for (difficulty, duration, points) in expected {
            assert_eq!(
                compute_points(difficulty, duration),
                points,
                "{difficulty} x {duration}"
            );
        }
    }

    #[test]
    fn half_points_round_up() {
        // 5 * 1.5 = 7.5 and 15 * 1.5 = 22.5 are the only fractional cells.
        assert_eq!(compute_points(Difficulty::Normal, Duration::Min5), 8);
        assert_eq!(compute_points(Difficulty::Normal, Duration::Min30), 23);
    }

    #[test]
    fn priority_tracks_difficulty() {
        assert_eq!(derive_priority(Difficulty::Easy), Priority::Low);
        assert_eq!(derive_priority(Difficulty::Normal), Priority::Medium);
        assert_eq!(derive_priority(Difficulty::Hard), Priority::High);
        assert_eq!(derive_priority(Difficulty::Epic), Priority::Urgent);
    }

    #[test]
    fn priority_rank_ordering() {
        assert!(Priority::Urgent.rank() > Priority::High.rank());
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn enum_parsing_round_trips() {
        for s in ["easy", "normal", "hard", "epic"] {
            assert_eq!(Difficulty::parse(s).map(|d| d.as_str()), Some(s));
        }
        for s in ["5", "15", "30", "60", "120"] {
            assert_eq!(Duration::parse(s).map(|d| d.as_str()), Some(s));
        }
        assert!(Difficulty::parse("impossible").is_none());
        assert!(Duration::parse("45").is_none());
    }
}
