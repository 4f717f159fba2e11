//! Record scoring. Inspectors and board staff rely on these flags for
//! compliance reporting, so the branching is kept as an auditable table.

use crate::sections::FlagStandard;
use serde::{Deserialize, Serialize};

/// Flag assigned to an inspection record once its answer is scored against
/// the owning section's severity standard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Flag {
    #[serde(rename = "RED")]
    Red,
    #[serde(rename = "YELLOW")]
    Yellow,
    #[serde(rename = "GREEN")]
    Green,
    #[serde(rename = "NO")]
    No,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Red => "RED",
            Flag::Yellow => "YELLOW",
            Flag::Green => "GREEN",
            Flag::No => "NO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RED" => Some(Flag::Red),
            "YELLOW" => Some(Flag::Yellow),
            "GREEN" => Some(Flag::Green),
            "NO" => Some(Flag::No),
            _ => None,
        }
    }
}

/// Affirmative answer under each standard maps to that standard's flag.
/// Anything else scores NO.
const RANKING_TABLE: &[(&str, FlagStandard, Flag)] = &[
    ("yes", FlagStandard::Red, Flag::Red),
    ("yes", FlagStandard::Yellow, Flag::Yellow),
];

/// Total over its input domain. `answer` is normalized before the lookup so
/// "Yes" and " yes " score the same as "yes".
pub fn rank_record(answer: &str, standard: FlagStandard) -> Flag {
    let answer = answer.trim().to_lowercase();
    RANKING_TABLE
        .iter()
        .find(|(a, s, _)| *a == answer && *s == standard)
        .map(|(_, _, flag)| *flag)
        .unwrap_or(Flag::No)
}

/// Numeric weight of a flag, used when aggregating a plan's compliance score.
pub fn record_rank(flag: Flag) -> u32 {
    match flag {
        Flag::Red => 40,
        Flag::Green => 92,
        Flag::Yellow => 0,
        Flag::No => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_answers() {
        assert_eq!(rank_record("yes", FlagStandard::Red), Flag::Red);
        assert_eq!(rank_record("yes", FlagStandard::Yellow), Flag::Yellow);
    }

    #[test]
    fn test_non_affirmative_answers() {
        assert_eq!(rank_record("no", FlagStandard::Red), Flag::No);
        assert_eq!(rank_record("no", FlagStandard::Yellow), Flag::No);
        assert_eq!(rank_record("", FlagStandard::Red), Flag::No);
        assert_eq!(rank_record("maybe", FlagStandard::Yellow), Flag::No);
    }

    #[test]
    fn test_answer_normalization() {
        assert_eq!(rank_record("Yes", FlagStandard::Red), Flag::Red);
        assert_eq!(rank_record("  YES  ", FlagStandard::Yellow), Flag::Yellow);
    }

    #[test]
    fn test_rank_weights() {
        assert_eq!(record_rank(Flag::Red), 40);
        assert_eq!(record_rank(Flag::Green), 92);
        assert_eq!(record_rank(Flag::Yellow), 0);
        assert_eq!(record_rank(Flag::No), 0);
    }
}
