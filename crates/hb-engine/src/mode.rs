//! Machine modes and bonus trigger sources

use serde::{Deserialize, Serialize};

/// Internal lottery mode of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    NormalA,
    NormalB,
    Chance,
    Tengoku,
    DokiDoki,
    SuperDokiDoki,
}

impl Mode {
    /// All modes in declaration order
    pub const ALL: [Mode; 6] = [
        Mode::NormalA,
        Mode::NormalB,
        Mode::Chance,
        Mode::Tengoku,
        Mode::DokiDoki,
        Mode::SuperDokiDoki,
    ];

    /// Tengoku, DokiDoki and SuperDokiDoki form the heaven family
    pub fn is_heaven(&self) -> bool {
        match self {
            Mode::Tengoku | Mode::DokiDoki | Mode::SuperDokiDoki => true,
            Mode::NormalA | Mode::NormalB | Mode::Chance => false,
        }
    }

    /// Rank inside the heaven family (`None` outside it). Symbol upgrades only
    /// ever move up this ladder.
    pub fn heaven_rank(&self) -> Option<u8> {
        match self {
            Mode::Tengoku => Some(0),
            Mode::DokiDoki => Some(1),
            Mode::SuperDokiDoki => Some(2),
            Mode::NormalA | Mode::NormalB | Mode::Chance => None,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::NormalA => "Normal A",
            Mode::NormalB => "Normal B",
            Mode::Chance => "Chance",
            Mode::Tengoku => "Tengoku",
            Mode::DokiDoki => "Doki Doki",
            Mode::SuperDokiDoki => "Super Doki Doki",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What caused a bonus hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusTrigger {
    /// 800-game or through-count ceiling
    Ceiling,
    /// 1/32768 middle-row cherry; bypasses the transition matrix at round end
    MiddleCherry,
    /// Guaranteed symbol
    Guaranteed,
    /// Elapsed-game table inside the 32-game heaven window
    HeavenWindow,
    /// Setting base probability
    Base,
}

impl BonusTrigger {
    pub fn is_middle_cherry(&self) -> bool {
        matches!(self, BonusTrigger::MiddleCherry)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BonusTrigger::Ceiling => "Ceiling",
            BonusTrigger::MiddleCherry => "Middle Cherry",
            BonusTrigger::Guaranteed => "Guaranteed",
            BonusTrigger::HeavenWindow => "Heaven Window",
            BonusTrigger::Base => "Base",
        }
    }
}

impl std::fmt::Display for BonusTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heaven_family() {
        let heaven: Vec<Mode> = Mode::ALL.into_iter().filter(Mode::is_heaven).collect();
        assert_eq!(heaven, vec![Mode::Tengoku, Mode::DokiDoki, Mode::SuperDokiDoki]);
    }

    #[test]
    fn test_heaven_rank_orders_family() {
        assert!(Mode::Tengoku.heaven_rank() < Mode::DokiDoki.heaven_rank());
        assert!(Mode::DokiDoki.heaven_rank() < Mode::SuperDokiDoki.heaven_rank());
        assert_eq!(Mode::Chance.heaven_rank(), None);
    }

    #[test]
    fn test_mode_serializes_snake_case() {
        let json = serde_json::to_string(&Mode::SuperDokiDoki).unwrap();
        assert_eq!(json, "\"super_doki_doki\"");
    }
}
