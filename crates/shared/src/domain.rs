use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ProtocolViolation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Normal,
    TimeAttack,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Normal => "normal",
            GameMode::TimeAttack => "time_attack",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ProtocolViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "normal" => Ok(GameMode::Normal),
            "time_attack" => Ok(GameMode::TimeAttack),
            other => Err(ProtocolViolation::UnknownMode(other.to_string())),
        }
    }
}

/// A prompt and its options in display order, exactly as served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
}

impl Question {
    pub fn new(text: impl Into<String>, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Looks up an option by its 1-based display position.
    pub fn option_at(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|index| self.options.get(index))
            .map(String::as_str)
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }

    pub fn validate(&self) -> Result<(), ProtocolViolation> {
        if self.options.is_empty() {
            return Err(ProtocolViolation::EmptyOptions(self.text.clone()));
        }
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(ProtocolViolation::DuplicateOption(option.clone()));
            }
        }
        Ok(())
    }
}

/// What the service wants shown after the current result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Continue(Question),
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub is_correct: bool,
    pub correct_answer: String,
    pub feedback: String,
    pub score: u32,
    pub combo: u32,
    pub points_earned: Option<u32>,
    pub next: NextStep,
}

impl AnswerResult {
    pub fn is_game_over(&self) -> bool {
        matches!(self.next, NextStep::GameOver)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStart {
    pub total_questions: u32,
    pub question: Question,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankTitle {
    KeepTrying,
    Rookie,
    Regular,
    Expert,
    GrandMaster,
}

impl RankTitle {
    pub fn for_score(score: u32) -> Self {
        match score {
            4500.. => RankTitle::GrandMaster,
            3000.. => RankTitle::Expert,
            1500.. => RankTitle::Regular,
            1.. => RankTitle::Rookie,
            0 => RankTitle::KeepTrying,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankTitle::KeepTrying => "Keep Trying!",
            RankTitle::Rookie => "Metro Rookie",
            RankTitle::Regular => "Metro Regular",
            RankTitle::Expert => "Metro Expert",
            RankTitle::GrandMaster => "Metro Grand Master!",
        }
    }
}
