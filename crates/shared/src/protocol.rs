use serde::{Deserialize, Serialize};

use crate::{
    domain::{AnswerResult, GameMode, NextStep, Question, SessionStart},
    error::ProtocolViolation,
};

pub fn start_game_route() -> &'static str {
    "/api/start_game"
}

pub fn submit_answer_route() -> &'static str {
    "/api/submit_answer"
}

pub fn wrong_answers_route() -> &'static str {
    "/api/get_wrong_answers"
}

pub fn leaderboard_route() -> &'static str {
    "/api/get_leaderboard"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub mode: GameMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGameResponse {
    pub total_questions: u32,
    pub question: Question,
}

impl TryFrom<StartGameResponse> for SessionStart {
    type Error = ProtocolViolation;

    fn try_from(value: StartGameResponse) -> Result<Self, Self::Error> {
        if value.total_questions == 0 {
            return Err(ProtocolViolation::NoQuestions);
        }
        value.question.validate()?;
        Ok(SessionStart {
            total_questions: value.total_questions,
            question: value.question,
        })
    }
}

/// `answer: null` is the no-answer sentinel sent on timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub feedback: String,
    pub score: u32,
    #[serde(default)]
    pub combo: u32,
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_question: Option<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_earned: Option<u32>,
}

impl TryFrom<SubmitAnswerResponse> for AnswerResult {
    type Error = ProtocolViolation;

    fn try_from(value: SubmitAnswerResponse) -> Result<Self, Self::Error> {
        let next = if value.game_over {
            NextStep::GameOver
        } else {
            let question = value
                .next_question
                .ok_or(ProtocolViolation::MissingNextQuestion)?;
            question.validate()?;
            NextStep::Continue(question)
        };

        Ok(AnswerResult {
            is_correct: value.is_correct,
            correct_answer: value.correct_answer,
            feedback: value.feedback,
            score: value.score,
            combo: value.combo,
            points_earned: value.points_earned,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RankTitle;
    use crate::error::{ApiErrorBody, DEFAULT_ERROR_MESSAGE};

    #[test]
    fn timeout_submission_serializes_null_answer() {
        let body = serde_json::to_value(SubmitAnswerRequest { answer: None }).expect("json");
        assert_eq!(body, serde_json::json!({ "answer": null }));
    }

    #[test]
    fn start_request_uses_snake_case_mode() {
        let body = serde_json::to_value(StartGameRequest {
            mode: GameMode::TimeAttack,
        })
        .expect("json");
        assert_eq!(body, serde_json::json!({ "mode": "time_attack" }));
    }

    #[test]
    fn start_response_ignores_extra_question_fields() {
        let raw = serde_json::json!({
            "total_questions": 10,
            "question": {
                "id": 4,
                "text": "Which line is brown?",
                "difficulty": "easy",
                "options": ["Wenhu", "Bannan"],
                "correct_option": "Wenhu",
                "explanation": null
            }
        });
        let parsed: StartGameResponse = serde_json::from_value(raw).expect("parse");
        let start = SessionStart::try_from(parsed).expect("valid start");
        assert_eq!(start.total_questions, 10);
        assert_eq!(start.question.options, vec!["Wenhu", "Bannan"]);
    }

    #[test]
    fn start_response_rejects_empty_session() {
        let parsed = StartGameResponse {
            total_questions: 0,
            question: Question::new("Q1", ["A"]),
        };
        assert_eq!(
            SessionStart::try_from(parsed),
            Err(ProtocolViolation::NoQuestions)
        );
    }

    #[test]
    fn truncated_game_over_response_still_parses() {
        let parsed: SubmitAnswerResponse =
            serde_json::from_value(serde_json::json!({ "game_over": true, "score": 350 }))
                .expect("parse");
        let result = AnswerResult::try_from(parsed).expect("result");
        assert!(result.is_game_over());
        assert!(!result.is_correct);
        assert_eq!(result.score, 350);
    }

    #[test]
    fn continuing_response_requires_next_question() {
        let parsed: SubmitAnswerResponse = serde_json::from_value(serde_json::json!({
            "is_correct": true,
            "correct_answer": "A",
            "feedback": "Correct!",
            "score": 100,
            "combo": 1,
            "game_over": false,
            "next_question": null
        }))
        .expect("parse");
        assert_eq!(
            AnswerResult::try_from(parsed),
            Err(ProtocolViolation::MissingNextQuestion)
        );
    }

    #[test]
    fn duplicate_options_are_rejected() {
        let question = Question::new("Q", ["A", "B", "A"]);
        assert_eq!(
            question.validate(),
            Err(ProtocolViolation::DuplicateOption("A".to_string()))
        );
    }

    #[test]
    fn option_lookup_is_one_based() {
        let question = Question::new("Q", ["A", "B"]);
        assert_eq!(question.option_at(1), Some("A"));
        assert_eq!(question.option_at(2), Some("B"));
        assert_eq!(question.option_at(0), None);
        assert_eq!(question.option_at(3), None);
    }

    #[test]
    fn error_body_falls_back_to_default_message() {
        assert_eq!(
            ApiErrorBody::message_from_bytes(br#"{"error":"not enough questions"}"#),
            "not enough questions"
        );
        assert_eq!(
            ApiErrorBody::message_from_bytes(b"<html>502</html>"),
            DEFAULT_ERROR_MESSAGE
        );
    }

    #[test]
    fn rank_title_thresholds() {
        assert_eq!(RankTitle::for_score(0), RankTitle::KeepTrying);
        assert_eq!(RankTitle::for_score(1), RankTitle::Rookie);
        assert_eq!(RankTitle::for_score(1499), RankTitle::Rookie);
        assert_eq!(RankTitle::for_score(1500), RankTitle::Regular);
        assert_eq!(RankTitle::for_score(3000), RankTitle::Expert);
        assert_eq!(RankTitle::for_score(4500), RankTitle::GrandMaster);
    }

    #[test]
    fn game_mode_parses_from_config_strings() {
        assert_eq!("normal".parse::<GameMode>(), Ok(GameMode::Normal));
        assert_eq!("time-attack".parse::<GameMode>(), Ok(GameMode::TimeAttack));
        assert!("blitz".parse::<GameMode>().is_err());
    }
}
