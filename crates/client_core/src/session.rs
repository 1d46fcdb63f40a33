use shared::{
    domain::{AnswerResult, NextStep, Question, SessionStart},
    error::ProtocolViolation,
};

/// Where the current question sits in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionPhase {
    Displayed,
    Locked { selected: Option<String> },
    Resolved { next: NextStep },
    Ended,
}

/// The single live play-through. Score and combo only ever hold values reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub total_questions: u32,
    pub current_question_number: u32,
    pub score: u32,
    pub combo: u32,
    pub current_question: Question,
    pub phase: QuestionPhase,
}

impl Session {
    pub fn begin(start: SessionStart) -> Self {
        Self {
            total_questions: start.total_questions,
            current_question_number: 1,
            score: 0,
            combo: 0,
            current_question: start.question,
            phase: QuestionPhase::Displayed,
        }
    }

    /// True while a submission for the current question is in flight or its feedback is on screen.
    pub fn is_awaiting_answer(&self) -> bool {
        matches!(
            self.phase,
            QuestionPhase::Locked { .. } | QuestionPhase::Resolved { .. }
        )
    }

    pub fn is_ended(&self) -> bool {
        self.phase == QuestionPhase::Ended
    }

    /// Moves `Displayed -> Locked`. Returns false when an answer is already underway.
    pub fn lock(&mut self, selected: Option<String>) -> bool {
        if self.phase != QuestionPhase::Displayed {
            return false;
        }
        self.phase = QuestionPhase::Locked { selected };
        true
    }

    pub fn check_result(&self, result: &AnswerResult) -> Result<(), ProtocolViolation> {
        if matches!(result.next, NextStep::Continue(_))
            && self.current_question_number >= self.total_questions
        {
            return Err(ProtocolViolation::QuestionOutOfRange {
                number: self.current_question_number + 1,
                total: self.total_questions,
            });
        }
        Ok(())
    }

    /// Merges the authoritative score and combo and moves `Locked -> Resolved`.
    /// Returns the points gained since the previous result.
    pub fn resolve(&mut self, result: &AnswerResult) -> u32 {
        let gained = result.score.saturating_sub(self.score);
        self.score = result.score;
        self.combo = result.combo;
        self.phase = QuestionPhase::Resolved {
            next: result.next.clone(),
        };
        gained
    }

    pub fn advance(&mut self, next: Question) {
        self.current_question_number += 1;
        self.current_question = next;
        self.phase = QuestionPhase::Displayed;
    }

    pub fn end(&mut self) {
        self.phase = QuestionPhase::Ended;
    }
}
