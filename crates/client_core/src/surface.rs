use shared::domain::{LeaderboardEntry, Question, RankTitle, WrongAnswer};

use crate::countdown::CountdownTick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    Game,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub is_correct: bool,
    pub message: String,
    /// `None` when the countdown ran out.
    pub selected: Option<String>,
    pub correct_answer: String,
}

impl Feedback {
    /// The option to mark as correct in addition to the player's own pick.
    pub fn highlight_correct(&self) -> Option<&str> {
        if self.is_correct {
            None
        } else {
            Some(&self.correct_answer)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState<T> {
    Loading,
    Loaded(Vec<T>),
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    GameStart,
    Correct,
    Incorrect,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndSummary {
    pub final_score: u32,
    pub title: RankTitle,
}

impl EndSummary {
    pub fn for_score(final_score: u32) -> Self {
        Self {
            final_score,
            title: RankTitle::for_score(final_score),
        }
    }
}

/// Render target for the session controller. Implementations hold no game logic.
///
/// The provided methods are optional extras; a surface without popups or sound keeps the
/// default no-ops.
pub trait PresentationSurface: Send {
    fn switch_screen(&mut self, screen: Screen);
    fn render_question(&mut self, number: u32, total: u32, question: &Question);
    fn lock_options(&mut self);
    fn clear_feedback(&mut self);
    fn render_feedback(&mut self, feedback: &Feedback);
    fn render_score(&mut self, score: u32);
    fn render_combo(&mut self, combo: u32);
    fn render_timer(&mut self, tick: &CountdownTick);
    fn render_error(&mut self, message: &str);
    fn clear_error(&mut self);
    fn render_end(&mut self, summary: &EndSummary);
    fn render_wrong_answers(&mut self, state: &ModalState<WrongAnswer>);
    fn render_leaderboard(&mut self, state: &ModalState<LeaderboardEntry>);

    fn show_points(&mut self, _points: u32) {}

    fn play_cue(&mut self, _cue: AudioCue) {}
}
