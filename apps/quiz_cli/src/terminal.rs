//! Line-oriented terminal rendering and stdin command parsing.

use std::{
    fmt::Display,
    io::{self, BufRead, Write},
    thread,
};

use client_core::{
    ControllerHandle, CountdownTick, EndSummary, Feedback, ModalState, PresentationSurface,
    Screen, TimerBand, UserAction,
};
use shared::domain::{LeaderboardEntry, Question, WrongAnswer};
use tracing::{debug, warn};

pub struct TerminalSurface<W: Write + Send> {
    out: W,
    last_second: Option<u64>,
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_second: None,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl Display) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            warn!(%err, "failed to write to terminal");
        }
    }
}

impl<W: Write + Send> PresentationSurface for TerminalSurface<W> {
    fn switch_screen(&mut self, screen: Screen) {
        match screen {
            Screen::Start => {
                self.line("=== MRT Trivia ===");
                self.line("[s] start  [l] leaderboard  [q] quit");
            }
            Screen::Game => self.line("--- game on ---"),
            Screen::End => self.line("[s] play again  [w] review mistakes  [l] leaderboard  [q] quit"),
        }
    }

    fn render_question(&mut self, number: u32, total: u32, question: &Question) {
        self.last_second = None;
        self.line(format_args!("\nQuestion {number} / {total}: {}", question.text));
        for (index, option) in question.options.iter().enumerate() {
            self.line(format_args!("  {}) {option}", index + 1));
        }
    }

    fn lock_options(&mut self) {
        self.last_second = None;
        self.line("  answer locked in...");
    }

    fn clear_feedback(&mut self) {}

    fn render_feedback(&mut self, feedback: &Feedback) {
        let mark = if feedback.is_correct { "O" } else { "X" };
        self.line(format_args!("  [{mark}] {}", feedback.message));
        if let Some(correct) = feedback.highlight_correct() {
            self.line(format_args!("  correct answer: {correct}"));
        }
    }

    fn render_score(&mut self, score: u32) {
        self.line(format_args!("  score: {score}"));
    }

    fn render_combo(&mut self, combo: u32) {
        if combo > 1 {
            self.line(format_args!("  combo x{combo}!"));
        }
    }

    fn render_timer(&mut self, tick: &CountdownTick) {
        // One line per whole second keeps the scrollback readable.
        let remaining = tick.remaining();
        let second = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        if self.last_second == Some(second) {
            return;
        }
        self.last_second = Some(second);

        let filled = (tick.fraction_remaining() * 20.0).round() as usize;
        let band = match tick.band() {
            TimerBand::Calm => "",
            TimerBand::Warning => " hurry",
            TimerBand::Danger => " !!",
        };
        self.line(format_args!(
            "  [{:<20}] {second}s{band}",
            "#".repeat(filled.min(20))
        ));
    }

    fn render_error(&mut self, message: &str) {
        self.line(format_args!("  connection error, please try again later ({message})"));
        self.line("  [r] back to the start screen  [s] start a new game");
    }

    fn clear_error(&mut self) {}

    fn render_end(&mut self, summary: &EndSummary) {
        self.line(format_args!(
            "\n=== Game over: {} points - {} ===",
            summary.final_score,
            summary.title.label()
        ));
    }

    fn render_wrong_answers(&mut self, state: &ModalState<WrongAnswer>) {
        match state {
            ModalState::Loading => self.line("loading your mistakes..."),
            ModalState::Unavailable(_) => self.line("unable to load your mistakes, try again later"),
            ModalState::Loaded(items) if items.is_empty() => {
                self.line("no wrong answers, well done!")
            }
            ModalState::Loaded(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.line(format_args!("{}. {}", index + 1, item.question));
                    self.line(format_args!("   answer: {}", item.correct_answer));
                    self.line(format_args!(
                        "   why: {}",
                        item.explanation.as_deref().unwrap_or("no explanation yet")
                    ));
                }
            }
        }
    }

    fn render_leaderboard(&mut self, state: &ModalState<LeaderboardEntry>) {
        match state {
            ModalState::Loading => self.line("loading leaderboard..."),
            ModalState::Unavailable(_) => self.line("unable to load the leaderboard, try again later"),
            ModalState::Loaded(entries) if entries.is_empty() => {
                self.line("nobody on the board yet, be the first!")
            }
            ModalState::Loaded(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    self.line(format_args!("{:>3}. {:<20} {}", index + 1, entry.name, entry.score));
                }
            }
        }
    }

    fn show_points(&mut self, points: u32) {
        self.line(format_args!("  +{points}"));
    }
}

/// Bare numbers become [`UserAction::SelectIndex`]; the controller also matches them against
/// numeric option text.
pub fn parse_command(line: &str) -> Option<UserAction> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(position) = trimmed.parse::<usize>() {
        return Some(UserAction::SelectIndex(position));
    }
    let action = match trimmed.to_ascii_lowercase().as_str() {
        "s" | "start" => UserAction::Start,
        "w" | "review" => UserAction::OpenReview,
        "l" | "leaderboard" => UserAction::OpenLeaderboard,
        "r" | "restart" => UserAction::Restart,
        "q" | "quit" | "exit" => UserAction::Quit,
        _ => UserAction::SelectOption(trimmed.to_string()),
    };
    Some(action)
}

/// Forwards stdin lines to the controller from a detached thread; end of input quits.
pub fn spawn_input_reader(handle: ControllerHandle) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(%err, "failed to read from stdin");
                    break;
                }
            };
            let Some(action) = parse_command(&line) else {
                continue;
            };
            debug!(?action, "user action");
            let quitting = action == UserAction::Quit;
            if !handle.send(action) || quitting {
                return;
            }
        }
        handle.send(UserAction::Quit);
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use shared::domain::RankTitle;

    fn rendered(surface: TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.into_inner()).expect("utf8")
    }

    #[test]
    fn parses_commands_and_option_numbers() {
        assert_eq!(parse_command(" 2 "), Some(UserAction::SelectIndex(2)));
        assert_eq!(parse_command("S"), Some(UserAction::Start));
        assert_eq!(parse_command("review"), Some(UserAction::OpenReview));
        assert_eq!(parse_command("l"), Some(UserAction::OpenLeaderboard));
        assert_eq!(parse_command("r"), Some(UserAction::Restart));
        assert_eq!(parse_command("exit"), Some(UserAction::Quit));
        assert_eq!(
            parse_command("Tamsui"),
            Some(UserAction::SelectOption("Tamsui".to_string()))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn renders_numbered_options() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.render_question(3, 10, &Question::new("Which line is red?", ["Tamsui-Xinyi", "Bannan"]));
        let text = rendered(surface);
        assert!(text.contains("Question 3 / 10: Which line is red?"));
        assert!(text.contains("  1) Tamsui-Xinyi"));
        assert!(text.contains("  2) Bannan"));
    }

    #[test]
    fn wrong_answer_shows_the_correct_option() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.render_feedback(&Feedback {
            is_correct: false,
            message: "Not quite".to_string(),
            selected: Some("B".to_string()),
            correct_answer: "A".to_string(),
        });
        let text = rendered(surface);
        assert!(text.contains("[X] Not quite"));
        assert!(text.contains("correct answer: A"));
    }

    #[test]
    fn timer_prints_once_per_second() {
        let mut surface = TerminalSurface::new(Vec::new());
        for remaining_ticks in (0..=100).rev() {
            surface.render_timer(&CountdownTick {
                remaining_ticks,
                total_ticks: 100,
                interval: Duration::from_millis(100),
            });
        }
        let text = rendered(surface);
        assert_eq!(text.lines().count(), 11);
        assert!(text.contains("10s"));
        assert!(text.contains("0s !!"));
    }

    #[test]
    fn end_screen_names_the_rank() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.render_end(&EndSummary::for_score(3200));
        let text = rendered(surface);
        assert!(text.contains("3200 points"));
        assert!(text.contains(RankTitle::Expert.label()));
    }

    #[test]
    fn empty_review_is_celebrated() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.render_wrong_answers(&ModalState::Loaded(Vec::new()));
        assert!(rendered(surface).contains("no wrong answers"));
    }

    #[test]
    fn combo_is_flagged_only_on_a_streak() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.render_combo(1);
        assert!(rendered(surface).is_empty());

        let mut surface = TerminalSurface::new(Vec::new());
        surface.render_combo(3);
        assert_eq!(rendered(surface), "  combo x3!\n");
    }

    #[test]
    fn errors_point_at_the_recovery_commands() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.render_error("HTTP error! status: 500, message: boom");
        let text = rendered(surface);
        assert!(text.contains("status: 500"));
        assert!(text.contains("[r] back to the start screen"));
        assert!(text.contains("[s] start a new game"));
        assert_eq!(parse_command("r"), Some(UserAction::Restart));
        assert_eq!(parse_command("s"), Some(UserAction::Start));
    }

    #[test]
    fn numbers_stay_positions_for_the_controller_to_resolve() {
        assert_eq!(parse_command("1997"), Some(UserAction::SelectIndex(1997)));
    }
}
