//! Session controller: owns the live session and sequences each question's lifecycle.
//!
//! Every state change happens on the task that drives [`SessionController::run`] (or
//! [`SessionController::step`]). Countdown ticks, countdown expiry and the fixed display
//! delays come back through the same event queue as user actions and carry a token
//! (countdown generation, session epoch, question number); events whose token no longer
//! matches the live state are dropped.

use std::{sync::Arc, time::Duration};

use shared::domain::{GameMode, NextStep, Question};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::{
    countdown::{Countdown, CountdownTick},
    service::{GameService, ServiceError},
    session::{QuestionPhase, Session},
    surface::{AudioCue, EndSummary, Feedback, ModalState, PresentationSurface, Screen},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub question_duration: Duration,
    pub tick_interval: Duration,
    pub feedback_delay: Duration,
    pub error_return_delay: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            question_duration: Duration::from_secs(10),
            tick_interval: Duration::from_millis(100),
            feedback_delay: Duration::from_secs(2),
            error_return_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Start,
    SelectOption(String),
    /// 1-based position in the current question's options, or the text of a numeric option
    /// when no option sits at that position.
    SelectIndex(usize),
    OpenReview,
    OpenLeaderboard,
    Restart,
    Quit,
}

#[derive(Debug, Clone)]
enum ControllerEvent {
    User(UserAction),
    CountdownTick { generation: u64, tick: CountdownTick },
    CountdownExpired { generation: u64 },
    FeedbackElapsed { epoch: u64, question_number: u32 },
    ErrorReturnElapsed { epoch: u64 },
}

#[derive(Clone)]
pub struct ControllerHandle {
    tx: UnboundedSender<ControllerEvent>,
}

impl ControllerHandle {
    /// Queues a user action. Returns false once the controller is gone.
    pub fn send(&self, action: UserAction) -> bool {
        self.tx.send(ControllerEvent::User(action)).is_ok()
    }
}

pub struct SessionController<P: PresentationSurface> {
    service: Arc<dyn GameService>,
    surface: P,
    mode: GameMode,
    timings: SessionTimings,
    session: Option<Session>,
    epoch: u64,
    countdown: Countdown,
    events_tx: UnboundedSender<ControllerEvent>,
    events_rx: UnboundedReceiver<ControllerEvent>,
}

impl<P: PresentationSurface> SessionController<P> {
    pub fn new(
        service: Arc<dyn GameService>,
        surface: P,
        mode: GameMode,
        timings: SessionTimings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            service,
            surface,
            mode,
            timings,
            session: None,
            epoch: 0,
            countdown: Countdown::new(),
            events_tx,
            events_rx,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.events_tx.clone(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub async fn run(&mut self) {
        info!(mode = %self.mode, "session controller running");
        while self.step().await {}
        self.countdown.stop();
        info!("session controller stopped");
    }

    /// Waits for the next queued event and handles it. Returns false after `Quit`.
    pub async fn step(&mut self) -> bool {
        let Some(event) = self.events_rx.recv().await else {
            return false;
        };
        self.dispatch(event).await
    }

    async fn dispatch(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::User(action) => return self.handle_action(action).await,
            ControllerEvent::CountdownTick { generation, tick } => {
                if self.countdown.is_current(generation) {
                    self.surface.render_timer(&tick);
                }
            }
            ControllerEvent::CountdownExpired { generation } => {
                if self.countdown.is_current(generation) {
                    self.on_timeout().await;
                } else {
                    debug!(generation, "dropping stale countdown expiry");
                }
            }
            ControllerEvent::FeedbackElapsed {
                epoch,
                question_number,
            } => self.finish_question(epoch, question_number),
            ControllerEvent::ErrorReturnElapsed { epoch } => {
                if epoch == self.epoch && self.session.is_none() {
                    self.surface.clear_error();
                    self.surface.switch_screen(Screen::Start);
                }
            }
        }
        true
    }

    async fn handle_action(&mut self, action: UserAction) -> bool {
        match action {
            UserAction::Start => self.start().await,
            UserAction::SelectOption(option) => {
                let known = self
                    .session
                    .as_ref()
                    .is_some_and(|session| session.current_question.has_option(&option));
                if known {
                    self.submit_answer(Some(option)).await;
                } else {
                    warn!(%option, "ignoring selection that is not an option of the current question");
                }
            }
            UserAction::SelectIndex(position) => {
                // Positions past the last option fall back to an option spelled as that number.
                let option = self.session.as_ref().and_then(|session| {
                    let question = &session.current_question;
                    match question.option_at(position) {
                        Some(option) => Some(option.to_string()),
                        None => {
                            let spelled = position.to_string();
                            question.has_option(&spelled).then_some(spelled)
                        }
                    }
                });
                match option {
                    Some(option) => self.submit_answer(Some(option)).await,
                    None => warn!(position, "ignoring selection outside the current options"),
                }
            }
            UserAction::OpenReview => self.show_review().await,
            UserAction::OpenLeaderboard => self.show_leaderboard().await,
            UserAction::Restart => self.restart(),
            UserAction::Quit => {
                self.countdown.stop();
                return false;
            }
        }
        true
    }

    /// Replaces any live session with a fresh one from the service.
    pub async fn start(&mut self) {
        self.countdown.stop();
        self.session = None;
        self.epoch += 1;
        let epoch = self.epoch;
        info!(mode = %self.mode, epoch, "starting quiz session");

        match self.service.start_session(self.mode).await {
            Ok(start) => {
                let session = Session::begin(start);
                info!(
                    total_questions = session.total_questions,
                    "quiz session started"
                );
                self.surface.clear_error();
                self.surface.render_score(session.score);
                self.surface.render_combo(session.combo);
                self.surface.switch_screen(Screen::Game);
                self.surface.clear_feedback();
                self.surface.render_question(
                    session.current_question_number,
                    session.total_questions,
                    &session.current_question,
                );
                self.surface.play_cue(AudioCue::GameStart);
                self.session = Some(session);
                self.start_countdown();
            }
            Err(err) => {
                error!(%err, "failed to start quiz session");
                self.surface.render_error(&err.to_string());
                self.schedule(
                    self.timings.error_return_delay,
                    ControllerEvent::ErrorReturnElapsed { epoch },
                );
            }
        }
    }

    /// Sends `selection` (or the no-answer sentinel) for the current question.
    /// Ignored while another answer for it is in flight or on screen.
    pub async fn submit_answer(&mut self, selection: Option<String>) {
        let Some(session) = self.session.as_mut() else {
            debug!("ignoring answer without an active session");
            return;
        };
        let question_number = session.current_question_number;
        if !session.lock(selection.clone()) {
            debug!(question = question_number, "answer already underway; ignoring");
            return;
        }

        self.countdown.stop();
        self.surface.lock_options();
        info!(
            question = question_number,
            answered = selection.is_some(),
            "submitting answer"
        );

        let result = match self.service.submit_answer(selection.as_deref()).await {
            Ok(result) => result,
            Err(err) => {
                self.fail_submission(question_number, err);
                return;
            }
        };

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(violation) = session.check_result(&result) {
            self.fail_submission(question_number, violation.into());
            return;
        }

        let gained = session.resolve(&result);
        let points = result.points_earned.unwrap_or(gained);
        let (score, combo) = (session.score, session.combo);
        // A timed-out question never counts as correct, whatever the service reports.
        let is_correct = result.is_correct && selection.is_some();
        info!(
            question = question_number,
            correct = is_correct,
            score,
            combo,
            game_over = result.is_game_over(),
            "answer resolved"
        );

        if points > 0 {
            self.surface.show_points(points);
        }
        self.surface.render_score(score);
        self.surface.render_combo(combo);
        self.surface.render_feedback(&Feedback {
            is_correct,
            message: result.feedback,
            selected: selection,
            correct_answer: result.correct_answer,
        });
        self.surface.play_cue(if is_correct {
            AudioCue::Correct
        } else {
            AudioCue::Incorrect
        });

        self.schedule(
            self.timings.feedback_delay,
            ControllerEvent::FeedbackElapsed {
                epoch: self.epoch,
                question_number,
            },
        );
    }

    pub async fn on_timeout(&mut self) {
        info!("countdown expired; submitting no answer");
        self.submit_answer(None).await;
    }

    /// Drops the live session and returns to the start screen.
    pub fn restart(&mut self) {
        self.countdown.stop();
        self.epoch += 1;
        self.session = None;
        self.surface.clear_error();
        self.surface.clear_feedback();
        self.surface.switch_screen(Screen::Start);
    }

    pub async fn show_review(&mut self) {
        self.surface.render_wrong_answers(&ModalState::Loading);
        let state = match self.service.wrong_answers().await {
            Ok(items) => ModalState::Loaded(items),
            Err(err) => {
                warn!(%err, "failed to load wrong answers");
                ModalState::Unavailable(err.to_string())
            }
        };
        self.surface.render_wrong_answers(&state);
    }

    pub async fn show_leaderboard(&mut self) {
        self.surface.render_leaderboard(&ModalState::Loading);
        let state = match self.service.leaderboard().await {
            Ok(entries) => ModalState::Loaded(entries),
            Err(err) => {
                warn!(%err, "failed to load leaderboard");
                ModalState::Unavailable(err.to_string())
            }
        };
        self.surface.render_leaderboard(&state);
    }

    fn fail_submission(&mut self, question_number: u32, err: ServiceError) {
        // No recovery path: the question stays locked until restart.
        error!(question = question_number, %err, "answer submission failed");
        self.surface.render_error(&err.to_string());
    }

    fn finish_question(&mut self, epoch: u64, question_number: u32) {
        if epoch != self.epoch {
            debug!(epoch, "dropping feedback delay from a previous session");
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.current_question_number != question_number {
            return;
        }
        let QuestionPhase::Resolved { next } = &session.phase else {
            return;
        };

        match next.clone() {
            NextStep::Continue(question) => self.advance(question),
            NextStep::GameOver => self.end_session(),
        }
    }

    fn advance(&mut self, next: Question) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.advance(next);
        debug!(question = session.current_question_number, "advancing");

        self.surface.clear_error();
        self.surface.clear_feedback();
        self.surface.render_question(
            session.current_question_number,
            session.total_questions,
            &session.current_question,
        );
        self.start_countdown();
    }

    fn end_session(&mut self) {
        self.countdown.stop();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.end();
        let summary = EndSummary::for_score(session.score);
        info!(
            score = summary.final_score,
            title = summary.title.label(),
            "quiz session ended"
        );

        self.surface.render_end(&summary);
        self.surface.switch_screen(Screen::End);
        self.surface.play_cue(AudioCue::GameOver);
    }

    fn start_countdown(&mut self) {
        let SessionTimings {
            question_duration,
            tick_interval,
            ..
        } = self.timings;
        self.surface
            .render_timer(&CountdownTick::full(question_duration, tick_interval));

        let generation = self.countdown.next_generation();
        let tick_tx = self.events_tx.clone();
        let expire_tx = self.events_tx.clone();
        self.countdown.start(
            question_duration,
            tick_interval,
            move |tick| {
                let _ = tick_tx.send(ControllerEvent::CountdownTick { generation, tick });
            },
            move || {
                let _ = expire_tx.send(ControllerEvent::CountdownExpired { generation });
            },
        );
    }

    fn schedule(&self, delay: Duration, event: ControllerEvent) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
