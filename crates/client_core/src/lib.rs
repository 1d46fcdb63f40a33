//! Client side of the metro quiz: session controller, countdown and the remote game service.

pub mod controller;
pub mod countdown;
pub mod service;
pub mod session;
pub mod surface;

pub use controller::{ControllerHandle, SessionController, SessionTimings, UserAction};
pub use countdown::{Countdown, CountdownTick, TimerBand};
pub use service::{GameService, HttpGameService, MissingGameService, ServiceError};
pub use session::{QuestionPhase, Session};
pub use surface::{AudioCue, EndSummary, Feedback, ModalState, PresentationSurface, Screen};
