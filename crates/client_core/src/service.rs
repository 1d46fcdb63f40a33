//! Remote game service seam and its HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AnswerResult, GameMode, LeaderboardEntry, SessionStart, WrongAnswer},
    error::{ApiErrorBody, ProtocolViolation},
    protocol::{
        leaderboard_route, start_game_route, submit_answer_route, wrong_answers_route,
        StartGameRequest, StartGameResponse, SubmitAnswerRequest, SubmitAnswerResponse,
    },
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("HTTP error! status: {status}, message: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("unexpected response: {0}")]
    Protocol(#[from] ProtocolViolation),
    #[error("game service is unavailable")]
    Unavailable,
}

impl From<reqwest::Error> for ServiceError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ServiceError::Decode(value.to_string())
        } else {
            ServiceError::Transport(value.to_string())
        }
    }
}

#[async_trait]
pub trait GameService: Send + Sync {
    async fn start_session(&self, mode: GameMode) -> Result<SessionStart, ServiceError>;
    /// `None` is the no-answer sentinel used when the countdown runs out.
    async fn submit_answer(&self, answer: Option<&str>) -> Result<AnswerResult, ServiceError>;
    async fn wrong_answers(&self) -> Result<Vec<WrongAnswer>, ServiceError>;
    /// Entries in the order the service ranked them.
    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError>;
}

pub struct MissingGameService;

#[async_trait]
impl GameService for MissingGameService {
    async fn start_session(&self, _mode: GameMode) -> Result<SessionStart, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn submit_answer(&self, _answer: Option<&str>) -> Result<AnswerResult, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn wrong_answers(&self) -> Result<Vec<WrongAnswer>, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}

pub struct HttpGameService {
    http: Client,
    server_url: String,
}

impl HttpGameService {
    /// Builds a client with a cookie store; the service keys game state off its session cookie.
    pub fn new(server_url: impl Into<String>) -> Result<Self, ServiceError> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self::with_client(http, server_url))
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.server_url)
    }
}

async fn decode<T: DeserializeOwned>(route: &str, response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        let message = ApiErrorBody::message_from_bytes(&body);
        warn!(route, status = status.as_u16(), %message, "game service rejected request");
        return Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl GameService for HttpGameService {
    async fn start_session(&self, mode: GameMode) -> Result<SessionStart, ServiceError> {
        let route = start_game_route();
        debug!(%mode, "starting game session");
        let response = self
            .http
            .post(self.url(route))
            .json(&StartGameRequest { mode })
            .send()
            .await?;
        let body: StartGameResponse = decode(route, response).await?;
        Ok(SessionStart::try_from(body)?)
    }

    async fn submit_answer(&self, answer: Option<&str>) -> Result<AnswerResult, ServiceError> {
        let route = submit_answer_route();
        let response = self
            .http
            .post(self.url(route))
            .json(&SubmitAnswerRequest {
                answer: answer.map(str::to_string),
            })
            .send()
            .await?;
        let body: SubmitAnswerResponse = decode(route, response).await?;
        Ok(AnswerResult::try_from(body)?)
    }

    async fn wrong_answers(&self) -> Result<Vec<WrongAnswer>, ServiceError> {
        let route = wrong_answers_route();
        let response = self.http.get(self.url(route)).send().await?;
        decode(route, response).await
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let route = leaderboard_route();
        let response = self.http.get(self.url(route)).send().await?;
        decode(route, response).await
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
