use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use client_core::SessionTimings;
use serde::Deserialize;
use shared::domain::GameMode;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub mode: GameMode,
    pub question_seconds: u64,
    pub tick_millis: u64,
    pub feedback_millis: u64,
    pub error_return_millis: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            mode: GameMode::Normal,
            question_seconds: 10,
            tick_millis: 100,
            feedback_millis: 2_000,
            error_return_millis: 3_000,
        }
    }
}

impl Settings {
    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            question_duration: Duration::from_secs(self.question_seconds.max(1)),
            tick_interval: Duration::from_millis(self.tick_millis.max(1)),
            feedback_delay: Duration::from_millis(self.feedback_millis),
            error_return_delay: Duration::from_millis(self.error_return_millis),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    mode: Option<GameMode>,
    question_seconds: Option<u64>,
    tick_millis: Option<u64>,
    feedback_millis: Option<u64>,
    error_return_millis: Option<u64>,
}

/// Defaults, then `quiz.toml` in the working directory, then environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new("quiz.toml"));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => apply_file_settings(settings, file_cfg),
        Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable settings file"),
    }
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.mode {
        settings.mode = v;
    }
    if let Some(v) = file_cfg.question_seconds {
        settings.question_seconds = v;
    }
    if let Some(v) = file_cfg.tick_millis {
        settings.tick_millis = v;
    }
    if let Some(v) = file_cfg.feedback_millis {
        settings.feedback_millis = v;
    }
    if let Some(v) = file_cfg.error_return_millis {
        settings.error_return_millis = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("QUIZ_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("APP__GAME_MODE") {
        match v.parse() {
            Ok(mode) => settings.mode = mode,
            Err(err) => warn!(%err, "ignoring APP__GAME_MODE"),
        }
    }

    let numeric = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
    if let Some(v) = numeric("APP__QUESTION_SECONDS") {
        settings.question_seconds = v;
    }
    if let Some(v) = numeric("APP__TICK_MILLIS") {
        settings.tick_millis = v;
    }
    if let Some(v) = numeric("APP__FEEDBACK_MILLIS") {
        settings.feedback_millis = v;
    }
    if let Some(v) = numeric("APP__ERROR_RETURN_MILLIS") {
        settings.error_return_millis = v;
    }
}

/// Accepts http(s) URLs only and strips any trailing slash.
pub fn validate_server_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("invalid server url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!(
            "server url '{raw}' must use http or https, not '{}'",
            url.scheme()
        ));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_game_timings() {
        let timings = Settings::default().timings();
        assert_eq!(timings, SessionTimings::default());
    }

    #[test]
    fn file_settings_override_defaults() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let temp_root = env::temp_dir().join(format!("quiz_cli_config_test_{suffix}"));
        fs::create_dir_all(&temp_root).expect("temp root");
        let path = temp_root.join("quiz.toml");
        fs::write(
            &path,
            "server_url = \"http://quiz.local:8080\"\nmode = \"time_attack\"\nquestion_seconds = 15\n",
        )
        .expect("write settings");

        let mut settings = Settings::default();
        apply_file(&mut settings, &path);

        assert_eq!(settings.server_url, "http://quiz.local:8080");
        assert_eq!(settings.mode, GameMode::TimeAttack);
        assert_eq!(settings.question_seconds, 15);
        assert_eq!(settings.tick_millis, 100);

        fs::remove_dir_all(temp_root).expect("cleanup");
    }

    #[test]
    fn missing_or_malformed_file_keeps_defaults() {
        let mut settings = Settings::default();
        apply_file(&mut settings, Path::new("/nonexistent/quiz.toml"));
        assert_eq!(settings, Settings::default());

        apply_file_settings(&mut settings, FileSettings::default());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn env_overrides_take_precedence_and_skip_garbage() {
        let mut settings = Settings::default();
        apply_env(
            &mut settings,
            lookup_from(&[
                ("QUIZ_SERVER_URL", "http://first:1"),
                ("APP__SERVER_URL", "http://second:2"),
                ("APP__GAME_MODE", "time_attack"),
                ("APP__QUESTION_SECONDS", "not-a-number"),
                ("APP__FEEDBACK_MILLIS", " 500 "),
            ]),
        );

        assert_eq!(settings.server_url, "http://second:2");
        assert_eq!(settings.mode, GameMode::TimeAttack);
        assert_eq!(settings.question_seconds, 10);
        assert_eq!(settings.feedback_millis, 500);
    }

    #[test]
    fn unknown_mode_in_env_is_ignored() {
        let mut settings = Settings::default();
        apply_env(&mut settings, lookup_from(&[("APP__GAME_MODE", "blitz")]));
        assert_eq!(settings.mode, GameMode::Normal);
    }

    #[test]
    fn zero_durations_are_clamped_for_the_countdown() {
        let settings = Settings {
            question_seconds: 0,
            tick_millis: 0,
            ..Settings::default()
        };
        let timings = settings.timings();
        assert_eq!(timings.question_duration, Duration::from_secs(1));
        assert_eq!(timings.tick_interval, Duration::from_millis(1));
    }

    #[test]
    fn server_url_validation() {
        assert_eq!(
            validate_server_url(" http://127.0.0.1:5000/ ").expect("valid"),
            "http://127.0.0.1:5000"
        );
        assert!(validate_server_url("ftp://quiz.local").is_err());
        assert!(validate_server_url("not a url").is_err());
    }
}
