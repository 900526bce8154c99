use std::env;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Step identifiers probed, in order, when looking for a failing run's log.
pub const DEFAULT_SNIPPET_CANDIDATES: &[&str] = &["main", "extract", "transform", "load"];

// ── Env lookup ────────────────────────────────────────────────

/// Key/value lookup the config is built from.
///
/// Production reads the process environment; tests hand in a map.
struct EnvSource<F: Fn(&str) -> Option<String>> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvSource<F> {
    fn opt(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|s| !s.trim().is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn u16(&self, key: &str, default: u16) -> u16 {
        self.opt(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn u64(&self, key: &str, default: u64) -> u64 {
        self.opt(key)
            .and_then(|v| v.trim().parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(default)
    }

    fn list(&self, key: &str, default: &[&str]) -> Vec<String> {
        let parsed: Vec<String> = self
            .opt(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if parsed.is_empty() {
            default.iter().map(|s| s.to_string()).collect()
        } else {
            parsed
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Process configuration, built once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment label attached to every metric series.
    pub env: String,
    pub server: ServerConfig,
    pub orchestrator: OrchestratorConfig,
    pub messaging: MessagingConfig,
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let src = EnvSource { lookup };
        Self {
            env: src.or("ATLAS_ENV", "dev"),
            server: ServerConfig::from_source(&src),
            orchestrator: OrchestratorConfig::from_source(&src),
            messaging: MessagingConfig::from_source(&src),
            schedule: ScheduleConfig::from_source(&src),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (env: {}):", self.env);
        tracing::info!("  server:       {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  orchestrator: url={}, user={}",
            self.orchestrator.base_url,
            self.orchestrator.username
        );
        tracing::info!(
            "  messaging:    channel={}, token={}",
            self.messaging.digest_channel,
            if self.messaging.is_configured() { "set" } else { "(none, local echo)" }
        );
        tracing::info!(
            "  schedule:     poll={}s, digest='{}' ({})",
            self.schedule.poll_interval_secs,
            self.schedule.digest_cron,
            self.schedule.timezone
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_source<F: Fn(&str) -> Option<String>>(src: &EnvSource<F>) -> Self {
        Self {
            host: src.or("ATLAS_HOST", "0.0.0.0"),
            port: src.u16("ATLAS_PORT", 8000),
        }
    }
}

// ── Orchestrator ──────────────────────────────────────────────

#[derive(Clone)]
pub struct OrchestratorConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl OrchestratorConfig {
    fn from_source<F: Fn(&str) -> Option<String>>(src: &EnvSource<F>) -> Self {
        Self {
            base_url: src
                .or("AIRFLOW_BASE_URL", "http://localhost:8080")
                .trim_end_matches('/')
                .to_string(),
            username: src.or("AIRFLOW_USERNAME", "airflow"),
            password: src.or("AIRFLOW_PASSWORD", "airflow"),
        }
    }
}

impl std::fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

// ── Messaging ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct MessagingConfig {
    pub bot_token: Option<String>,
    pub digest_channel: String,
}

impl MessagingConfig {
    fn from_source<F: Fn(&str) -> Option<String>>(src: &EnvSource<F>) -> Self {
        Self {
            bot_token: src.opt("SLACK_BOT_TOKEN"),
            digest_channel: src.or("SLACK_CHANNEL_DIGEST", "#atlas-digest"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some()
    }
}

impl std::fmt::Debug for MessagingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "***"))
            .field("digest_channel", &self.digest_channel)
            .finish()
    }
}

// ── Schedule ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Seconds between failure polls.
    pub poll_interval_secs: u64,
    /// Five-field cron expression for the digest.
    pub digest_cron: String,
    /// IANA timezone the cron expression is evaluated in.
    pub timezone: String,
    /// Ordered step ids tried when fetching an error snippet.
    pub snippet_candidates: Vec<String>,
}

impl ScheduleConfig {
    fn from_source<F: Fn(&str) -> Option<String>>(src: &EnvSource<F>) -> Self {
        let digest_cron = src
            .opt("DIGEST_CRON")
            .or_else(|| src.opt("DIGEST_CRON_IST"))
            .unwrap_or_else(|| "15 9 * * *".to_string());
        Self {
            poll_interval_secs: src.u64("POLL_INTERVAL_SEC", 120),
            digest_cron,
            timezone: src.or("DIGEST_TIMEZONE", "Asia/Kolkata"),
            snippet_candidates: src.list("SNIPPET_STEP_CANDIDATES", DEFAULT_SNIPPET_CANDIDATES),
        }
    }
}
