//! Run configuration: merging CLI/env values over an optional YAML file and
//! validating that everything a run needs is present.

use crate::auth::Credentials;
use crate::cli::Cli;
use crate::error::{AuthError, SyncError};
use crate::normalize::TeamIdentity;
use crate::wait::StabilityWait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://app.meiland.es";
pub const DEFAULT_COMPETITION: &str = "Liga Meiland";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_STORE_RETRIES: usize = 2;
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Settings accepted from the YAML file. Same names as the CLI options.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub team_id: Option<String>,
    pub division_id: Option<String>,
    pub team_name: Option<String>,
    pub competition: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub webdriver_url: Option<String>,
    pub wait_attempts: Option<u32>,
    pub wait_interval_ms: Option<u64>,
    pub store_retries: Option<usize>,
    pub standings: Option<bool>,
}

/// Read and parse the YAML settings file.
#[instrument(level = "info")]
pub async fn load_file(path: &str) -> Result<FileConfig, SyncError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::Config(format!("cannot read {path}: {e}")))?;
    let file = serde_yaml::from_str(&raw)
        .map_err(|e| SyncError::Config(format!("invalid {path}: {e}")))?;
    info!("Loaded configuration file");
    Ok(file)
}

/// Page addresses on the league site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSite {
    origin: Url,
}

impl SourceSite {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn page(&self, path_and_query: &str) -> String {
        format!("{}{}", self.origin.as_str().trim_end_matches('/'), path_and_query)
    }

    pub fn home_url(&self) -> String {
        self.page("/")
    }

    pub fn login_url(&self) -> String {
        self.page("/app/user/login")
    }

    pub fn team_url(&self, team_id: &str) -> String {
        self.page(&format!("/app/team/view?id={team_id}"))
    }

    pub fn match_url(&self, match_id: &str) -> String {
        self.page(&format!("/app/match/view?id={match_id}"))
    }

    pub fn division_url(&self, division_id: &str) -> String {
        self.page(&format!("/app/division/view?id={division_id}"))
    }
}

/// Where normalized rows go.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Postgrest { url: Url, key: String },
    /// Keep rows in memory and only report what would have been written.
    DryRun,
}

impl fmt::Debug for StoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreTarget::Postgrest { url, .. } => f
                .debug_struct("Postgrest")
                .field("url", &url.as_str())
                .field("key", &"<redacted>")
                .finish(),
            StoreTarget::DryRun => f.write_str("DryRun"),
        }
    }
}

/// Everything one sync run needs, validated.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub site: SourceSite,
    /// Team id on the league site, as used in `/app/team/view?id=`.
    pub team_id: String,
    pub division_id: String,
    /// Name matcher for the tracked team.
    pub team: TeamIdentity,
    /// Written to every match row.
    pub competition: String,
    pub credentials: Credentials,
    pub store: StoreTarget,
    /// WebDriver endpoint, e.g. a local chromedriver.
    pub webdriver_url: String,
    pub wait: StabilityWait,
    /// Retries per row on transient store errors.
    pub store_retries: usize,
    pub include_standings: bool,
}

fn required(value: Option<String>, what: &str) -> Result<String, SyncError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SyncError::Config(format!("missing {what}")))
}

fn parse_http_url(raw: &str, what: &str) -> Result<Url, SyncError> {
    let url = Url::parse(raw.trim()).map_err(|e| SyncError::Config(format!("invalid {what} {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SyncError::Config(format!("{what} must be http(s), got {raw:?}")));
    }
    Ok(url)
}

impl SyncConfig {
    /// Merge `cli` over `file` and validate the result.
    ///
    /// # Errors
    ///
    /// [`SyncError::Config`] when the team, division, team name or (outside a
    /// dry run) the store settings are missing or malformed;
    /// [`SyncError::Auth`] when the league credentials are missing.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, SyncError> {
        let base_url = cli
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let site = SourceSite::new(parse_http_url(&base_url, "base URL")?);

        let team_id = required(cli.team_id.or(file.team_id), "team id")?;
        let division_id = required(cli.division_id.or(file.division_id), "division id")?;
        let team_name = required(cli.team_name.or(file.team_name), "team name")?;
        let competition = cli
            .competition
            .or(file.competition)
            .unwrap_or_else(|| DEFAULT_COMPETITION.to_string());

        let email = cli
            .email
            .or(file.email)
            .filter(|v| !v.trim().is_empty())
            .ok_or(AuthError::MissingCredentials("email"))?;
        let password = cli
            .password
            .or(file.password)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingCredentials("password"))?;

        let store = if cli.dry_run {
            StoreTarget::DryRun
        } else {
            let url = required(cli.store_url.or(file.store_url), "store URL")?;
            let key = required(cli.store_key.or(file.store_key), "store key")?;
            StoreTarget::Postgrest {
                url: parse_http_url(&url, "store URL")?,
                key,
            }
        };

        let defaults = StabilityWait::default();
        let wait = StabilityWait {
            max_attempts: cli
                .wait_attempts
                .or(file.wait_attempts)
                .unwrap_or(defaults.max_attempts),
            poll_interval: cli
                .wait_interval_ms
                .or(file.wait_interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        };
        if wait.max_attempts == 0 {
            return Err(SyncError::Config("wait attempts must be at least 1".to_string()));
        }

        Ok(Self {
            site,
            team_id,
            division_id,
            team: TeamIdentity::new(team_name),
            competition,
            credentials: Credentials { email, password },
            store,
            webdriver_url: cli
                .webdriver_url
                .or(file.webdriver_url)
                .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
            wait,
            store_retries: cli
                .store_retries
                .or(file.store_retries)
                .unwrap_or(DEFAULT_STORE_RETRIES),
            include_standings: cli.standings || file.standings.unwrap_or(false),
        })
    }
}
