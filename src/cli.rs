//! Command-line interface definitions for League Sync.
//!
//! Every option can also come from an environment variable (a `.env` file is
//! loaded first) or from the YAML file given with `--config`. Command-line and
//! environment values win over the file.

use clap::Parser;

/// Command-line arguments for a sync run.
///
/// # Examples
///
/// ```sh
/// # Everything from the environment / .env
/// league_sync
///
/// # Try a run without touching the store
/// league_sync --team-id 5253 --division-id 699 --team-name Madagascar --dry-run
///
/// # Defaults from a file, standings included
/// league_sync --config league_sync.yaml --standings
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML file with default settings
    #[arg(short, long)]
    pub config: Option<String>,

    /// Root URL of the league site
    #[arg(long, env = "LEAGUE_BASE_URL")]
    pub base_url: Option<String>,

    /// Id of the tracked team on the league site
    #[arg(long, env = "LEAGUE_TEAM_ID")]
    pub team_id: Option<String>,

    /// Id of the tracked team's division
    #[arg(long, env = "LEAGUE_DIVISION_ID")]
    pub division_id: Option<String>,

    /// Name (or distinctive part of it) the tracked team appears under in fixtures
    #[arg(long, env = "LEAGUE_TEAM_NAME")]
    pub team_name: Option<String>,

    /// Competition label stored with every match
    #[arg(long, env = "LEAGUE_COMPETITION")]
    pub competition: Option<String>,

    /// Login email for the league site
    #[arg(long, env = "MEILAND_EMAIL")]
    pub email: Option<String>,

    /// Login password for the league site
    #[arg(long, env = "MEILAND_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Base URL of the PostgREST / Supabase store
    #[arg(long, env = "SUPABASE_URL")]
    pub store_url: Option<String>,

    /// Service key for the store
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub store_key: Option<String>,

    /// WebDriver endpoint driving the headless browser
    #[arg(long, env = "WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// How many times to poll a page while it renders
    #[arg(long, env = "LEAGUE_WAIT_ATTEMPTS")]
    pub wait_attempts: Option<u32>,

    /// Delay between two render polls, in milliseconds
    #[arg(long, env = "LEAGUE_WAIT_INTERVAL_MS")]
    pub wait_interval_ms: Option<u64>,

    /// Extra attempts for a failed store write
    #[arg(long, env = "LEAGUE_STORE_RETRIES")]
    pub store_retries: Option<usize>,

    /// Also scrape and store the division standings
    #[arg(long)]
    pub standings: bool,

    /// Scrape and normalize, but keep rows in memory instead of writing them
    #[arg(long)]
    pub dry_run: bool,
}
