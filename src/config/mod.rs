//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::config::{
    DEFAULT_ENTRY_LIMIT, DEFAULT_GC_MS, DEFAULT_POSTS_STALE_MS, DEFAULT_USERS_STALE_MS,
};
use crate::domain::preferences::{SortOrder, ThemeMode, ViewMode};
use crate::domain::view::AuthorFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "postdeck";
const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_PREFERENCES_DIR: &str = ".postdeck";

/// Command-line arguments for the postdeck binary.
#[derive(Debug, Parser)]
#[command(
    name = "postdeck",
    version,
    about = "Browse and manage posts from a JSON posts/users API"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "POSTDECK_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the API base URL.
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub api_base_url: Option<String>,

    /// Override the request timeout in milliseconds.
    #[arg(long = "api-timeout-ms", value_name = "MS", global = true)]
    pub api_timeout_ms: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the directory holding persisted preferences.
    #[arg(long = "prefs-dir", value_name = "PATH", global = true)]
    pub prefs_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Read and modify posts.
    Posts(PostsArgs),
    /// Read users.
    Users(UsersArgs),
    /// Show or change persisted display preferences.
    Prefs(PrefsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PostsAction {
    /// List posts, filtered and sorted.
    List(ListArgs),
    /// Show one post.
    Get {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Create a post.
    Create(PostInput),
    /// Replace the title, body and author of a post.
    Update {
        #[arg(value_name = "ID")]
        id: u64,
        #[command(flatten)]
        input: PostInput,
    },
    /// Delete a post.
    Delete {
        #[arg(value_name = "ID")]
        id: u64,
    },
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListArgs {
    /// Case-insensitive substring matched against title and body.
    #[arg(long)]
    pub search: Option<String>,

    /// Author id, or `all`.
    #[arg(long, value_name = "ID|all")]
    pub author: Option<AuthorFilter>,

    /// Title sort order (asc|desc); persisted.
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<SortOrder>,

    /// Output layout (grid|table); persisted.
    #[arg(long, value_name = "MODE")]
    pub view: Option<ViewMode>,

    /// Emit JSON instead of the grid/table rendering.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PostInput {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub body: String,

    /// Author (user id).
    #[arg(long, value_name = "ID")]
    pub author: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum UsersAction {
    /// List users.
    List,
    /// Show one user.
    Get {
        #[arg(value_name = "ID")]
        id: u64,
    },
}

#[derive(Debug, Args, Clone)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub action: PrefsAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PrefsAction {
    /// Print the persisted preferences.
    Show,
    /// Set the theme (light|dark).
    Theme {
        #[arg(value_name = "MODE")]
        mode: ThemeMode,
    },
    /// Switch between light and dark.
    #[command(name = "toggle-theme")]
    ToggleTheme,
    /// Set the posts view (grid|table).
    View {
        #[arg(value_name = "MODE")]
        mode: ViewMode,
    },
    /// Set the title sort order (asc|desc).
    Sort {
        #[arg(value_name = "ORDER")]
        order: SortOrder,
    },
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
    pub preferences: PreferencesSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub posts_stale_after: Duration,
    pub users_stale_after: Duration,
    pub gc_after: Duration,
    pub entry_limit: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct PreferencesSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("POSTDECK").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    cache: RawCacheSettings,
    logging: RawLoggingSettings,
    preferences: RawPreferencesSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(timeout) = overrides.api_timeout_ms {
            self.api.timeout_ms = Some(timeout);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(directory) = overrides.prefs_dir.as_ref() {
            self.preferences.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            cache,
            logging,
            preferences,
        } = raw;

        Ok(Self {
            api: build_api_settings(api)?,
            cache: build_cache_settings(cache)?,
            logging: build_logging_settings(logging)?,
            preferences: build_preferences_settings(preferences)?,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let raw_url = api
        .base_url
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("api.base_url", format!("failed to parse: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "api.base_url",
            "scheme must be http or https",
        ));
    }

    let timeout_ms = api.timeout_ms.unwrap_or(DEFAULT_API_TIMEOUT_MS);
    Ok(ApiSettings {
        base_url,
        timeout: positive_millis(timeout_ms, "api.timeout_ms")?,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let entry_limit = cache.entry_limit.unwrap_or(DEFAULT_ENTRY_LIMIT);
    let entry_limit = NonZeroUsize::new(entry_limit)
        .ok_or_else(|| LoadError::invalid("cache.entry_limit", "must be greater than zero"))?;

    Ok(CacheSettings {
        posts_stale_after: positive_millis(
            cache.posts_stale_ms.unwrap_or(DEFAULT_POSTS_STALE_MS),
            "cache.posts_stale_ms",
        )?,
        users_stale_after: positive_millis(
            cache.users_stale_ms.unwrap_or(DEFAULT_USERS_STALE_MS),
            "cache.users_stale_ms",
        )?,
        gc_after: positive_millis(cache.gc_ms.unwrap_or(DEFAULT_GC_MS), "cache.gc_ms")?,
        entry_limit,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_preferences_settings(
    preferences: RawPreferencesSettings,
) -> Result<PreferencesSettings, LoadError> {
    let directory = preferences
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "preferences.directory",
            "path must not be empty",
        ));
    }
    Ok(PreferencesSettings { directory })
}

fn positive_millis(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_millis(value))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    posts_stale_ms: Option<u64>,
    users_stale_ms: Option<u64>,
    gc_ms: Option<u64>,
    entry_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPreferencesSettings {
    directory: Option<PathBuf>,
}
