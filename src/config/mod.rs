//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::{
    application::export::settings::{
        DEFAULT_BODY_COLUMN_SPAN, DEFAULT_LANGUAGE, DEFAULT_LAYOUT_COLUMNS, DEFAULT_LAYOUT_GUTTER,
        DEFAULT_LAYOUT_MARGIN, DEFAULT_LAYOUT_WIDTH, ExportSettings, GalleryType, LayoutGrid,
        Theme,
    },
    domain::settings::BodyOrientation,
    infra::publish::{
        Credentials,
        client::{DEFAULT_GET_TIMEOUT, DEFAULT_UPLOAD_TIMEOUT},
    },
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "newsdesk";
const ENV_PREFIX: &str = "NEWSDESK";

/// Command-line arguments for the newsdesk binary.
#[derive(Debug, Parser)]
#[command(
    name = "newsdesk",
    version,
    about = "Export HTML articles to Article Format and publish them"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "NEWSDESK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Export a content file into a local Article Format workspace.
    Export(ExportArgs),
    /// Publish a content file as a new article in the configured channel.
    Publish(PublishArgs),
    /// Replace an existing article, guarded by its current revision.
    Update(UpdateArgs),
    /// Fetch an article record.
    Fetch(ArticleArgs),
    /// Delete an article.
    Delete(ArticleArgs),
    /// Show the configured channel.
    Channel(ChannelArgs),
    /// List the sections of the configured channel.
    Sections(ChannelArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ApiOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the publishing API base URL.
    #[arg(long = "api-base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Override the channel articles are published to.
    #[arg(long = "channel-id", value_name = "ID")]
    pub channel_id: Option<String>,

    /// Override the API key identifier.
    #[arg(long = "api-key", value_name = "KEY")]
    pub key: Option<String>,

    /// Override the base64 API secret.
    #[arg(long = "api-secret", value_name = "SECRET")]
    pub secret: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ExportOverrides {
    /// Override the parent directory for export workspaces.
    #[arg(long = "workspace-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub workspace_root: Option<PathBuf>,

    /// Override the directory relative image paths resolve against.
    #[arg(long = "media-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub media_root: Option<PathBuf>,

    /// Override the default body orientation (left|right|center).
    #[arg(long = "body-orientation", value_name = "SIDE")]
    pub body_orientation: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub export: ExportOverrides,

    /// Content JSON file to export.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Directory that receives `article.json` and the bundle files.
    #[arg(long, short, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PublishArgs {
    #[command(flatten)]
    pub api: ApiOverrides,

    #[command(flatten)]
    pub export: ExportOverrides,

    /// Content JSON file to publish.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub api: ApiOverrides,

    #[command(flatten)]
    pub export: ExportOverrides,

    /// Identifier of the article to replace.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Revision token returned by the last publish or fetch.
    #[arg(long, value_name = "REVISION")]
    pub revision: String,

    /// Content JSON file holding the new version.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ArticleArgs {
    #[command(flatten)]
    pub api: ApiOverrides,

    /// Article identifier.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct ChannelArgs {
    #[command(flatten)]
    pub api: ApiOverrides,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub api: ApiSettings,
    pub export: ExportSettings,
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

/// Connection settings; individual values are only required by commands
/// that talk to the API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Option<Url>,
    pub channel_id: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
    pub get_timeout: Duration,
    pub upload_timeout: Duration,
}

impl ApiSettings {
    pub fn base_url(&self) -> Result<&Url, LoadError> {
        self.base_url.as_ref().ok_or(LoadError::Missing {
            key: "api.base_url",
        })
    }

    pub fn channel_id(&self) -> Result<&str, LoadError> {
        self.channel_id
            .as_deref()
            .ok_or(LoadError::Missing { key: "api.channel_id" })
    }

    pub fn credentials(&self) -> Result<Credentials, LoadError> {
        let key = self
            .key
            .as_deref()
            .ok_or(LoadError::Missing { key: "api.key" })?;
        let secret = self
            .secret
            .as_deref()
            .ok_or(LoadError::Missing { key: "api.secret" })?;
        Ok(Credentials::new(key, secret))
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("missing configuration for `{key}`")]
    Missing { key: &'static str },
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

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command_overrides(&cli.command);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    api: RawApiSettings,
    export: RawExportSettings,
}

impl RawSettings {
    fn apply_command_overrides(&mut self, command: &Command) {
        match command {
            Command::Export(args) => {
                self.apply_logging_overrides(&args.logging);
                self.apply_export_overrides(&args.export);
            }
            Command::Publish(PublishArgs { api, export, .. })
            | Command::Update(UpdateArgs { api, export, .. }) => {
                self.apply_api_overrides(api);
                self.apply_export_overrides(export);
            }
            Command::Fetch(args) | Command::Delete(args) => self.apply_api_overrides(&args.api),
            Command::Channel(args) | Command::Sections(args) => {
                self.apply_api_overrides(&args.api)
            }
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_api_overrides(&mut self, overrides: &ApiOverrides) {
        self.apply_logging_overrides(&overrides.logging);
        if let Some(url) = overrides.base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(channel) = overrides.channel_id.as_ref() {
            self.api.channel_id = Some(channel.clone());
        }
        if let Some(key) = overrides.key.as_ref() {
            self.api.key = Some(key.clone());
        }
        if let Some(secret) = overrides.secret.as_ref() {
            self.api.secret = Some(secret.clone());
        }
    }

    fn apply_export_overrides(&mut self, overrides: &ExportOverrides) {
        if let Some(root) = overrides.workspace_root.as_ref() {
            self.export.workspace_root = Some(root.clone());
        }
        if let Some(root) = overrides.media_root.as_ref() {
            self.export.media_root = Some(root.clone());
        }
        if let Some(orientation) = overrides.body_orientation.as_ref() {
            self.export.body_orientation = Some(orientation.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            api,
            export,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let api = build_api_settings(api)?;
        let export = build_export_settings(export)?;

        Ok(Self {
            logging,
            api,
            export,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let base_url = match non_blank(api.base_url) {
        Some(value) => {
            let url = Url::parse(&value)
                .map_err(|err| LoadError::invalid("api.base_url", format!("{err}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "api.base_url",
                    "scheme must be http or https",
                ));
            }
            Some(url)
        }
        None => None,
    };

    let get_timeout = match api.get_timeout_seconds {
        Some(secs) => positive_secs(secs, "api.get_timeout_seconds")?,
        None => DEFAULT_GET_TIMEOUT,
    };
    let upload_timeout = match api.upload_timeout_seconds {
        Some(secs) => positive_secs(secs, "api.upload_timeout_seconds")?,
        None => DEFAULT_UPLOAD_TIMEOUT,
    };

    Ok(ApiSettings {
        base_url,
        channel_id: non_blank(api.channel_id),
        key: non_blank(api.key),
        secret: non_blank(api.secret),
        get_timeout,
        upload_timeout,
    })
}

fn build_export_settings(export: RawExportSettings) -> Result<ExportSettings, LoadError> {
    let layout = LayoutGrid {
        columns: export.columns.unwrap_or(DEFAULT_LAYOUT_COLUMNS),
        body_column_span: export
            .body_column_span
            .unwrap_or(DEFAULT_BODY_COLUMN_SPAN),
        width: export.width.unwrap_or(DEFAULT_LAYOUT_WIDTH),
        margin: export.margin.unwrap_or(DEFAULT_LAYOUT_MARGIN),
        gutter: export.gutter.unwrap_or(DEFAULT_LAYOUT_GUTTER),
    };
    if layout.columns == 0 {
        return Err(LoadError::invalid(
            "export.columns",
            "must be greater than zero",
        ));
    }
    if layout.body_column_span == 0 || layout.body_column_span >= layout.columns {
        return Err(LoadError::invalid(
            "export.body_column_span",
            format!(
                "must be between 1 and {} to leave room for anchored components",
                layout.columns.saturating_sub(1)
            ),
        ));
    }
    if layout.width == 0 {
        return Err(LoadError::invalid("export.width", "must be greater than zero"));
    }

    let body_orientation = match export.body_orientation {
        Some(value) => BodyOrientation::from_str(&value)
            .map_err(|err| LoadError::invalid("export.body_orientation", err.to_string()))?,
        None => BodyOrientation::default(),
    };

    let language = non_blank(export.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    Ok(ExportSettings {
        language,
        layout,
        body_orientation,
        enable_advertisement: export.enable_advertisement.unwrap_or(false),
        gallery_type: export.gallery_type.unwrap_or_default(),
        theme: export.theme,
        workspace_root: export.workspace_root,
        media_root: export.media_root,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    channel_id: Option<String>,
    key: Option<String>,
    secret: Option<String>,
    get_timeout_seconds: Option<u64>,
    upload_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawExportSettings {
    language: Option<String>,
    columns: Option<u32>,
    body_column_span: Option<u32>,
    width: Option<u32>,
    margin: Option<u32>,
    gutter: Option<u32>,
    body_orientation: Option<String>,
    enable_advertisement: Option<bool>,
    gallery_type: Option<GalleryType>,
    theme: Theme,
    workspace_root: Option<PathBuf>,
    media_root: Option<PathBuf>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn positive_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
