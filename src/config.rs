use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// File the now-playing line is written to
    #[serde(default = "OutputConfig::default_file")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FormatConfig {
    /// Overall line; {artist}, {title} and {album} expand to the
    /// rendered segments below
    #[serde(default = "FormatConfig::default_overall")]
    pub overall: String,
    /// Artist segment; {} expands to the artist name
    #[serde(default = "FormatConfig::default_artist")]
    pub artist: String,
    /// Title segment; {} expands to the track title
    #[serde(default = "FormatConfig::default_title")]
    pub title: String,
    /// Album segment; {} expands to the album name
    #[serde(default = "FormatConfig::default_album")]
    pub album: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Enable logging to file
    #[serde(default = "LoggingConfig::default_enabled")]
    pub enabled: bool,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// Append to existing log file
    #[serde(default = "LoggingConfig::default_append_to_file")]
    pub append_to_file: bool,
    /// Enable log rotation
    #[serde(default = "LoggingConfig::default_rotate_logs")]
    pub rotate_logs: bool,
    /// Maximum log file size in MB before rotation
    #[serde(default = "LoggingConfig::default_rotation_size_mb")]
    pub rotation_size_mb: u64,
    /// Number of log files to keep when rotating
    #[serde(default = "LoggingConfig::default_keep_log_files")]
    pub keep_log_files: u32,
}

impl Config {
    /// Default config file path based on the platform:
    /// - Linux: ~/.config/mpristext/config.toml (XDG_CONFIG_HOME)
    /// - macOS: ~/Library/Application Support/mpristext/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\mpristext\config.toml
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("mpristext").join("config.toml"))
            .unwrap_or_default()
    }

    pub fn load(config_path: Option<PathBuf>) -> color_eyre::Result<Self> {
        let config_path = config_path.unwrap_or_else(Self::default_path);

        // Check if config file exists
        if !config_path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            // Create default config
            let default_config = Config::default();

            // Serialize to TOML and write to file
            let toml_string = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_path, &toml_string)?;

            eprintln!("Created default config file at: {}", config_path.display());

            return Ok(default_config);
        }
        let contents = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}

impl OutputConfig {
    fn default_file() -> PathBuf {
        PathBuf::from("/tmp/mpris_info.txt")
    }
}

impl FormatConfig {
    fn default_overall() -> String {
        "{artist}{title}{album}            ".to_string()
    }

    fn default_artist() -> String {
        "{}    ".to_string()
    }

    fn default_title() -> String {
        "\"{}\"".to_string()
    }

    fn default_album() -> String {
        "  from  \"{}\"".to_string()
    }
}

impl LoggingConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_level() -> String {
        "info".to_string()
    }

    fn default_append_to_file() -> bool {
        true
    }

    fn default_rotate_logs() -> bool {
        true
    }

    fn default_rotation_size_mb() -> u64 {
        10
    }

    fn default_keep_log_files() -> u32 {
        5
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: Self::default_file(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            overall: Self::default_overall(),
            artist: Self::default_artist(),
            title: Self::default_title(),
            album: Self::default_album(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            level: Self::default_level(),
            append_to_file: Self::default_append_to_file(),
            rotate_logs: Self::default_rotate_logs(),
            rotation_size_mb: Self::default_rotation_size_mb(),
            keep_log_files: Self::default_keep_log_files(),
        }
    }
}
