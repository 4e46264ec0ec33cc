use clap::Parser;

use crate::preprocessing::DEFAULT_SENSITIVITY;

#[derive(Parser, Debug)]
#[command(name = "snaptext-server")]
#[command(about = "Image text extraction server with tunable enhancement preprocessing")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "SNAPTEXT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SNAPTEXT_PORT", default_value = "9424")]
    pub port: u16,

    /// Default language for OCR (e.g., "eng", "deu", "fra")
    #[arg(long, env = "SNAPTEXT_DEFAULT_LANGUAGE", default_value = "eng")]
    pub default_language: String,

    /// Maximum file size in bytes (default: 50MB)
    #[arg(long, env = "SNAPTEXT_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Default enhancement sensitivity, 0-100
    #[arg(long, env = "SNAPTEXT_DEFAULT_SENSITIVITY", default_value_t = DEFAULT_SENSITIVITY)]
    pub default_sensitivity: u8,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_language: String,
    pub max_file_size: usize,
    pub default_sensitivity: u8,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            default_language: args.default_language,
            max_file_size: args.max_file_size,
            default_sensitivity: args.default_sensitivity.min(100),
        }
    }
}
