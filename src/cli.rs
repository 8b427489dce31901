use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Settings for a command-line run.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_root: PathBuf,
    pub output_path: PathBuf,
    pub verbosity: u8,
}

/// Settings for the upload server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Parent of the per-request upload directories.
    pub upload_root: PathBuf,
    /// Where generated documents are written before being sent.
    pub output_root: PathBuf,
    pub max_upload_bytes: usize,
    pub verbosity: u8,
}

fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Increase log verbosity (-v debug, -vv trace)")
        .action(ArgAction::Count)
}

pub fn cli_command() -> Command {
    Command::new("dirdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Writes a directory's structure and its files' leading comments into one .md file")
        .arg(
            Arg::new("source")
                .value_name("DIR")
                .help("Directory to analyze")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .value_name("FILE")
                .help("Output .md file path")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(verbose_arg())
}

pub fn server_command() -> Command {
    Command::new("dirdoc-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serves dirdoc over HTTP: POST a folder to /upload, get the Markdown back")
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_name("ADDR")
                .env("DIRDOC_BIND")
                .default_value("0.0.0.0:5000")
                .help("Address to listen on")
                .value_parser(value_parser!(SocketAddr)),
        )
        .arg(
            Arg::new("upload-dir")
                .long("upload-dir")
                .value_name("DIR")
                .env("DIRDOC_UPLOAD_DIR")
                .default_value("uploads")
                .help("Directory for temporary uploads")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .value_name("DIR")
                .env("DIRDOC_OUTPUT_DIR")
                .default_value("output")
                .help("Directory for generated documents")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("max-upload-mb")
                .long("max-upload-mb")
                .value_name("MB")
                .env("DIRDOC_MAX_UPLOAD_MB")
                .default_value("256")
                .help("Maximum request body size in megabytes")
                .value_parser(value_parser!(usize)),
        )
        .arg(verbose_arg())
}

pub fn parse_args() -> Result<Config> {
    let matches = cli_command().get_matches();
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(config_from_matches(&matches, &cwd))
}

pub fn parse_server_args() -> ServerConfig {
    server_config_from_matches(&server_command().get_matches())
}

pub fn config_from_matches(matches: &ArgMatches, cwd: &Path) -> Config {
    let source_root = matches
        .get_one::<PathBuf>("source")
        .cloned()
        .unwrap_or_else(|| cwd.to_path_buf());

    // Build dynamic default filename: {folder}_docs_{epoch}.md
    let output_path = matches.get_one::<PathBuf>("output").cloned().unwrap_or_else(|| {
        let folder_name = source_root
            .file_name()
            .or_else(|| cwd.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("project");

        let timestamp = Utc::now().timestamp();
        cwd.join(format!("{folder_name}_docs_{timestamp}.md"))
    });

    Config {
        source_root,
        output_path,
        verbosity: matches.get_count("verbose"),
    }
}

pub fn server_config_from_matches(matches: &ArgMatches) -> ServerConfig {
    let path = |id: &str| {
        matches
            .get_one::<PathBuf>(id)
            .cloned()
            .unwrap_or_default()
    };

    ServerConfig {
        bind: matches
            .get_one::<SocketAddr>("bind")
            .copied()
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000))),
        upload_root: path("upload-dir"),
        output_root: path("output-dir"),
        max_upload_bytes: matches
            .get_one::<usize>("max-upload-mb")
            .copied()
            .unwrap_or(256)
            .saturating_mul(1024 * 1024),
        verbosity: matches.get_count("verbose"),
    }
}

/// Initialise `env_logger`; `RUST_LOG` wins over the verbosity flag.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
