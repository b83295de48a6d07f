//! Investigo CLI Application
//!
//! A command-line interface for finding a username across social networks.
//! This CLI application provides a user-friendly interface to the investigo-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use futures::StreamExt;
use investigo_lib::{
    expand_handle_inputs, load_env_config, parse_timeout_string, validate_handle, Catalog,
    ConfigManager, EnvConfig, FileConfig, Investigator, ProbeConfig, ProbeResult, ProbeSummary,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Catalog looked up in the working directory when none is configured.
const DEFAULT_DATABASE: &str = "data.json";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for investigo
#[derive(Parser, Debug)]
#[command(name = "investigo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Investigate a username across social networks")]
#[command(
    long_about = "Investigate which websites have a profile for a username.\n\nEvery site of the catalog is probed concurrently, optionally through Tor or another SOCKS5 proxy."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Usernames to investigate (prompted for when omitted)
    #[arg(value_name = "HANDLES", help_heading = "Targets")]
    pub handles: Vec<String>,

    /// Only probe these sites (repeatable, case-insensitive)
    #[arg(long = "site", value_name = "NAME", action = clap::ArgAction::Append, help_heading = "Targets")]
    pub sites: Vec<String>,

    /// Site catalog file [default: data.json]
    #[arg(long = "db", value_name = "FILE", help_heading = "Targets")]
    pub db: Option<String>,

    /// Validate the catalog using each site's known usernames
    #[arg(long = "test", help_heading = "Targets")]
    pub test: bool,

    /// Also show sites where the username was not found
    #[arg(short = 'v', long = "verbose", help_heading = "Output")]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color", help_heading = "Output")]
    pub no_color: bool,

    /// Route probes through Tor (socks5://127.0.0.1:9050)
    #[arg(short = 't', long = "tor", help_heading = "Network")]
    pub tor: bool,

    /// SOCKS proxy endpoint used with --tor
    #[arg(long = "proxy", value_name = "URL", help_heading = "Network")]
    pub proxy: Option<String>,

    /// Max concurrent requests (default: 8, max: 100)
    #[arg(short = 'c', long = "concurrency", value_name = "N", help_heading = "Network")]
    pub concurrency: Option<usize>,

    /// Per-request timeout, e.g. "30s" or "2m" (default: 120s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Network")]
    pub timeout: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging on stderr
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,
}

/// Everything a run needs after all configuration sources are merged.
#[derive(Debug, Clone, Default)]
struct Settings {
    probe: ProbeConfig,
    /// Catalog path from CLI, env or config file; `None` means the default
    database: Option<String>,
    verbose: bool,
    no_color: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.debug);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_investigo(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--debug`.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '30s', '2m'",
                timeout
            ));
        }
    }

    if args.test && !args.handles.is_empty() {
        return Err("--test does not take usernames".to_string());
    }

    for handle in expand_handle_inputs(&args.handles) {
        validate_handle(&handle).map_err(|e| e.to_string())?;
    }

    Ok(())
}

async fn run_investigo(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;

    if settings.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let catalog = load_catalog(settings.database.as_deref(), &args.sites)?;
    let investigator = Investigator::with_config(settings.probe.clone())?;

    if args.test {
        return run_validation(&investigator, &catalog, settings.verbose).await;
    }

    let handles = collect_handles(&args.handles)?;
    for handle in &handles {
        investigate_handle(&investigator, &catalog, handle, settings.verbose).await?;
    }

    Ok(())
}

/// Probe every site for one handle, printing results as they arrive.
async fn investigate_handle(
    investigator: &Investigator,
    catalog: &Catalog,
    handle: &str,
    verbose: bool,
) -> Result<ProbeSummary, Box<dyn std::error::Error>> {
    ui::print_header(handle);

    let summary = investigator
        .probe_all_with_sink(handle, catalog, &mut |result: ProbeResult| {
            ui::print_result(&result, verbose)
        })
        .await?;

    ui::print_summary(&summary);
    Ok(summary)
}

/// Run catalog self-validation.
async fn run_validation(
    investigator: &Investigator,
    catalog: &Catalog,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut checked = 0usize;
    let mut broken = 0usize;
    let mut skipped = 0usize;

    let mut stream = investigator.validate_catalog(catalog);
    while let Some(item) = stream.next().await {
        match item {
            Ok(validation) => {
                if validation.is_skipped() {
                    skipped += 1;
                } else {
                    checked += 1;
                    if !validation.works() {
                        broken += 1;
                    }
                }
                ui::print_validation(&validation, verbose);
            }
            Err(e) => {
                tracing::warn!("validation task failed: {}", e);
                checked += 1;
                broken += 1;
            }
        }
    }

    ui::print_validation_summary(checked, broken, skipped, start.elapsed());
    Ok(())
}

/// Load the catalog, add the bundled sites and apply `--site` filters.
///
/// A configured catalog must exist; the default one may be missing.
fn load_catalog(
    database: Option<&str>,
    sites: &[String],
) -> Result<Catalog, Box<dyn std::error::Error>> {
    let catalog = match database {
        Some(path) => Catalog::load_file(path)?,
        None if Path::new(DEFAULT_DATABASE).exists() => Catalog::load_file(DEFAULT_DATABASE)?,
        None => {
            ui::print_warning(&format!(
                "{} not found, using bundled sites only",
                DEFAULT_DATABASE
            ));
            Catalog::new()
        }
    };
    let catalog = catalog.with_bundled_sites();

    if sites.is_empty() {
        return Ok(catalog);
    }

    let filtered = catalog.filter(sites);
    for name in sites {
        if !filtered.names().iter().any(|n| n.eq_ignore_ascii_case(name)) {
            ui::print_warning(&format!("Unknown site '{}'", name));
        }
    }

    if filtered.is_empty() {
        return Err(format!("No matching sites for: {}", sites.join(", ")).into());
    }

    Ok(filtered)
}

/// Handles from the command line, or read from stdin when none were given.
fn collect_handles(inputs: &[String]) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut handles = expand_handle_inputs(inputs);

    if handles.is_empty() {
        print!("Usernames to investigate (separated by space): ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        handles = expand_handle_inputs(&[line]);

        for handle in &handles {
            validate_handle(handle)?;
        }
    }

    if handles.is_empty() {
        return Err("No usernames to investigate".into());
    }

    Ok(handles)
}

/// Build the run settings from all configuration sources.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (INVESTIGO_*)
/// 3. Local config file (./investigo.toml or ./.investigo.toml)
/// 4. Global config file (~/.investigo.toml)
/// 5. XDG config file (~/.config/investigo/config.toml)
/// 6. Built-in defaults
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::default();
    let config_manager = ConfigManager::new();
    let env_config = load_env_config();

    // Step 1: Determine config file path and load config files
    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    let file_config = match explicit_path {
        Some(path) => {
            tracing::debug!(path = %path, "using explicit config file");
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load()?,
    };
    settings = merge_file_config(settings, file_config);

    // Step 2: Apply environment variables (INVESTIGO_*)
    settings = apply_env_config(settings, &env_config);

    // Step 3: Apply CLI arguments (highest precedence)
    apply_cli_args(settings, args)
}

/// Merge FileConfig into the settings.
fn merge_file_config(mut settings: Settings, file_config: FileConfig) -> Settings {
    let Some(defaults) = file_config.defaults else {
        return settings;
    };

    if let Some(concurrency) = defaults.concurrency {
        settings.probe = settings.probe.with_concurrency(concurrency);
    }
    if let Some(timeout_secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
        settings.probe = settings
            .probe
            .with_timeout(Duration::from_secs(timeout_secs));
    }
    if let Some(proxy) = defaults.proxy {
        settings.probe = settings.probe.with_proxy(proxy);
    }
    if let Some(use_proxy) = defaults.use_proxy {
        settings.probe = settings.probe.with_proxy_enabled(use_proxy);
    }
    if let Some(user_agent) = defaults.user_agent {
        settings.probe = settings.probe.with_user_agent(user_agent);
    }
    if defaults.database.is_some() {
        settings.database = defaults.database;
    }
    if let Some(verbose) = defaults.verbose {
        settings.verbose = verbose;
    }
    if let Some(no_color) = defaults.no_color {
        settings.no_color = no_color;
    }

    settings
}

/// Apply environment variables to the settings.
fn apply_env_config(mut settings: Settings, env_config: &EnvConfig) -> Settings {
    if let Some(concurrency) = env_config.concurrency {
        settings.probe = settings.probe.with_concurrency(concurrency);
    }
    if let Some(timeout_secs) = env_config.timeout.as_deref().and_then(parse_timeout_string) {
        settings.probe = settings
            .probe
            .with_timeout(Duration::from_secs(timeout_secs));
    }
    if let Some(proxy) = &env_config.proxy {
        settings.probe = settings.probe.with_proxy(proxy.clone());
    }
    if let Some(use_proxy) = env_config.use_proxy {
        settings.probe = settings.probe.with_proxy_enabled(use_proxy);
    }
    if env_config.database.is_some() {
        settings.database = env_config.database.clone();
    }
    if let Some(verbose) = env_config.verbose {
        settings.verbose = verbose;
    }
    if let Some(no_color) = env_config.no_color {
        settings.no_color = no_color;
    }

    settings
}

/// Apply CLI arguments to the settings (highest precedence).
///
/// Boolean flags only ever switch a setting on; leaving them out keeps the
/// value from the environment or config file.
fn apply_cli_args(
    mut settings: Settings,
    args: &Args,
) -> Result<Settings, Box<dyn std::error::Error>> {
    if let Some(concurrency) = args.concurrency {
        settings.probe = settings.probe.with_concurrency(concurrency);
    }
    if let Some(timeout) = &args.timeout {
        let timeout_secs = parse_timeout_string(timeout)
            .ok_or_else(|| format!("Invalid timeout '{}'", timeout))?;
        settings.probe = settings
            .probe
            .with_timeout(Duration::from_secs(timeout_secs));
    }
    if let Some(proxy) = &args.proxy {
        settings.probe = settings.probe.with_proxy(proxy.clone());
    }
    if args.tor {
        settings.probe = settings.probe.with_proxy_enabled(true);
    }
    if args.db.is_some() {
        settings.database = args.db.clone();
    }
    if args.verbose {
        settings.verbose = true;
    }
    if args.no_color {
        settings.no_color = true;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use investigo_lib::{DefaultsConfig, DEFAULT_CONCURRENCY};

    // Helper function with all required fields
    fn create_test_args() -> Args {
        Args {
            handles: vec!["alice".to_string()],
            sites: vec![],
            db: None,
            test: false,
            verbose: false,
            no_color: false,
            tor: false,
            proxy: None,
            concurrency: None,
            timeout: None,
            config: None,
            debug: false,
        }
    }

    #[test]
    fn test_validate_args_accepts_defaults() {
        assert!(validate_args(&create_test_args()).is_ok());
    }

    #[test]
    fn test_validate_args_concurrency_range() {
        let mut args = create_test_args();
        args.concurrency = Some(0);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(101);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(100);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_bad_timeout() {
        let mut args = create_test_args();
        args.timeout = Some("forever".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_rejects_bad_handle() {
        let mut args = create_test_args();
        args.handles = vec!["a/b".to_string()];
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_test_mode_takes_no_handles() {
        let mut args = create_test_args();
        args.test = true;
        assert!(validate_args(&args).is_err());

        args.handles.clear();
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.probe.concurrency, DEFAULT_CONCURRENCY);
        assert!(!settings.probe.use_proxy);
        assert_eq!(settings.database, None);
    }

    #[test]
    fn test_file_then_env_then_cli_precedence() {
        let file_config = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(4),
                timeout: Some("30s".to_string()),
                database: Some("file.json".to_string()),
                verbose: Some(true),
                ..Default::default()
            }),
        };
        let settings = merge_file_config(Settings::default(), file_config);
        assert_eq!(settings.probe.concurrency, 4);
        assert_eq!(settings.probe.timeout, Duration::from_secs(30));
        assert_eq!(settings.database.as_deref(), Some("file.json"));
        assert!(settings.verbose);

        let env_config = EnvConfig {
            concurrency: Some(6),
            database: Some("env.json".to_string()),
            use_proxy: Some(true),
            ..Default::default()
        };
        let settings = apply_env_config(settings, &env_config);
        assert_eq!(settings.probe.concurrency, 6);
        assert_eq!(settings.database.as_deref(), Some("env.json"));
        assert!(settings.probe.use_proxy);
        assert_eq!(settings.probe.timeout, Duration::from_secs(30));

        let mut args = create_test_args();
        args.concurrency = Some(12);
        args.timeout = Some("2m".to_string());
        args.proxy = Some("socks5://127.0.0.1:9150".to_string());
        let settings = apply_cli_args(settings, &args).unwrap();
        assert_eq!(settings.probe.concurrency, 12);
        assert_eq!(settings.probe.timeout, Duration::from_secs(120));
        assert_eq!(settings.probe.proxy, "socks5://127.0.0.1:9150");
        assert_eq!(settings.database.as_deref(), Some("env.json"));
        // Absent CLI flags keep lower-precedence values
        assert!(settings.verbose);
        assert!(settings.probe.use_proxy);
    }

    #[test]
    fn test_tor_flag_enables_proxy() {
        let mut args = create_test_args();
        args.tor = true;
        let settings = apply_cli_args(Settings::default(), &args).unwrap();
        assert!(settings.probe.use_proxy);
        assert_eq!(settings.probe.proxy, investigo_lib::DEFAULT_PROXY);
    }

    #[test]
    fn test_missing_configured_catalog_is_fatal() {
        assert!(load_catalog(Some("/nonexistent/investigo/data.json"), &[]).is_err());
    }

    #[test]
    fn test_site_filter_with_no_match_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{}").unwrap();
        let path = path.to_string_lossy().to_string();

        let only_bundled = load_catalog(Some(&path), &[]).unwrap();
        assert_eq!(only_bundled.len(), 3);

        let naver = load_catalog(Some(&path), &["naver".to_string()]).unwrap();
        assert_eq!(naver.names(), vec!["NAVER"]);

        assert!(load_catalog(Some(&path), &["nowhere".to_string()]).is_err());
    }
}
