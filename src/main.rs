use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vipdb_search::catalog::{load_dataset, DatasetLocation};
use vipdb_search::config::{
    default_config_path, find_config_file, get_config, load_config, write_default_config, Config,
};
use vipdb_search::mcp::McpServer;
use vipdb_search::models::{fields, ConstraintSet, QueryRequest, QueryResponse, YearRange};
use vipdb_search::search::{DetailEntry, QueryCoordinator, Session};
use vipdb_search::ui::{self, Spinner, Status};

/// VIPDB - Search the catalog of variant interpretation tools
#[derive(Parser, Debug)]
#[command(name = "vipdb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search the VIP tool catalog by PubMed ID, fuzzy text or structured filters", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset path or http(s) URL (overrides the configured location)
    #[arg(long, short, global = true)]
    data: Option<String>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        if self == OutputFormat::Auto {
            if ui::is_terminal() {
                OutputFormat::Table
            } else {
                OutputFormat::Json
            }
        } else {
            self
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the catalog by free text and/or structured filters
    #[command(alias = "s")]
    Search {
        /// Free-text query (an exact PubMed ID returns that record only)
        query: Option<String>,

        /// Title contains (case-insensitive)
        #[arg(long)]
        title: Option<String>,

        /// VIP name contains (case-insensitive)
        #[arg(long)]
        vip_name: Option<String>,

        /// VIP family name contains (case-insensitive)
        #[arg(long)]
        family: Option<String>,

        /// PubMed ID contains (case-insensitive)
        #[arg(long)]
        id: Option<String>,

        /// Inclusive lower year bound
        #[arg(long)]
        year_from: Option<String>,

        /// Inclusive upper year bound
        #[arg(long)]
        year_to: Option<String>,

        /// Exact-value filter, e.g. --filter Database=1 (repeatable)
        #[arg(long, short)]
        filter: Vec<String>,

        /// Page to show (1-based, clamped to the last page)
        #[arg(long, short, default_value_t = 1)]
        page: usize,

        /// Also show the details of the first result
        #[arg(long)]
        details: bool,
    },

    /// Show every field of a record by PubMed ID
    Show {
        /// PubMed ID
        id: String,
    },

    /// Interactive search with paging
    #[command(alias = "b")]
    Browse,

    /// List searchable, filterable and detail-priority fields
    Fields,

    /// Write a default configuration file
    InitConfig {
        /// Destination (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run the MCP server (for Claude Desktop and other MCP clients)
    Serve {
        /// Run in HTTP/SSE mode on the given address instead of stdio
        #[arg(long, value_name = "ADDR")]
        http: Option<String>,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("VIPDB - Environment Variables");
    println!();
    println!("Dataset Settings:");
    println!("  VIPDB_DATASET__LOCATION           Dataset path or http(s) URL (default: vipdb.json)");
    println!("  VIPDB_DATASET__TIMEOUT_SECONDS    Timeout for a remote dataset (default: 30)");
    println!();
    println!("Search Settings:");
    println!("  VIPDB_SEARCH__THRESHOLD           Fuzzy acceptance threshold, 0.0-1.0 (default: 0.35)");
    println!("  VIPDB_SEARCH__MAX_FUZZY_RESULTS   Maximum fuzzy matches kept (default: 50)");
    println!("  VIPDB_SEARCH__PAGE_SIZE           Results per page (default: 50)");
    println!();
    println!("Logging:");
    println!("  VIPDB_LOGGING__LEVEL              Default log level (default: info)");
    println!("  RUST_LOG                          Rust logging filter (overrides everything else)");
    println!();
    println!("Proxy Settings:");
    println!("  HTTP_PROXY                        HTTP proxy URL (e.g., http://proxy:8080)");
    println!("  HTTPS_PROXY                       HTTPS proxy URL (e.g., https://proxy:8080)");
    println!();
    println!("Example:");
    println!("  export VIPDB_DATASET__LOCATION=\"https://example.org/vipdb.json\"");
    println!("  export VIPDB_SEARCH__PAGE_SIZE=\"20\"");
    std::process::exit(0);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => get_config()?,
    };

    // Initialize tracing based on verbosity; logs go to stderr so stdout
    // stays clean for results and the stdio MCP transport
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("vipdb={0},vipdb_search={0}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let format = cli.output.resolve();

    // Commands that don't need the dataset
    match &cli.command {
        Some(Commands::Fields) => {
            output_fields(format);
            return Ok(());
        }
        Some(Commands::InitConfig { path, force }) => {
            let path = path
                .clone()
                .or_else(default_config_path)
                .ok_or_else(|| anyhow::anyhow!("Could not determine the config directory"))?;
            let written = write_default_config(&path, *force)?;
            if !cli.quiet {
                ui::print_status(
                    Status::Success,
                    &format!(
                        "Wrote default configuration to {} (dataset: {})",
                        path.display(),
                        written.dataset.location
                    ),
                );
            }
            return Ok(());
        }
        _ => {}
    }

    let coordinator = Arc::new(open_catalog(&config, cli.data.as_deref(), cli.quiet).await);

    match cli.command {
        Some(Commands::Search {
            query,
            title,
            vip_name,
            family,
            id,
            year_from,
            year_to,
            filter,
            page,
            details,
        }) => {
            let mut constraints = ConstraintSet::new()
                .title(title.unwrap_or_default())
                .vip_name(vip_name.unwrap_or_default())
                .vip_family_name(family.unwrap_or_default())
                .identifier(id.unwrap_or_default())
                .year(YearRange::parse(year_from.as_deref(), year_to.as_deref()));
            for expr in &filter {
                constraints = constraints.equals_expr(expr)?;
            }

            let request = QueryRequest::new(query.unwrap_or_default()).constraints(constraints);
            let mut session = coordinator.session();
            let mut response = coordinator.run_query(&mut session, &request);
            if page > 1 {
                response = coordinator.go_to_page(&mut session, page);
            }

            let first_details = if details {
                response
                    .results
                    .first()
                    .map(|m| coordinator.get_details(&m.record))
            } else {
                None
            };
            output_response(&response, first_details.as_deref(), format)?;
        }

        Some(Commands::Show { id }) => {
            let record = coordinator
                .find_by_identifier(&id)
                .ok_or_else(|| anyhow::anyhow!("Record not found: {}", id.trim()))?;
            let details = coordinator.get_details(record);
            output_details(&record.display_title(), &details, format)?;
        }

        Some(Commands::Serve { http }) => {
            let server = McpServer::new(coordinator.clone())?;

            if let Some(addr) = http {
                tracing::info!("Running MCP server in HTTP/SSE mode on {}", addr);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                // Wait for the server to finish
                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                tracing::info!("Running MCP server in stdio mode");
                server.run().await?;
            }
        }

        Some(Commands::Browse) | None => {
            run_browse(&coordinator)?;
        }

        Some(Commands::Fields) | Some(Commands::InitConfig { .. }) => unreachable!(),
    }

    Ok(())
}

/// Load the dataset and build the coordinator; a load failure ends the process
async fn open_catalog(config: &Config, data: Option<&str>, quiet: bool) -> QueryCoordinator {
    let raw = data.unwrap_or(&config.dataset.location);
    let timeout = Duration::from_secs(config.dataset.timeout_seconds);

    let spinner = (!quiet).then(|| Spinner::new(&format!("Loading {}", raw)));
    let loaded = match DatasetLocation::parse(raw) {
        Ok(location) => load_dataset(&location, timeout).await,
        Err(e) => Err(e),
    };

    match loaded {
        Ok(store) => {
            if let Some(spinner) = &spinner {
                spinner.finish_with_success(&format!(
                    "Loaded {} records",
                    ui::format_number(store.len())
                ));
            }
            QueryCoordinator::new(Arc::new(store), config.search.options())
        }
        Err(e) => {
            if let Some(spinner) = &spinner {
                spinner.clear();
            }
            ui::print_status(Status::Error, &format!("Data unavailable: {}", e));
            std::process::exit(1);
        }
    }
}

/// Interactive loop: free text queries plus `:` commands
fn run_browse(coordinator: &QueryCoordinator) -> Result<()> {
    let mut session = coordinator.session();
    let response = coordinator.run_query(&mut session, &QueryRequest::default());
    print_page(&response);
    print_browse_help();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "vipdb>".cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let input = line.trim();

        match input {
            ":q" | ":quit" => break,
            ":h" | ":help" => print_browse_help(),
            ":n" | ":next" => {
                if session.page().page() >= session.page().total_pages(session.results().len()) {
                    ui::print_status(Status::Info, "Already on the last page");
                }
                print_page(&coordinator.next_page(&mut session));
            }
            ":p" | ":prev" => {
                if session.page().page() <= 1 {
                    ui::print_status(Status::Info, "Already on the first page");
                }
                print_page(&coordinator.previous_page(&mut session));
            }
            ":clear" => {
                let response = coordinator.run_query(&mut session, &QueryRequest::default());
                print_page(&response);
            }
            _ if input.starts_with(":d") => {
                let arg = input.trim_start_matches(":d").trim();
                match arg.parse::<usize>() {
                    Ok(n) => show_result_details(coordinator, &session, n),
                    Err(_) => ui::print_status(Status::Warning, "Usage: :d N"),
                }
            }
            _ if input.starts_with(':') => {
                ui::print_status(Status::Warning, &format!("Unknown command: {}", input));
            }
            text => {
                let response = coordinator.run_query(&mut session, &QueryRequest::new(text));
                print_page(&response);
                // A non-empty query also opens the first result
                if !text.is_empty() {
                    show_result_details(coordinator, &session, 1);
                }
            }
        }
    }

    Ok(())
}

fn print_browse_help() {
    println!(
        "{}",
        "Type text to search, :n next page, :p previous page, :d N details, :clear, :q quit"
            .dimmed()
    );
}

/// Details of the N-th result (numbered as listed)
fn show_result_details(coordinator: &QueryCoordinator, session: &Session, n: usize) {
    match n.checked_sub(1).and_then(|i| session.results().get(i)) {
        Some(m) => {
            ui::print_section(&m.record.display_title());
            ui::print_details(&coordinator.get_details(&m.record));
        }
        None if session.results().is_empty() => {}
        None => ui::print_status(
            Status::Warning,
            &format!("No result #{} (1-{})", n, session.results().len()),
        ),
    }
}

/// Status line, result cards and paging hints for one page
fn print_page(response: &QueryResponse) {
    ui::print_query_header(response);
    let offset = response.page.saturating_sub(1) * response.page_size;
    for (i, m) in response.results.iter().enumerate() {
        ui::print_record_card(offset + i + 1, &m.record);
    }
    if response.has_previous() || response.has_next() {
        ui::print_divider();
    }
}

fn response_json(response: &QueryResponse) -> Result<Value> {
    let mut value = serde_json::to_value(response)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("summary".to_string(), Value::String(response.summary()));
    }
    Ok(value)
}

fn output_response(
    response: &QueryResponse,
    details: Option<&[DetailEntry]>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut value = response_json(response)?;
            if let (Some(details), Some(obj)) = (details, value.as_object_mut()) {
                obj.insert("details".to_string(), serde_json::to_value(details)?);
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Plain => {
            println!("{}", response.summary());
            for m in &response.results {
                let record = &m.record;
                println!(
                    "{}\t{}\t{}\t{}",
                    record.identifier(),
                    record.display_title(),
                    record.text(fields::VIP_NAME),
                    record.text(fields::DATABASE)
                );
            }
            if let Some(details) = details {
                println!();
                for entry in details {
                    println!("{}: {}", entry.key, entry.value.display_text());
                }
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            ui::print_query_header(response);
            if response.results.is_empty() {
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["#", "PubMed ID", "Title", "VIP", "Database", "Year"]);

            let offset = response.page.saturating_sub(1) * response.page_size;
            for (i, m) in response.results.iter().enumerate() {
                let record = &m.record;
                let year = match record.year() {
                    0 => String::new(),
                    y => y.to_string(),
                };
                table.add_row(vec![
                    Cell::new(offset + i + 1),
                    Cell::new(record.identifier()),
                    Cell::new(ui::truncate_with_ellipsis(&record.display_title(), 50))
                        .add_attribute(Attribute::Bold),
                    Cell::new(ui::truncate_with_ellipsis(&record.text(fields::VIP_NAME), 24)),
                    Cell::new(record.text(fields::DATABASE)),
                    Cell::new(year),
                ]);
            }
            println!("{table}");

            if let (Some(details), Some(first)) = (details, response.results.first()) {
                ui::print_section(&first.record.display_title());
                ui::print_details(details);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}

fn output_details(title: &str, details: &[DetailEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(details)?),
        OutputFormat::Plain => {
            for entry in details {
                println!("{}: {}", entry.key, entry.value.display_text());
            }
        }
        OutputFormat::Table => {
            ui::print_section(title);
            ui::print_details(details);
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}

fn output_fields(format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "searchable": fields::SEARCHABLE_FIELDS,
                "filterable": fields::FILTERABLE_FIELDS,
                "detail_priority": fields::DETAIL_PRIORITY_FIELDS,
            });
            println!("{}", value);
        }
        OutputFormat::Plain => {
            println!("searchable: {}", fields::SEARCHABLE_FIELDS.join(", "));
            println!("filterable: {}", fields::FILTERABLE_FIELDS.join(", "));
            println!("detail_priority: {}", fields::DETAIL_PRIORITY_FIELDS.join(", "));
        }
        OutputFormat::Table => {
            for (title, names) in [
                ("Searchable (fuzzy)", fields::SEARCHABLE_FIELDS),
                ("Filterable (exact value)", fields::FILTERABLE_FIELDS),
                ("Detail order", fields::DETAIL_PRIORITY_FIELDS),
            ] {
                ui::print_section(title);
                for name in names {
                    println!("  {}", name);
                }
            }
        }
        OutputFormat::Auto => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        assert!(!version.is_empty());
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_output_format_values() {
        assert_eq!(OutputFormat::Auto as i32, 0);
        assert_eq!(OutputFormat::Table as i32, 1);
        assert_eq!(OutputFormat::Json as i32, 2);
        assert_eq!(OutputFormat::Plain as i32, 3);
        assert_eq!(OutputFormat::Json.resolve(), OutputFormat::Json);
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["vipdb"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.data.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["vipdb", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["vipdb", "-vv"]);
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["vipdb", "--quiet"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "vipdb",
            "--config",
            "/path/to/vipdb.toml",
            "--data",
            "https://example.org/vipdb.json",
            "-o",
            "json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/vipdb.toml")));
        assert_eq!(cli.data.as_deref(), Some("https://example.org/vipdb.json"));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["vipdb", "search", "polyphen"]);
        match &cli.command {
            Some(Commands::Search {
                query,
                page,
                details,
                filter,
                ..
            }) => {
                assert_eq!(query.as_deref(), Some("polyphen"));
                assert_eq!(*page, 1);
                assert!(!details);
                assert!(filter.is_empty());
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_search_with_options() {
        let cli = Cli::parse_from([
            "vipdb",
            "search",
            "--vip-name",
            "sift",
            "--year-from",
            "2005",
            "--year-to",
            "2015",
            "--filter",
            "Database=1",
            "-f",
            "Gene-specific=0",
            "--page",
            "2",
            "--details",
        ]);
        match &cli.command {
            Some(Commands::Search {
                query,
                vip_name,
                year_from,
                year_to,
                filter,
                page,
                details,
                ..
            }) => {
                assert!(query.is_none());
                assert_eq!(vip_name.as_deref(), Some("sift"));
                assert_eq!(year_from.as_deref(), Some("2005"));
                assert_eq!(year_to.as_deref(), Some("2015"));
                assert_eq!(filter, &vec!["Database=1".to_string(), "Gene-specific=0".to_string()]);
                assert_eq!(*page, 2);
                assert!(*details);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_show_command() {
        let cli = Cli::parse_from(["vipdb", "show", "12345678"]);
        match &cli.command {
            Some(Commands::Show { id }) => assert_eq!(id, "12345678"),
            _ => panic!("Expected Show command"),
        }
    }

    #[test]
    fn test_cli_init_config_command() {
        let cli = Cli::parse_from(["vipdb", "init-config", "--path", "./vipdb.toml", "--force"]);
        match &cli.command {
            Some(Commands::InitConfig { path, force }) => {
                assert_eq!(path, &Some(PathBuf::from("./vipdb.toml")));
                assert!(*force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["vipdb", "serve"]);
        match &cli.command {
            Some(Commands::Serve { http }) => assert!(http.is_none()),
            _ => panic!("Expected Serve command"),
        }

        let cli = Cli::parse_from(["vipdb", "serve", "--http", "127.0.0.1:3000"]);
        match &cli.command {
            Some(Commands::Serve { http }) => {
                assert_eq!(http.as_deref(), Some("127.0.0.1:3000"))
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_browse_alias() {
        let cli = Cli::parse_from(["vipdb", "b"]);
        assert!(matches!(cli.command, Some(Commands::Browse)));
    }
}
