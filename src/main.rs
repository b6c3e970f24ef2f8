use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use mistral_workbooks::config::Config;
use mistral_workbooks::workbooks::{
    self, CreateOpts, ListDateFilter, ListFilter, ListOpts, Scope, SortDir,
};
use mistral_workbooks::{CancelToken, ServiceClient, StaticToken};
use serde::Serialize;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Mistral workbooks
#[derive(Parser, Debug)]
#[command(name = "wbk", version, about, long_about = None)]
struct Args {
    /// Workflow API endpoint (defaults to the config file, then OS_WORKFLOW_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml", global = true)]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a workbook definition
    Create {
        /// File holding the definition
        file: PathBuf,
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },
    /// Show one workbook
    Get { id: String },
    /// List workbooks, following every page
    List(ListArgs),
    /// Delete a workbook
    Delete { id: String },
    /// Store defaults in the config file
    Configure {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Name filter, `value` or `op:value` (op: neq, lt, lte, gt, gte, in)
    #[arg(long, value_parser = parse_filter)]
    name: Option<ListFilter>,
    #[arg(long)]
    namespace: Option<String>,
    #[arg(long, value_parser = parse_scope)]
    scope: Option<Scope>,
    #[arg(long)]
    project_id: Option<String>,
    /// Repeat for several tags
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Date filter, e.g. `gt:2024-01-01 00:00:00`
    #[arg(long, value_parser = parse_date_filter)]
    created_at: Option<ListDateFilter>,
    #[arg(long, value_parser = parse_date_filter)]
    updated_at: Option<ListDateFilter>,
    #[arg(long)]
    marker: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long, value_delimiter = ',')]
    sort_keys: Vec<String>,
    #[arg(long, value_delimiter = ',', value_parser = parse_sort_dir)]
    sort_dirs: Vec<SortDir>,
}

impl From<ListArgs> for ListOpts {
    fn from(args: ListArgs) -> Self {
        Self {
            name: args.name,
            namespace: args.namespace,
            scope: args.scope,
            project_id: args.project_id,
            tags: args.tags,
            created_at: args.created_at,
            updated_at: args.updated_at,
            marker: args.marker,
            limit: args.limit,
            sort_keys: args.sort_keys,
            sort_dirs: args.sort_dirs,
            fields: Vec::new(),
        }
    }
}

fn parse_scope(s: &str) -> std::result::Result<Scope, String> {
    s.parse().map_err(|e: mistral_workbooks::Error| e.to_string())
}

fn parse_filter(s: &str) -> std::result::Result<ListFilter, String> {
    s.parse().map_err(|e: mistral_workbooks::Error| e.to_string())
}

fn parse_date_filter(s: &str) -> std::result::Result<ListDateFilter, String> {
    s.parse().map_err(|e: mistral_workbooks::Error| e.to_string())
}

fn parse_sort_dir(s: &str) -> std::result::Result<SortDir, String> {
    s.parse().map_err(|e: mistral_workbooks::Error| e.to_string())
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("wbk started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("wbk").join("wbk.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".wbk").join("wbk.log");
    }
    PathBuf::from("wbk.log")
}

fn print<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Build the service client and a Ctrl-C aware cancellation token
fn connect(config: &Config, endpoint: Option<&str>) -> Result<(ServiceClient, CancelToken)> {
    let endpoint = config
        .effective_endpoint(endpoint)
        .context("No workflow endpoint configured. Set OS_WORKFLOW_ENDPOINT or use --endpoint")?;
    let token = StaticToken::from_env()?;
    let client = ServiceClient::connect(&endpoint, token)?;

    tracing::info!("Using endpoint: {}", client.endpoint());

    // Ctrl-C aborts whatever request is in flight
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    Ok((client, cancel))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();

    match args.command {
        Command::Create {
            file,
            namespace,
            scope,
        } => {
            let definition = std::fs::read(&file)
                .with_context(|| format!("Failed to read workbook definition {:?}", file))?;
            let mut opts = CreateOpts::new(definition);
            opts.namespace = config.effective_namespace(namespace.as_deref());
            opts.scope = config.effective_scope(scope);

            let (client, cancel) = connect(&config, args.endpoint.as_deref())?;
            let workbook = workbooks::create(&client, &cancel, &opts).await?;
            print(args.output, &workbook)?;
        }
        Command::Get { id } => {
            let (client, cancel) = connect(&config, args.endpoint.as_deref())?;
            let workbook = workbooks::get(&client, &cancel, &id).await?;
            print(args.output, &workbook)?;
        }
        Command::List(list_args) => {
            let mut opts = ListOpts::from(list_args);
            opts.namespace = config.effective_namespace(opts.namespace.as_deref());

            let (client, cancel) = connect(&config, args.endpoint.as_deref())?;
            let workbooks = workbooks::list_all(&client, &cancel, &opts).await?;
            print(args.output, &workbooks)?;
        }
        Command::Delete { id } => {
            let (client, cancel) = connect(&config, args.endpoint.as_deref())?;
            workbooks::delete(&client, &cancel, &id).await?;
            eprintln!("Deleted workbook {}", id);
        }
        Command::Configure {
            endpoint,
            namespace,
            scope,
        } => {
            if endpoint.is_some() {
                config.endpoint = endpoint;
            }
            if namespace.is_some() {
                config.namespace = namespace;
            }
            if scope.is_some() {
                config.scope = scope;
            }
            config.save().context("Failed to save configuration")?;
            print(args.output, &config)?;
        }
    }

    Ok(())
}
