use clap::{Parser, Subcommand};
use colmatch::{load_schema_from_path, AppConfig, RestApi, SchemaMapper, SessionRegistry, TextEmbedder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Semantic column matching between tabular schemas
#[derive(Parser, Debug)]
#[command(name = "colmatch")]
#[command(about = "Match data model columns to source columns by meaning", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propose a mapping and print it as JSON
    Map {
        /// Source schema document
        #[arg(long)]
        source: PathBuf,

        /// Data model schema document
        #[arg(long)]
        data_model: PathBuf,

        /// Print name and description matches with scores instead
        #[arg(long)]
        explain: bool,
    },

    /// Serve reconciliation sessions over HTTP
    Serve {
        /// HTTP API port
        #[arg(long, default_value_t = 8080)]
        http_port: u16,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the mapping output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    // build before any runtime starts: the remote client is blocking
    let embedder = config.build_embedder()?;

    match args.command {
        Command::Map {
            source,
            data_model,
            explain,
        } => run_map(embedder, source, data_model, explain),
        Command::Serve { http_port } => serve(embedder, http_port),
    }
}

fn run_map(
    embedder: Arc<dyn TextEmbedder>,
    source: PathBuf,
    data_model: PathBuf,
    explain: bool,
) -> anyhow::Result<()> {
    let source = load_schema_from_path(&source)?;
    let data_model = load_schema_from_path(&data_model)?;
    let mapper = SchemaMapper::new(embedder, Arc::new(source));

    let output = if explain {
        serde_json::to_string_pretty(&mapper.report(&data_model)?)?
    } else {
        serde_json::to_string_pretty(&mapper.map(&data_model)?)?
    };
    println!("{}", output);
    Ok(())
}

fn serve(embedder: Arc<dyn TextEmbedder>, http_port: u16) -> anyhow::Result<()> {
    info!("Starting colmatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Embedding model: {}", embedder.config().model);

    let registry = Arc::new(SessionRegistry::new(embedder));
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async move {
        let http_handle = std::thread::spawn(move || {
            info!("Starting HTTP server on port {}", http_port);
            let sys = actix_web::rt::System::new();
            sys.block_on(async {
                if let Err(e) = RestApi::start(registry, http_port).await {
                    error!("HTTP server error: {}", e);
                }
            })
        });

        info!("HTTP API: http://localhost:{}/sessions", http_port);

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
            }
            _ = tokio::task::spawn_blocking(move || {
                http_handle.join().ok();
            }) => {
                info!("HTTP server stopped");
            }
        }
    });

    // the HTTP thread is still parked in spawn_blocking after ctrl-c
    runtime.shutdown_background();
    info!("Shutting down...");
    Ok(())
}
