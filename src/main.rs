use std::fs;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formatbridge::config::{DEFAULT_HISTORY_DB, DEFAULT_RPC_URL, DEFAULT_VALIDATOR_URL};
use formatbridge::{server, Config, FormatBridge, HistoryBackend, HistoryOutcome};

#[derive(Parser)]
#[command(name = "formatbridge")]
#[command(about = "formatbridge - settings-driven conversion router, validator gateway and usage stats", long_about = None)]
struct Cli {
    #[command(flatten)]
    backends: BackendArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct BackendArgs {
    /// JSON-RPC endpoint of the remote conversion backend
    #[arg(long, global = true, env = "FORMATBRIDGE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Endpoint of the remote validator
    #[arg(long, global = true, env = "FORMATBRIDGE_VALIDATOR_URL", default_value = DEFAULT_VALIDATOR_URL)]
    validator_url: String,

    /// Timeout for each remote call, in seconds
    #[arg(long, global = true, env = "FORMATBRIDGE_TIMEOUT_SECS", default_value_t = 5)]
    timeout_secs: u64,

    /// sled database holding conversion history
    #[arg(long, global = true, env = "FORMATBRIDGE_HISTORY_DB", default_value = DEFAULT_HISTORY_DB)]
    history_db: PathBuf,

    /// Keep history in memory only
    #[arg(long, global = true)]
    memory_history: bool,
}

impl BackendArgs {
    fn config(&self) -> Config {
        Config {
            rpc_url: self.rpc_url.clone(),
            validator_url: self.validator_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            history: if self.memory_history {
                HistoryBackend::Memory
            } else {
                HistoryBackend::Sled(self.history_db.clone())
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (REST + JSON-RPC)
    Serve {
        /// Address to listen on
        #[arg(long, env = "FORMATBRIDGE_HTTP_ADDR", default_value = "0.0.0.0:5000")]
        http_addr: SocketAddr,
    },
    /// Convert a file using the engine named in the settings
    Convert {
        /// Input file path (use '-' for stdin)
        input: String,

        /// Settings file with key=value lines
        #[arg(short, long, conflicts_with = "settings_text")]
        settings: Option<PathBuf>,

        /// Settings given inline; use '\n' between lines
        #[arg(long)]
        settings_text: Option<String>,

        /// User that owns the history entry when savetohistory=true
        #[arg(long)]
        user_id: Option<i64>,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a file with the remote validator
    Validate {
        /// Input file path (use '-' for stdin)
        input: String,

        /// Format to validate as; resolved from settings or detected if omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Settings text consulted for inputformat
        #[arg(long, default_value = "")]
        settings_text: String,
    },
    /// Print usage statistics for a user
    Stats {
        #[arg(long)]
        user_id: i64,
    },
    /// Check the remote conversion backend
    Health,
}

fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        tracing::debug!("[CLI] Reading from STDIN");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        tracing::debug!("[CLI] Reading from file: {}", input);
        fs::read_to_string(input)
    }
}

async fn run_convert(
    bridge: &FormatBridge,
    input: String,
    settings: Option<PathBuf>,
    settings_text: Option<String>,
    user_id: Option<i64>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let input_content = read_input(&input)?;
    let settings_content = match (settings, settings_text) {
        (Some(path), _) => fs::read_to_string(path)?,
        (None, Some(text)) => text.replace("\\n", "\n"),
        (None, None) => String::new(),
    };

    let conversion = bridge.convert(user_id, &input_content, &settings_content).await?;
    let result = conversion.result;

    tracing::info!(
        "[CLI] {} -> {} via {}",
        result.meta.input_format,
        result.meta.output_format,
        result.engine.as_str()
    );
    match conversion.history {
        HistoryOutcome::Saved(id) => tracing::info!("[CLI] Saved to history as {}", id),
        HistoryOutcome::Failed(e) => tracing::warn!("[CLI] Not saved to history: {}", e),
        HistoryOutcome::NotRequested => {}
    }

    if let Some(output_path) = output {
        fs::write(&output_path, result.output)?;
        tracing::info!("[CLI] Written to {:?}", output_path);
    } else {
        io::stdout().write_all(result.output.as_bytes())?;
        io::stdout().flush()?;
    }

    Ok(())
}

async fn run_validate(
    bridge: &FormatBridge,
    input: String,
    format: Option<String>,
    settings_text: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(&input)?;
    let settings_text = settings_text.replace("\\n", "\n");

    let validation = bridge.validate(format.as_deref(), &settings_text, &text).await?;

    if validation.verdict.ok {
        println!("✓ Valid {}", validation.format.to_uppercase());
        Ok(())
    } else {
        println!("✗ Invalid {}", validation.format.to_uppercase());
        for error in &validation.verdict.errors {
            println!("  - {}", error);
        }
        Err("validation failed".into())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let bridge = FormatBridge::from_config(&cli.backends.config())?;

    match cli.command {
        Some(Commands::Convert { input, settings, settings_text, user_id, output }) => {
            run_convert(&bridge, input, settings, settings_text, user_id, output).await
        }
        Some(Commands::Validate { input, format, settings_text }) => {
            run_validate(&bridge, input, format, settings_text).await
        }
        Some(Commands::Stats { user_id }) => {
            let snapshot = bridge.stats(user_id)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Some(Commands::Health) => {
            let ok = bridge.backend_health().await?;
            println!("rpc backend {}: {}", cli.backends.rpc_url, if ok { "ok" } else { "not ok" });
            Ok(())
        }
        Some(Commands::Serve { http_addr }) => {
            server::serve(bridge, http_addr).await?;
            Ok(())
        }
        None => {
            let http_addr: SocketAddr = "0.0.0.0:5000".parse()?;
            server::serve(bridge, http_addr).await?;
            Ok(())
        }
    }
}
