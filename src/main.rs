//! querychat - conversational SQL front end.

use std::io::IsTerminal;
use std::sync::Arc;

use querychat::backend::{BackendClient, HttpBackend, MockBackend};
use querychat::cli::Cli;
use querychat::confirm::ChannelConfirmationGate;
use querychat::error::{QueryChatError, Result};
use querychat::logging;
use querychat::orchestrator::Orchestrator;
use querychat::render::html;
use querychat::repl::{Repl, QUIT_COMMAND};
use querychat::timeline::Timeline;
use tokio::io::BufReader;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse_args();

    let interactive = std::io::stdin().is_terminal();
    if cli.log_stderr || !interactive {
        if let Err(e) = logging::init_stderr_logging() {
            eprintln!("Warning: {e}");
        }
    } else if let Err(e) = logging::init_file_logging() {
        eprintln!("Warning: {e}");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli, interactive)) {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, interactive: bool) -> Result<()> {
    let config = cli.resolve_config()?;

    let backend: Arc<dyn BackendClient> = if cli.mock_backend {
        info!("Using mock backend");
        Arc::new(MockBackend::new())
    } else {
        let http = HttpBackend::new(&config.backend)?;
        info!("Backend: {}", http.base_url());
        Arc::new(http)
    };

    let timeline = Timeline::new();
    let (gate, confirmations) = ChannelConfirmationGate::new();
    let orchestrator = Orchestrator::new(backend, Arc::new(gate), timeline.clone());

    if interactive {
        println!("querychat {}", env!("CARGO_PKG_VERSION"));
        println!("Ask a question or enter a SELECT statement. {QUIT_COMMAND} to exit.");
    }

    let repl = Repl::new(
        orchestrator,
        confirmations,
        tokio::io::stdout(),
        config.render.max_column_width,
    );
    let outcomes = repl.run(BufReader::new(tokio::io::stdin())).await?;
    info!(submissions = outcomes.len(), "Session finished");

    if let Some(path) = &cli.transcript {
        tokio::fs::write(path, html::transcript(&timeline.all()))
            .await
            .map_err(|e| {
                QueryChatError::internal(format!(
                    "could not write transcript to {}: {e}",
                    path.display()
                ))
            })?;
        info!("Transcript written to {}", path.display());
    }

    Ok(())
}
