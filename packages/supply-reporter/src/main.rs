//! Supply reporter daemon

use tracing::info;

use supply_reporter::ledger::LcdLedger;
use supply_reporter::submitter::OracleSubmitter;
use supply_reporter::{Config, SupplyReporter, SupplySource};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    info!("Starting supply reporter");

    let config = Config::load()?;
    info!(
        oracle = %config.oracle_address,
        oracle_lcd = %config.oracle_lcd_url,
        ledgers = config.ledgers.len(),
        "Configuration loaded"
    );

    let sources = config
        .ledgers
        .iter()
        .cloned()
        .map(|ledger| LcdLedger::new(ledger).map(|l| Box::new(l) as Box<dyn SupplySource>))
        .collect::<eyre::Result<Vec<_>>>()?;
    let submitter = OracleSubmitter::new(&config)?;

    let mut reporter = SupplyReporter::new(
        sources,
        Box::new(submitter),
        config.poll_interval(),
        config.refresh_interval(),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(()).await;
    });

    reporter.run(shutdown_rx).await?;

    info!("Supply reporter stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,supply_reporter=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
