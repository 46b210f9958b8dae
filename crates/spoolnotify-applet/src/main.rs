// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolnotify — new-printer notification agent.
//
// Entry point. Parses the command line, initialises logging, connects to the
// buses, exports the RPC object and runs the notification service on a
// single-threaded runtime.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use zbus::Connection;

use spoolnotify_bridge::{ActionDispatcher, DesktopNotifier, viewer_factory};
use spoolnotify_core::AppConfig;
use spoolnotify_core::config::default_config_path;
use spoolnotify_core::error::Result;
use spoolnotify_print::{CupsSpooler, PpdDriverResolver};

use services::bus::{self, BusSpoolerSignals, bus_error};
use services::event::ServiceEvent;
use services::notification_service::{NotificationService, ServiceSettings};

#[derive(Parser, Debug)]
#[command(
    name = "spoolnotify-applet",
    version,
    about = "Desktop notifications for newly added printers"
)]
struct Cli {
    /// Run without desktop notifications or the RPC service
    #[arg(long)]
    no_tray_icon: bool,

    /// Verbose logging; also skips waiting for a first print job
    #[arg(long)]
    debug: bool,

    /// Configuration file (default: $XDG_CONFIG_HOME/spoolnotify/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version are not errors; everything else exits 1.
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "spoolnotify-applet exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = AppConfig::load_or_default(&config_path);
    let tray_icon = !cli.no_tray_icon;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        tray_icon,
        debug = cli.debug,
        spooler = %format!("{}:{}", config.spooler_host, config.spooler_port),
        "spoolnotify-applet starting"
    );

    // Desktop notifications need the session bus; without it there is no
    // point running in tray mode.
    let session = if tray_icon {
        let session = Connection::session().await.map_err(|e| {
            error!(error = %e, "failed to connect to session bus");
            bus_error(e)
        })?;
        Some(session)
    } else {
        None
    };

    let system = Connection::system().await.map_err(|e| {
        error!(error = %e, "failed to connect to system bus");
        bus_error(e)
    })?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let service_running = if tray_icon {
        match bus::export_service(&system, events_tx.clone()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to start NewPrinterNotification service");
                false
            }
        }
    } else {
        false
    };

    let notifier = match &session {
        Some(session) => {
            let dispatcher = ActionDispatcher::from_config(&config);
            match DesktopNotifier::connect(session, &config.app_name, dispatcher).await {
                Ok(notifier) => Some(notifier),
                Err(e) => {
                    warn!(error = %e, "notification daemon unavailable");
                    None
                }
            }
        }
        None => None,
    };

    let settings = ServiceSettings::from_config(&config, tray_icon, service_running, cli.debug);
    let mut service = NotificationService::new(
        CupsSpooler::from_config(&config)?,
        PpdDriverResolver::from_config(&config),
        viewer_factory(notifier),
        BusSpoolerSignals::new(system.clone()),
        settings,
        events_tx.clone(),
    );

    // Graceful shutdown on Ctrl+C.
    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(ServiceEvent::Shutdown);
            }
        });
    }
    drop(events_tx);

    service.start().await;
    service.run(events_rx).await;

    drop(session);
    info!("spoolnotify-applet stopped");
    Ok(())
}
