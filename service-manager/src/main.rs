use clap::Parser;
use edgeflow_protocol::{AdminCommand, AdminResponse, ErrorKind, LineChannel};
use log::{error, info, warn};
use service_manager::api::handle_command;
use service_manager::event_bus::EventBus;
use service_manager::registry::DescriptorScanner;
use service_manager::{Collaborators, ManagerConfig, Orchestrator};
use std::path::PathBuf;
use tokio::io::{stdin, stdout, BufReader};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Edgeflow service manager daemon", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./edgeflow.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Executable launching a service process
    #[arg(short, long, default_value = "edgeflow-launcher")]
    launcher: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ManagerConfig::load(args.config.as_deref())?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();
    info!("=== Service Manager Starting ===");

    // 1. Collaborators
    let bus = EventBus::default();
    let collaborators = Collaborators::local(&config, args.launcher, &bus);
    let orchestrator = Orchestrator::new(config.clone(), collaborators);

    // 2. Notifications go to the log
    let mut notifications = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => info!(
                    "Event: {:?} {:?} at {}",
                    notification.topic, notification.mutation, notification.timestamp
                ),
                Err(RecvError::Lagged(skipped)) => warn!("Event: {} notifications skipped", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 3. Artifacts present at startup
    if let Some(dir) = &config.artifacts_dir {
        match DescriptorScanner::new(dir).scan().await {
            Ok(uris) => {
                for uri in uris {
                    match orchestrator.add_artifact(&uri).await {
                        Ok(id) => info!("Loaded artifact '{}' from {}", id, uri),
                        Err(e) => warn!("Skipping {}: {}", uri, e),
                    }
                }
            }
            Err(e) => error!("Failed to scan {}: {}", dir, e),
        }
    }

    // 4. Command loop on stdin/stdout
    info!("Reading commands from stdin");
    let mut channel = LineChannel::new(BufReader::new(stdin()), stdout());
    loop {
        let command = match channel.recv::<AdminCommand>().await {
            Ok(Some(command)) => command,
            Ok(None) => break,
            Err(e) => {
                let response = AdminResponse::Error {
                    kind: ErrorKind::Protocol,
                    message: format!("{:#}", e),
                };
                channel.send(&response).await?;
                continue;
            }
        };
        let shutdown = command == AdminCommand::Shutdown;
        let response = handle_command(&orchestrator, command).await;
        channel.send(&response).await?;
        if shutdown {
            break;
        }
    }

    info!("=== Service Manager Stopped ===");
    Ok(())
}
