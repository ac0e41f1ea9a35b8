use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edgeflow_protocol::{AdminCommand, AdminResponse};
use service_manager::api::handle_command;
use service_manager::event_bus::EventBus;
use service_manager::layout::classifier::{
    determine_external_connections, determine_functional_connections,
    determine_internal_connections, function_definition,
};
use service_manager::layout::{schedule, AlwaysAvailable, ConnectorView, ScheduleDirection};
use service_manager::registry::{ArtifactResolver, FileArtifactResolver};
use service_manager::{Collaborators, ManagerConfig, Orchestrator};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deployctl")]
#[command(about = "Inspect artifact descriptors and drive an in-process service manager")]
struct Cli {
    /// Artifact descriptor files (JSON)
    #[arg(short, long = "descriptor", global = true)]
    descriptors: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the descriptors load and register together
    Validate,
    /// Print the start (or stop) sequence of services
    Plan {
        /// Service ids, in request order
        #[arg(required = true)]
        services: Vec<String>,
        /// Print the stop sequence instead
        #[arg(long)]
        stop: bool,
    },
    /// Classify the connectors of a set of services
    Connections {
        #[arg(required = true)]
        services: Vec<String>,
    },
    /// Execute one admin command (JSON) against a manager holding the descriptors
    Exec {
        /// e.g. '{"StartService":{"ids":["s1"]}}'
        command: String,
        /// Executable launching service processes
        #[arg(short, long, default_value = "edgeflow-launcher")]
        launcher: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let launcher = match &cli.command {
        Commands::Exec { launcher, .. } => launcher.clone(),
        _ => PathBuf::from("edgeflow-launcher"),
    };
    let config = ManagerConfig::load(None)?;
    let bus = EventBus::default();
    let orchestrator = Orchestrator::new(config.clone(), Collaborators::local(&config, launcher, &bus));
    load(&orchestrator, &cli.descriptors).await?;

    match cli.command {
        Commands::Validate => {
            for artifact in orchestrator.registry().artifacts() {
                println!(
                    "OK: {} ({} services, {} servers)",
                    artifact.id(),
                    artifact.service_ids().len(),
                    artifact.servers().len()
                );
            }
        }
        Commands::Plan { services, stop } => {
            let direction = if stop {
                ScheduleDirection::Stop
            } else {
                ScheduleDirection::Start
            };
            let topology = orchestrator.registry().topology();
            let plan = schedule(&services, &topology, &AlwaysAvailable, direction);
            for (index, id) in plan.order.iter().enumerate() {
                let marker = if plan.fallback.contains(id) { " (unordered)" } else { "" };
                println!("{:>3}. {}{}", index + 1, id, marker);
            }
        }
        Commands::Connections { services } => {
            let topology = orchestrator.registry().topology();
            print_views("EXTERNAL", &determine_external_connections(&topology, &services));
            print_views("INTERNAL", &determine_internal_connections(&topology, &services));
            let functional = determine_functional_connections(&topology, &services);
            print_views("FUNCTIONAL", &functional);
            println!("FUNCTIONS: {}", function_definition(&functional));
        }
        Commands::Exec { command, .. } => {
            let command: AdminCommand =
                serde_json::from_str(&command).context("Invalid admin command JSON")?;
            let response = handle_command(&orchestrator, command).await;
            print_response(response);
        }
    }

    Ok(())
}

async fn load(orchestrator: &Orchestrator, files: &[String]) -> Result<()> {
    let resolver = FileArtifactResolver::new();
    for file in files {
        let spec = resolver.resolve(file).await?;
        orchestrator
            .add_artifact_spec(spec)
            .with_context(|| format!("Failed to register {}", file))?;
    }
    Ok(())
}

fn print_views(title: &str, views: &[ConnectorView]) {
    println!("{}", title);
    println!("{:<20} | {:<4} | {:<20} | {:<20}", "CHANNEL", "DIR", "SERVICE", "PARTNER");
    println!("{:-<20}-+-{:-<4}-+-{:-<20}-+-{:-<20}", "", "", "", "");
    for view in views {
        println!(
            "{:<20} | {:<4} | {:<20} | {:<20}",
            view.channel(),
            format!("{:?}", view.direction),
            view.service(),
            view.partner.as_deref().unwrap_or("-")
        );
    }
}

fn print_response(resp: AdminResponse) {
    match resp {
        AdminResponse::Success(msg) => println!("SUCCESS: {}", msg),
        AdminResponse::Id(id) => println!("ID: {}", id),
        AdminResponse::State(state) => println!("STATE: {}", state),
        AdminResponse::Count(count) => println!("COUNT: {}", count),
        AdminResponse::Artifacts(artifacts) => {
            println!("{:<24} | {:<24} | {:<6}", "ARTIFACT", "SERVICE", "STATE");
            println!("{:-<24}-+-{:-<24}-+-{:-<6}", "", "", "");
            for artifact in artifacts {
                for service in artifact.services {
                    println!("{:<24} | {:<24} | {}", artifact.id, service.id, service.state);
                }
            }
        }
        AdminResponse::Error { kind, message } => eprintln!("ERROR ({:?}): {}", kind, message),
    }
}
