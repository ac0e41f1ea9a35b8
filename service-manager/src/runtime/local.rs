use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::process::{Child, Command};

use crate::runtime::traits::{DeploymentRequest, DeploymentState, StatusReport, Substrate};

/// Runs every deployment as a local process of one launcher executable.
///
/// The launcher receives the deployment as command-line arguments:
///
/// ```text
/// <launcher> --service <id> --artifact <uri> [--functions <def>] [--admin <address>]
///            [--member <id>]... [<service args>...]
/// ```
///
/// and the memory cap, if any, as `EDGEFLOW_MEMORY_MB`.
pub struct ProcessSubstrate {
    launcher: PathBuf,
    /// Map deployment id -> process.
    processes: Arc<Mutex<HashMap<String, Deployment>>>,
}

struct Deployment {
    service_id: String,
    child: Child,
}

impl ProcessSubstrate {
    pub fn new(launcher: impl Into<PathBuf>) -> Self {
        Self {
            launcher: launcher.into(),
            processes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn command(&self, request: &DeploymentRequest) -> Command {
        let mut cmd = Command::new(&self.launcher);
        cmd.arg("--service").arg(&request.service_id);
        cmd.arg("--artifact").arg(&request.artifact_uri);
        if !request.function_definition.is_empty() {
            cmd.arg("--functions").arg(&request.function_definition);
        }
        if let Some(admin) = &request.admin_address {
            cmd.arg("--admin").arg(admin);
        }
        for member in &request.ensemble_members {
            cmd.arg("--member").arg(member);
        }
        cmd.args(&request.args);
        if let Some(memory) = request.memory {
            cmd.env("EDGEFLOW_MEMORY_MB", memory.to_string());
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Substrate for ProcessSubstrate {
    async fn deploy(&self, request: &DeploymentRequest) -> Result<String> {
        info!(
            "Runtime: Spawning '{}' via {:?}",
            request.service_id, self.launcher
        );
        let child = self
            .command(request)
            .spawn()
            .with_context(|| format!("Failed to spawn process for '{}'", request.service_id))?;

        let deployment_id = uuid::Uuid::new_v4().to_string();
        info!(
            "Runtime: '{}' running as PID {:?}, deployment {}",
            request.service_id,
            child.id(),
            deployment_id
        );
        self.processes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                deployment_id.clone(),
                Deployment {
                    service_id: request.service_id.clone(),
                    child,
                },
            );
        Ok(deployment_id)
    }

    async fn status(&self, deployment_id: &str) -> Result<StatusReport> {
        let mut map = self.processes.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(deployment) = map.get_mut(deployment_id) else {
            return Ok(StatusReport::new(DeploymentState::Undeployed));
        };
        match deployment.child.try_wait()? {
            None => Ok(StatusReport::new(DeploymentState::Deployed)),
            Some(status) if status.success() => {
                map.remove(deployment_id);
                Ok(StatusReport::new(DeploymentState::Undeployed))
            }
            Some(status) => {
                let log = format!("'{}' exited with {}", deployment.service_id, status);
                map.remove(deployment_id);
                Ok(StatusReport::failed(log))
            }
        }
    }

    async fn undeploy(&self, deployment_id: &str) -> Result<()> {
        let deployment = {
            self.processes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(deployment_id)
        };
        match deployment {
            Some(mut deployment) => {
                info!("Runtime: Killing '{}'", deployment.service_id);
                deployment
                    .child
                    .kill()
                    .await
                    .with_context(|| format!("Failed to kill '{}'", deployment.service_id))
            }
            None => {
                warn!("Runtime: Unknown deployment {}", deployment_id);
                Ok(())
            }
        }
    }
}
