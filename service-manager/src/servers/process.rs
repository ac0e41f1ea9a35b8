use anyhow::{Context, Result};
use edgeflow_api::ServerSpec;
use log::{info, warn};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use crate::servers::manager::{Server, ServerFactory};

/// A server running as an external program.
///
/// The program named by the server's `implementation` is started with
/// `--host <host> --port <port>` followed by the declared arguments.
pub struct ProcessServer {
    id: String,
    command: Vec<String>,
    memory: Option<u64>,
    child: Mutex<Option<Child>>,
}

impl ProcessServer {
    pub fn new(spec: &ServerSpec, host: &str) -> Result<Self> {
        if spec.implementation.trim().is_empty() {
            anyhow::bail!("server '{}' names no implementation", spec.id);
        }
        let mut command = vec![
            spec.implementation.clone(),
            "--host".to_string(),
            host.to_string(),
            "--port".to_string(),
            spec.port.to_string(),
        ];
        command.extend(spec.args.iter().cloned());
        Ok(Self {
            id: spec.id.clone(),
            command,
            memory: spec.memory,
            child: Mutex::new(None),
        })
    }

    pub fn command_line(&self) -> &[String] {
        &self.command
    }
}

impl Server for ProcessServer {
    fn start(&self) -> Result<()> {
        let mut slot = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }
        let (program, args) = self
            .command
            .split_first()
            .context("empty server command")?;
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());
        if let Some(memory) = self.memory {
            cmd.env("EDGEFLOW_MEMORY_MB", memory.to_string());
        }
        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn server '{}'", self.id))?;
        info!("Servers: '{}' running as PID {}", self.id, child.id());
        *slot = Some(child);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let child = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut child) = child else {
            return Ok(());
        };
        if let Err(e) = child.kill() {
            warn!("Servers: '{}' already gone: {}", self.id, e);
        }
        child
            .wait()
            .with_context(|| format!("Failed to reap server '{}'", self.id))?;
        Ok(())
    }
}

/// Creates a [`ProcessServer`] for every server spec.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessServerFactory;

impl ServerFactory for ProcessServerFactory {
    fn create(&self, spec: &ServerSpec, host: &str) -> Result<Arc<dyn Server>> {
        Ok(Arc::new(ProcessServer::new(spec, host)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let mut spec = ServerSpec::new("broker", "localhost", 1883);
        spec.implementation = "mosquitto".into();
        spec.args = vec!["-v".into()];

        let server = ProcessServer::new(&spec, "edge-1").unwrap();
        assert_eq!(
            server.command_line(),
            &["mosquitto", "--host", "edge-1", "--port", "1883", "-v"]
        );
    }

    #[test]
    fn test_missing_implementation() {
        let spec = ServerSpec::new("broker", "localhost", 1883);
        assert!(ProcessServerFactory.create(&spec, "localhost").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_start_and_stop() {
        let mut spec = ServerSpec::new("sleeper", "localhost", 1);
        spec.implementation = "sleep".into();
        // `sleep --host ...` fails fast, which is fine for lifecycle bookkeeping
        let server = ProcessServer::new(&spec, "localhost").unwrap();
        server.start().unwrap();
        server.stop().unwrap();
        server.stop().unwrap();
    }
}
