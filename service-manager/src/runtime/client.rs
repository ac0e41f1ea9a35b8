use anyhow::{Context, Result};
use async_trait::async_trait;
use edgeflow_api::{Service, ServiceState};
use edgeflow_protocol::{ControlRequest, ControlResponse, LineChannel};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpStream;

use crate::runtime::traits::{admin_key, ControlStub, NetworkManager, StubFactory};

/// Talks to a running service through its admin port.
///
/// Each call opens a connection, sends one newline-delimited JSON request and waits for
/// one reply.
pub struct TcpControlStub {
    service_id: String,
    address: String,
    timeout: Duration,
}

impl TcpControlStub {
    pub fn new(service_id: &str, address: &str, timeout: Duration) -> Self {
        Self {
            service_id: service_id.to_string(),
            address: address.to_string(),
            timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn call(&self, request: ControlRequest) -> Result<ControlResponse> {
        let exchange = async {
            let stream = TcpStream::connect(&self.address)
                .await
                .with_context(|| format!("Failed to connect to {}", self.address))?;
            let (reader, writer) = stream.into_split();
            let mut channel = LineChannel::new(BufReader::new(reader), writer);
            channel.call::<_, ControlResponse>(&request).await
        };
        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .with_context(|| format!("'{}' did not answer in time", self.service_id))??;
        match response {
            ControlResponse::Error(message) => {
                anyhow::bail!("'{}' rejected the request: {}", self.service_id, message)
            }
            other => Ok(other),
        }
    }

    async fn call_for_state(&self, request: ControlRequest) -> Result<ServiceState> {
        match self.call(request).await? {
            ControlResponse::State(state) => Ok(state),
            other => anyhow::bail!("unexpected reply from '{}': {:?}", self.service_id, other),
        }
    }
}

#[async_trait]
impl ControlStub for TcpControlStub {
    async fn activate(&self) -> Result<()> {
        self.call(ControlRequest::Activate).await.map(|_| ())
    }

    async fn passivate(&self) -> Result<()> {
        self.call(ControlRequest::Passivate).await.map(|_| ())
    }

    async fn reconfigure(&self, values: &HashMap<String, String>) -> Result<()> {
        self.call(ControlRequest::Reconfigure {
            values: values.clone(),
        })
        .await
        .map(|_| ())
    }

    async fn state(&self) -> Result<ServiceState> {
        self.call_for_state(ControlRequest::GetState).await
    }

    async fn set_state(&self, state: ServiceState) -> Result<ServiceState> {
        match self.call(ControlRequest::SetState { state }).await? {
            ControlResponse::State(reported) => Ok(reported),
            _ => Ok(state),
        }
    }
}

/// Creates [`TcpControlStub`]s from the admin addresses registered at the network manager.
/// Ensemble members share the process, and thus the admin address, of their leader.
pub struct TcpStubFactory {
    network: Arc<dyn NetworkManager>,
    timeout: Duration,
}

impl TcpStubFactory {
    pub fn new(network: Arc<dyn NetworkManager>, timeout: Duration) -> Self {
        Self { network, timeout }
    }
}

#[async_trait]
impl StubFactory for TcpStubFactory {
    async fn attach(&self, service: &Service) -> Result<Arc<dyn ControlStub>> {
        let host = service.ensemble_leader().unwrap_or(service.id());
        let key = admin_key(host);
        let address = self
            .network
            .port(&key)
            .with_context(|| format!("No admin address registered under '{}'", key))?;
        Ok(Arc::new(TcpControlStub::new(
            service.id(),
            &address,
            self.timeout,
        )))
    }
}
