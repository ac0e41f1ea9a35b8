pub mod client;
pub mod local;
pub mod network;
pub mod port_allocator;
pub mod traits;

pub use client::{TcpControlStub, TcpStubFactory};
pub use local::ProcessSubstrate;
pub use network::LocalNetworkManager;
pub use traits::{
    admin_key, ControlStub, DeploymentRequest, DeploymentState, NetworkManager, StatusReport,
    StubFactory, Substrate,
};
