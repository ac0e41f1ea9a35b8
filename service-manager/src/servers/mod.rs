pub mod manager;
pub mod process;

pub use manager::{Server, ServerFactory, ServerManager};
pub use process::{ProcessServer, ProcessServerFactory};
