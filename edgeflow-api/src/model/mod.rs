pub mod artifact;
pub mod connector;
pub mod ids;
pub mod kind;
pub mod options;
pub mod parameter;
pub mod server;
pub mod service;
pub mod state;
