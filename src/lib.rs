#[macro_use]
extern crate log;

pub mod config;
pub mod qb;
pub mod server;
pub mod tools;

pub use config::Config;
pub use qb::QbClient;
pub use server::Server;
pub use tools::Tools;
