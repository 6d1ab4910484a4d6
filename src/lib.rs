// sermon-assist - generation proxy and offline asset cache for the sermon preparation assistant

pub mod assets;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod proxy;
pub mod server;
pub mod utils;
