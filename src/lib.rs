pub mod api;
pub mod bolt;
pub mod config;
pub mod db;
pub mod llm;
pub mod logging;
pub mod project;
pub mod prompt;
pub mod session;
pub mod storage;
pub mod upstream;
