pub mod agents;
pub mod autosave;
pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod llm;
pub mod publish;
pub mod runner;
pub mod scheduler;
pub mod store;
pub mod terminal;
