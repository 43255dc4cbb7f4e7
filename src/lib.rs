//! CitiBike Analyst — conversational SQL agent core.

pub mod agent;
pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;
pub mod warehouse;
