//! Resume ingestion service: upload, text extraction, AI analysis with a
//! heuristic fallback, and status polling over HTTP.

pub mod analysis;
pub mod config;
pub mod db;
pub mod errors;
pub mod extraction;
pub mod llm_client;
pub mod models;
pub mod owner;
pub mod resumes;
pub mod routes;
pub mod state;
