//! # Dymis Analysis Client
//!
//! HTTP client for the Dymis content-analysis service.
//!
//! ## Example
//!
//! ```no_run
//! use dymis_client::{AnalysisClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads DYMIS_API_BASE_URL and DYMIS_API_KEY
//!     let client = AnalysisClient::new(ClientConfig::from_env()?)?;
//!
//!     let result = client.execute("The moon landing was staged.").await?;
//!     println!("Trust score: {}", result.trust_score);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Single-shot analysis requests with input validation
//! - One normalized error per failed call (see [`dymis_core::ErrorKind`])
//! - Backend health probe

pub mod client;
pub mod config;

pub use client::AnalysisClient;
pub use config::{ClientConfig, ConfigError};
