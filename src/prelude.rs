//! Prelude module for the RDA client library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use rdams_client::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rdams_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let source = FileCredentials::new("./rdamspw.txt", Box::new(TerminalPrompt));
//!     let mut client = RdaClient::new(&config, Box::new(source))?;
//!
//!     let summary = client.summary(&DatasetId::normalize("083.2")?).await?;
//!     println!("{}", summary.render());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    // Client
    ApiResponse,
    BulkFetcher,
    ClientConfig,
    // Data types
    DatasetId,
    FetchObserver,
    FetchReport,
    FileDescriptor,
    FileList,
    NullObserver,
    RdaClient,
    RequestIndex,

    // Helpers
    load_request_payload,
    parse_file_list,
};

// Credentials
pub use crate::auth::{CredentialSource, Credentials, FileCredentials, TerminalPrompt};

// Configuration
pub use crate::config::{AppConfig, AuthMode};
