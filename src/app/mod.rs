//! Core application logic for the RDA client
//!
//! This module contains the API client, the request data models, control file
//! handling and the bulk file fetcher.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rdams_client::app::{parse_file_list, BulkFetcher, FileList, NullObserver, RdaClient, RequestIndex};
//! use rdams_client::auth::{FileCredentials, TerminalPrompt};
//! use rdams_client::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let source = FileCredentials::new("./rdamspw.txt", Box::new(TerminalPrompt));
//! let mut client = RdaClient::new(&config, Box::new(source))?;
//!
//! let index: RequestIndex = "123456".parse()?;
//! let response = client.file_list(&index).await?;
//! if let Some(FileList::Files(files)) = response.as_json().map(parse_file_list).transpose()? {
//!     client.login().await?;
//!     let report = BulkFetcher::new(&client)
//!         .fetch_all(&files, "rda_request_123456".as_ref(), &mut NullObserver)
//!         .await?;
//!     println!("{} files downloaded", report.downloaded);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod control;
pub mod fetcher;
pub mod models;

// Re-export main public API
pub use client::{ClientConfig, RdaClient, Session};
pub use control::{load_request_payload, parse_control_file};
pub use fetcher::{BulkFetcher, FetchObserver, FetchReport, NullObserver};
pub use models::{
    parse_file_list, pretty_json, ApiResponse, DatasetId, FileDescriptor, FileList, RequestIndex,
};
