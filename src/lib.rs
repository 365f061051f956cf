//! gdrive_sheets - Typed convenience layer over Google Drive and Google Sheets.
//!
//! This library provides functionality to:
//! - Upload files into a folder path, creating missing folders on the way
//! - Share files and transfer ownership
//! - List, download and delete Drive files and query storage quota
//! - Read a spreadsheet tab and write cells, rows, columns and ranges by
//!   logical data-row index (header and offset rows are accounted for)
//! - Delete spreadsheet rows
//!
//! # Example
//!
//! ```no_run
//! use gdrive_sheets::{ClientConfig, GoogleClient, UploadOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::from_file("service-account.json")?;
//!     let client = GoogleClient::new(&config)?;
//!
//!     let file = client
//!         .drive()
//!         .upload_file("report.pdf", &UploadOptions::to_folder_path("Reports/2024"))
//!         .await?;
//!     println!("{}", file);
//!
//!     let url = "https://docs.google.com/spreadsheets/d/1abc123def/edit";
//!     let data = client.sheets().read_rows(url, "Sheet1", 0).await?;
//!     println!("{:?}", data.headers);
//!
//!     Ok(())
//! }
//! ```

pub mod a1;
pub mod auth;
pub mod client;
pub mod config;
pub mod drive;
pub mod error;
pub mod folders;
pub mod models;
pub mod sheets;
pub mod url_parser;

// Re-exports for convenience
pub use a1::{column_index_to_letter, column_letter_to_index, data_row_to_sheet_row};
pub use auth::Authenticator;
pub use client::GoogleClient;
pub use config::{ClientConfig, CredentialsSource};
pub use drive::{DriveClient, UploadOptions};
pub use error::{GoogleError, Result};
pub use folders::parse_folder_path;
pub use models::{CellUpdate, FileMetadata, Permission, Role, SheetData};
pub use sheets::SheetsClient;
pub use url_parser::{extract_id, extract_spreadsheet_id};
