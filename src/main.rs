//! gdrive_sheets CLI - Google Drive and Google Sheets from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use gdrive_sheets::models::format_size;
use gdrive_sheets::{
    column_letter_to_index, extract_id, ClientConfig, GoogleClient, GoogleError, Permission,
    Role, UploadOptions,
};

/// CLI tool for Google Drive uploads/sharing and Google Sheets edits.
#[derive(Parser)]
#[command(name = "gdrive_sheets")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to service account JSON credentials file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: PathBuf,

    /// Shared Drive ID. Without it, paths resolve from My Drive.
    #[arg(long, env = "SHARED_DRIVE_ID")]
    drive_id: Option<String>,

    /// OAuth scopes to request (defaults to Drive + Sheets).
    #[arg(long = "scope", env = "GOOGLE_SCOPES", value_delimiter = ',')]
    scopes: Vec<String>,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List files in a folder (root when omitted).
    List {
        /// Folder URL or ID.
        folder: Option<String>,
    },

    /// Resolve a folder path, creating missing folders, and print its ID.
    Mkdir {
        /// Slash-separated path, e.g. Reports/2024.
        path: String,
    },

    /// Upload files into a folder.
    Upload {
        /// File patterns to upload (glob patterns like *.csv are expanded).
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Destination folder path, created if missing.
        #[arg(long, short = 'p', conflicts_with = "to")]
        folder_path: Option<String>,

        /// Destination folder URL or ID.
        #[arg(long, short = 't')]
        to: Option<String>,

        /// Do not make uploaded files viewable by anyone with the link.
        #[arg(long)]
        private: bool,

        /// Grant writer access to these emails.
        #[arg(long, value_delimiter = ',')]
        share_with: Vec<String>,

        /// Replace a same-named file in the destination folder.
        #[arg(long)]
        replace: bool,
    },

    /// Download a file to local filesystem.
    Download {
        /// File URL or ID to download.
        file: String,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,
    },

    /// Share a file with a user or with anyone who has the link.
    Share {
        /// File URL or ID.
        file: String,

        /// Email to share with. Omit together with --anyone for a public link.
        #[arg(long, required_unless_present = "anyone")]
        email: Option<String>,

        /// Share with anyone who has the link (read-only).
        #[arg(long, conflicts_with_all = ["email", "transfer"])]
        anyone: bool,

        #[arg(long, value_enum, default_value_t = ShareRole::Reader)]
        role: ShareRole,

        /// Transfer ownership to --email instead of granting --role.
        #[arg(long, requires = "email")]
        transfer: bool,
    },

    /// Show account and storage quota.
    Quota,

    /// Show spreadsheet title and tabs.
    SheetInfo {
        /// Spreadsheet URL.
        url: String,
    },

    /// Print a tab's rows as tab-separated values.
    Read {
        url: String,

        #[arg(long, short = 's')]
        sheet: String,

        /// Rows between the header and the first data row.
        #[arg(long, default_value_t = 0)]
        row_offset: u32,
    },

    /// Set one cell addressed by data row and column letter.
    SetCell {
        url: String,

        #[arg(long, short = 's')]
        sheet: String,

        /// 0-based data row (0 is the first row below the header).
        #[arg(long, short = 'r')]
        row: u32,

        /// Column letter, e.g. B or AA.
        #[arg(long, short = 'c')]
        column: String,

        value: String,

        #[arg(long, default_value_t = 0)]
        row_offset: u32,
    },

    /// Delete data rows.
    DeleteRows {
        url: String,

        #[arg(long, short = 's')]
        sheet: String,

        /// 0-based data row to start at.
        #[arg(long, short = 'r')]
        row: u32,

        #[arg(long, short = 'n', default_value_t = 1)]
        count: u32,

        #[arg(long, default_value_t = 0)]
        row_offset: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShareRole {
    Reader,
    Commenter,
    Writer,
}

impl From<ShareRole> for Role {
    fn from(role: ShareRole) -> Self {
        match role {
            ShareRole::Reader => Role::Reader,
            ShareRole::Commenter => Role::Commenter,
            ShareRole::Writer => Role::Writer,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut builder = ClientConfig::builder()
        .credentials_file(&cli.credentials)
        .scopes(cli.scopes);
    if let Some(drive_id) = cli.drive_id {
        builder = builder.shared_drive(drive_id);
    }
    let config = builder.build().context("Invalid configuration")?;

    let client = GoogleClient::new(&config)
        .with_context(|| format!("Failed to load credentials from {:?}", cli.credentials))?;
    let drive = client.drive();
    let sheets = client.sheets();

    match cli.command {
        Commands::List { folder } => {
            let folder_id = match folder {
                Some(folder) => extract_id(&folder)
                    .with_context(|| format!("Invalid folder URL or ID: {}", folder))?,
                None => drive.root_id().to_string(),
            };

            let files = drive
                .list_files(&folder_id)
                .await
                .with_context(|| format!("Failed to list files in folder: {}", folder_id))?;

            if files.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<44} {:>10} {:<30} {}", "ID", "SIZE", "TYPE", "NAME");
                println!("{}", "-".repeat(100));
                for file in files {
                    println!("{}", file);
                }
            }
        }

        Commands::Mkdir { path } => {
            let id = drive
                .resolve_folder_path(&path)
                .await
                .with_context(|| format!("Failed to resolve folder path: {}", path))?;
            println!("{}", id);
        }

        Commands::Upload {
            patterns,
            folder_path,
            to,
            private,
            share_with,
            replace,
        } => {
            let parent_id = to
                .map(|to| {
                    extract_id(&to).with_context(|| format!("Invalid folder URL or ID: {}", to))
                })
                .transpose()?;

            let files_to_upload = expand_patterns(&patterns)?;
            if files_to_upload.is_empty() {
                anyhow::bail!("No files to upload");
            }

            let options = UploadOptions {
                folder_path,
                parent_id,
                file_name: None,
                make_public: !private,
                share_with,
                replace_existing: replace,
            };

            let total = files_to_upload.len();
            let mut failures = 0;
            for (idx, file_path) in files_to_upload.iter().enumerate() {
                print!("[{}/{}] Uploading {}... ", idx + 1, total, file_path.display());

                match drive.upload_file(file_path, &options).await {
                    Ok(metadata) => {
                        let link = metadata.web_view_link.as_deref().unwrap_or(&metadata.id);
                        println!("OK {}", link);
                    }
                    Err(e) => {
                        failures += 1;
                        println!("FAILED");
                        eprintln!("  {} error: {}", failure_origin(&e), e);
                    }
                }
            }

            if failures > 0 {
                anyhow::bail!("{} of {} uploads failed", failures, total);
            }
        }

        Commands::Download { file, to } => {
            let file_id =
                extract_id(&file).with_context(|| format!("Invalid file URL or ID: {}", file))?;

            if to.is_dir() || to.to_string_lossy().ends_with('/') {
                std::fs::create_dir_all(&to)
                    .with_context(|| format!("Failed to create directory: {:?}", to))?;
            }

            let metadata = drive
                .download_file(&file_id, &to)
                .await
                .with_context(|| format!("Failed to download file: {}", file_id))?;
            println!("Downloaded {}", metadata.name);
        }

        Commands::Share {
            file,
            email,
            anyone,
            role,
            transfer,
        } => {
            let file_id =
                extract_id(&file).with_context(|| format!("Invalid file URL or ID: {}", file))?;

            let result = match (email, anyone, transfer) {
                (Some(email), _, true) => drive.transfer_ownership(&file_id, &email).await,
                (Some(email), false, false) => {
                    drive
                        .share_file(&file_id, &Permission::user(email, role.into()))
                        .await
                }
                _ => drive.share_file(&file_id, &Permission::anyone_reader()).await,
            }
            .with_context(|| format!("Failed to share file: {}", file_id))?;

            println!("Permission {} granted on {}", result.id, file_id);
        }

        Commands::Quota => {
            let about = drive.about().await.context("Failed to query storage quota")?;
            let quota = &about.storage_quota;

            println!(
                "User:    {}",
                about.user.email_address.as_deref().unwrap_or("-")
            );
            println!("Used:    {}", format_size(quota.usage_bytes()));
            match quota.limit_bytes() {
                Some(limit) => {
                    println!("Limit:   {}", format_size(limit));
                    println!("Free:    {}", format_size(quota.available_bytes().unwrap_or(0)));
                }
                None => println!("Limit:   unlimited"),
            }
        }

        Commands::SheetInfo { url } => {
            let info = sheets
                .get_metadata(&url)
                .await
                .with_context(|| format!("Failed to read spreadsheet: {}", url))?;

            println!("{} ({})", info.title, info.spreadsheet_id);
            for sheet in info.sheets {
                println!(
                    "  {:<30} {:>7} rows {:>5} cols  (id {})",
                    sheet.title, sheet.row_count, sheet.column_count, sheet.sheet_id
                );
            }
        }

        Commands::Read {
            url,
            sheet,
            row_offset,
        } => {
            let data = sheets
                .read_rows(&url, &sheet, row_offset)
                .await
                .with_context(|| format!("Failed to read sheet: {}", sheet))?;

            println!("{}", data.headers.join("\t"));
            for row in data.rows {
                let cells: Vec<String> = row.iter().map(cell_text).collect();
                println!("{}", cells.join("\t"));
            }
        }

        Commands::SetCell {
            url,
            sheet,
            row,
            column,
            value,
            row_offset,
        } => {
            let column_index = column_letter_to_index(&column)?;
            let result = sheets
                .update_cell(&url, &sheet, row, column_index, Value::String(value), row_offset)
                .await
                .with_context(|| format!("Failed to update cell in sheet: {}", sheet))?;

            println!(
                "Updated {}",
                result.updated_range.as_deref().unwrap_or("cell")
            );
        }

        Commands::DeleteRows {
            url,
            sheet,
            row,
            count,
            row_offset,
        } => {
            let span = sheets
                .delete_rows(&url, &sheet, row, count, row_offset)
                .await
                .with_context(|| format!("Failed to delete rows in sheet: {}", sheet))?;

            println!(
                "Deleted sheet rows {}-{}",
                span.start_index + 1,
                span.end_index
            );
        }
    }

    Ok(())
}

/// Expand glob patterns into a sorted, de-duplicated list of files. Patterns that
/// match nothing are kept as literal paths so the upload reports them as missing.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let matches: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();

        if matches.is_empty() {
            files.push(PathBuf::from(pattern));
        } else {
            files.extend(matches);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Label for an upload failure: rejected by Drive, or failed on this machine.
fn failure_origin(err: &GoogleError) -> &'static str {
    if err.is_remote() {
        "Drive API"
    } else {
        "Local"
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
