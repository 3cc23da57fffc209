//! Command handlers for the rdams CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments and the API client. Every handler validates its identifiers
//! before any network traffic, prints a short informational line unless quiet
//! and echoes the server response unless `--no-print` is given.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::app::{
    load_request_payload, parse_file_list, pretty_json, ApiResponse, BulkFetcher, DatasetId,
    FetchObserver, FetchReport, FileList, RdaClient, RequestIndex,
};
use crate::auth::{credential_source, TerminalPrompt};
use crate::cli::args::{Commands, DatasetArgs, GlobalArgs};
use crate::cli::progress::{spinner, ConsoleProgress};
use crate::config::{AppConfig, CredentialSourceKind};
use crate::constants::files;
use crate::errors::{ApiError, AppError, Result};

/// Console output settings shared by all handlers
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Echo API responses
    pub print_response: bool,
    /// Suppress informational lines and progress
    pub quiet: bool,
}

impl Output {
    pub fn from_args(global: &GlobalArgs) -> Self {
        Self {
            print_response: !global.no_print,
            quiet: global.quiet,
        }
    }

    /// Print an informational line unless quiet
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    /// Print a response unless printing is disabled
    pub fn response(&self, response: &ApiResponse) {
        if self.print_response {
            println!("{}", response.render());
        }
    }
}

/// Everything a command needs: the client, output settings and where request
/// folders go
pub struct CommandContext {
    pub client: RdaClient,
    pub output: Output,
    pub output_root: PathBuf,
}

impl CommandContext {
    /// Build the context from loaded configuration
    ///
    /// Credentials are read lazily on the first API call.
    pub fn new(config: &AppConfig, output: Output) -> Result<Self> {
        let base_url = config.base_url()?;
        let source = credential_source(&config.credentials, &base_url, Box::new(TerminalPrompt));
        let client = RdaClient::new(config, source)?;

        Ok(Self {
            client,
            output,
            output_root: config.download.output_root.clone(),
        })
    }
}

/// Load configuration and apply command-line overrides
pub async fn load_config(global: &GlobalArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load(global.config.as_deref()).await?;

    if let Some(auth_mode) = global.auth_mode {
        config.api.auth_mode = auth_mode;
    }
    if global.use_netrc {
        config.credentials.source = CredentialSourceKind::Netrc;
    }
    if let Some(path) = &global.credentials_file {
        config.credentials.credentials_file = path.clone();
    }

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Run one parsed command
pub async fn execute(command: Commands, ctx: &mut CommandContext) -> Result<()> {
    match command {
        Commands::Summary { dataset } => handle_summary(ctx, &dataset).await.map(drop),
        Commands::Metadata(args) => handle_metadata(ctx, &args).await.map(drop),
        Commands::ParamSummary(args) => handle_param_summary(ctx, &args).await.map(drop),
        Commands::Submit { control_file } => handle_submit(ctx, &control_file).await.map(drop),
        Commands::Status { index } => handle_status(ctx, index.as_deref()).await.map(drop),
        Commands::Download { index, output_dir } => {
            handle_download(ctx, &index, output_dir).await.map(drop)
        }
        Commands::GlobusDownload { index } => handle_globus_download(ctx, &index).await.map(drop),
        Commands::ControlFileTemplate {
            dataset,
            output_dir,
        } => handle_control_file_template(ctx, &dataset, &output_dir)
            .await
            .map(drop),
        Commands::Purge { index } => handle_purge(ctx, &index).await.map(drop),
    }
}

/// Handle the summary command
pub async fn handle_summary(ctx: &mut CommandContext, dataset: &str) -> Result<ApiResponse> {
    let dataset = DatasetId::normalize(dataset)?;
    ctx.output.info("Getting summary information. Please wait as this may take awhile.");

    let response = ctx.client.summary(&dataset).await?;
    ctx.output.response(&response);
    Ok(response)
}

/// Handle the metadata command
pub async fn handle_metadata(ctx: &mut CommandContext, args: &DatasetArgs) -> Result<ApiResponse> {
    let dataset = DatasetId::normalize(&args.dataset)?;
    ctx.output.info("Getting metadata. Please wait as this may take awhile.");

    let response = ctx.client.metadata(&dataset, args.formatted).await?;
    ctx.output.response(&response);
    Ok(response)
}

/// Handle the param-summary command
pub async fn handle_param_summary(
    ctx: &mut CommandContext,
    args: &DatasetArgs,
) -> Result<ApiResponse> {
    let dataset = DatasetId::normalize(&args.dataset)?;
    ctx.output.info("Getting parameter summary. Please wait as this may take awhile.");

    let response = ctx.client.param_summary(&dataset, args.formatted).await?;
    ctx.output.response(&response);
    Ok(response)
}

/// Handle the submit command
pub async fn handle_submit(ctx: &mut CommandContext, control_file: &Path) -> Result<ApiResponse> {
    let payload = load_request_payload(control_file).await?;
    info!(
        "Submitting {} request parameters from {}",
        payload.len(),
        control_file.display()
    );
    ctx.output.info("Submitting request.");

    let response = ctx.client.submit(&payload).await?;
    ctx.output.response(&response);
    Ok(response)
}

/// Handle the status command
pub async fn handle_status(ctx: &mut CommandContext, index: Option<&str>) -> Result<ApiResponse> {
    let index = index.map(str::parse::<RequestIndex>).transpose()?;
    ctx.output.info("Getting request status.");

    let response = ctx.client.request_status(index.as_ref()).await?;
    ctx.output.response(&response);
    Ok(response)
}

/// Handle the download command
///
/// Returns `None` when the request is not ready for download; the server's
/// explanation is printed instead.
pub async fn handle_download(
    ctx: &mut CommandContext,
    index: &str,
    output_dir: Option<PathBuf>,
) -> Result<Option<FetchReport>> {
    let index: RequestIndex = index.parse()?;
    ctx.output.info("Getting file list.");

    let response = ctx.client.file_list(&index).await?;
    let listing = match &response {
        ApiResponse::Json(value) => value,
        ApiResponse::Text(text) => {
            println!("{}", text);
            return Err(ApiError::UnexpectedFileList {
                reason: "server did not return a JSON file list".to_string(),
            }
            .into());
        }
    };

    let files = match parse_file_list(listing)? {
        FileList::Files(files) => files,
        FileList::NotReady(value) => {
            warn!("Request {} is not ready for download", index);
            println!("{}", pretty_json(&value));
            return Ok(None);
        }
    };

    let out_dir = output_dir.unwrap_or_else(|| {
        ctx.output_root
            .join(format!("{}{}", files::REQUEST_DIR_PREFIX, index))
    });
    info!("Request {} lists {} files", index, files.len());

    // Credentials were resolved by the file list call, so no prompt can
    // appear under the spinner
    if !ctx.client.is_logged_in() {
        let login_spinner = spinner("Logging in...", !ctx.output.quiet);
        let login = ctx.client.login().await;
        if let Some(login_spinner) = login_spinner {
            login_spinner.finish_and_clear();
        }
        login?;
    }

    ctx.output.info("\n\nStarting Download.\n\n");

    let mut progress = ConsoleProgress::for_terminal(&out_dir, ctx.output.quiet);
    let report = match BulkFetcher::new(&ctx.client)
        .fetch_all(&files, &out_dir, &mut progress)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            progress.batch_progress(-1.0);
            return Err(e.into());
        }
    };

    ctx.output.info(&report.summary());
    Ok(Some(report))
}

/// Handle the globus-download command
pub async fn handle_globus_download(ctx: &mut CommandContext, index: &str) -> Result<ApiResponse> {
    let index: RequestIndex = index.parse()?;
    ctx.output.info("Starting Globus transfer.");

    let response = ctx.client.globus_download(&index).await?;
    ctx.output.response(&response);
    Ok(response)
}

/// Handle the control-file-template command
///
/// The template is written verbatim to `<output_dir>/<dataset>_control_file`.
pub async fn handle_control_file_template(
    ctx: &mut CommandContext,
    dataset: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dataset = DatasetId::normalize(dataset)?;
    let template = ctx.client.control_file_template(&dataset).await?;

    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(format!("{}{}", dataset, files::CONTROL_FILE_SUFFIX));
    tokio::fs::write(&path, template.as_bytes())
        .await
        .map_err(|e| {
            AppError::generic(format!(
                "Could not write control file {}: {}",
                path.display(),
                e
            ))
        })?;

    ctx.output.info(&format!(
        "\nWriting example control file to {}\n",
        path.display()
    ));
    Ok(path)
}

/// Handle the purge command
pub async fn handle_purge(ctx: &mut CommandContext, index: &str) -> Result<ApiResponse> {
    let index: RequestIndex = index.parse()?;
    ctx.output.info(&format!("Purging request {}.", index));

    let response = ctx.client.purge(&index).await?;
    ctx.output.response(&response);
    Ok(response)
}
