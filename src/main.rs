//! drive_perms CLI - Audit Google Drive sharing.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use drive_perms::auth::{
    FileTokenStore, InstalledAppAuthenticator, ServiceAccountAuthenticator, TokenProvider,
};
use drive_perms::logging::init_logging;
use drive_perms::{run_audit, write_outputs, AuditConfig, DriveClient, OutputFormat};

/// List the permissions granted on every file and folder of a Google Drive
/// account, including shared drives.
#[derive(Parser)]
#[command(name = "drive_perms")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OAuth client secret file (desktop app client).
    #[arg(long, env = "DRIVE_PERMS_CLIENT_SECRET", default_value = "credentials.json")]
    client_secret: PathBuf,

    /// Cached OAuth tokens, created after the first consent.
    #[arg(long, env = "DRIVE_PERMS_TOKEN_CACHE", default_value = "token.json")]
    token_cache: PathBuf,

    /// Service account JSON key, used instead of the OAuth client.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    service_account: Option<PathBuf>,

    /// User to impersonate with the service account.
    #[arg(long, requires = "service_account")]
    subject: Option<String>,

    /// Directory for the export files.
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// Export files to write.
    #[arg(long, value_enum, default_value_t = OutputFormat::All)]
    format: OutputFormat,

    /// Do not walk the personal drive.
    #[arg(long)]
    skip_my_drive: bool,

    /// Do not walk shared drives.
    #[arg(long)]
    skip_shared_drives: bool,

    /// Do not print the permission tree.
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn audit_config(&self) -> AuditConfig {
        AuditConfig {
            output_dir: self.output_dir.clone(),
            format: self.format,
            include_my_drive: !self.skip_my_drive,
            include_shared_drives: !self.skip_shared_drives,
        }
    }

    async fn authenticator(&self) -> Result<Arc<dyn TokenProvider>> {
        if let Some(ref key_file) = self.service_account {
            let auth = ServiceAccountAuthenticator::from_file(key_file)
                .with_context(|| format!("Failed to load service account from {:?}", key_file))?
                .with_subject(self.subject.clone());
            return Ok(Arc::new(auth));
        }

        let cache = FileTokenStore::open(&self.token_cache);
        let auth = InstalledAppAuthenticator::from_file(&self.client_secret, cache)
            .await
            .with_context(|| format!("Failed to load client secret from {:?}", self.client_secret))?;
        Ok(Arc::new(auth))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let auth = cli.authenticator().await?;

    // Nothing useful can happen without a token, so authorize up front.
    auth.access_token()
        .await
        .context("Failed to authorize against Google Drive")?;

    let client = DriveClient::new(auth);
    let config = cli.audit_config();

    let (log, summary) = if cli.quiet {
        run_audit(&client, &config, io::sink()).await?
    } else {
        run_audit(&client, &config, io::stdout().lock()).await?
    };

    let written = write_outputs(&log, &config).context("Failed to write exports")?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout)?;
    writeln!(stdout, "Grants by principal:")?;
    for line in log.summary_lines() {
        writeln!(stdout, "{}", line)?;
    }
    writeln!(stdout)?;
    writeln!(
        stdout,
        "{} item(s) visited, {} grant(s) recorded, {} failure(s).",
        summary.items_visited, summary.grants_recorded, summary.failures
    )?;
    for path in written {
        writeln!(stdout, "Saved to: {:?}", path)?;
    }

    Ok(())
}
