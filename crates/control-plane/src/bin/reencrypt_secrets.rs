// CLI tool for re-encrypting stored X credentials after key rotation.
// Run with: cargo run --bin reencrypt-secrets -- --help

use anyhow::{Context, Result};
use contentdesk_control_plane::config::AppConfig;
use contentdesk_control_plane::storage::{Database, EncryptionService, XCredentialRow};
use contentdesk_control_plane::telemetry::{init_tracing, TelemetryConfig};
use std::env;

#[derive(Debug)]
struct Args {
    dry_run: bool,
    batch_size: i64,
}

impl Args {
    fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        let mut dry_run = false;
        let mut batch_size = 100i64;
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--dry-run" | "-n" => dry_run = true,
                "--batch-size" | "-b" => {
                    i += 1;
                    batch_size = args
                        .get(i)
                        .context("--batch-size requires a value")?
                        .parse()
                        .context("Invalid batch size")?;
                    anyhow::ensure!(batch_size > 0, "Batch size must be positive");
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                arg => {
                    eprintln!("Unknown argument: {}", arg);
                    print_help();
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        Ok(Self {
            dry_run,
            batch_size,
        })
    }
}

fn print_help() {
    eprintln!(
        r#"
reencrypt-secrets - Re-encrypt stored X credentials after key rotation

USAGE:
    reencrypt-secrets [OPTIONS]

OPTIONS:
    -n, --dry-run           Show what would be changed without making changes
    -b, --batch-size <N>    Process N records at a time (default: 100)
    -h, --help              Show this help message

ENVIRONMENT:
    DATABASE_URL                    PostgreSQL connection string (required)
    SECRETS_ENCRYPTION_KEY          Current encryption key (required)
    SECRETS_ENCRYPTION_KEY_PREVIOUS Previous encryption keys, comma-separated

EXAMPLES:
    # Dry run to see what would be re-encrypted
    reencrypt-secrets --dry-run

    # Re-encrypt with smaller batches
    reencrypt-secrets --batch-size 50
"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse()?;

    // Load environment
    let dotenv = dotenvy::dotenv();

    let mut telemetry = TelemetryConfig::from_env();
    if telemetry.log_filter.is_none() {
        telemetry.log_filter = Some("info".to_string());
    }
    init_tracing(&telemetry);
    if let Ok(path) = dotenv {
        tracing::info!("Loaded .env from {:?}", path);
    }

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize encryption service
    let primary = config
        .encryption
        .primary_key
        .as_deref()
        .context("SECRETS_ENCRYPTION_KEY not set")?;
    let previous: Vec<&str> = config
        .encryption
        .previous_keys
        .iter()
        .map(String::as_str)
        .collect();
    let encryption = EncryptionService::new(primary, &previous)
        .context("Failed to initialize encryption service")?;

    tracing::info!(
        "Encryption service initialized. Primary key: {}",
        encryption.primary_key_id()
    );
    tracing::info!("Available keys: {:?}", encryption.available_key_ids());

    // Connect to database
    let database_url = config.database_url.as_deref().context("DATABASE_URL not set")?;
    let db = Database::from_url(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    let (processed, reencrypted) =
        process_credentials(&db, &encryption, args.batch_size, args.dry_run).await?;

    if args.dry_run {
        tracing::info!(
            "DRY RUN: Would re-encrypt {} of {} records",
            reencrypted,
            processed
        );
    } else {
        tracing::info!("Re-encrypted {} of {} records", reencrypted, processed);
    }

    Ok(())
}

/// Re-encrypted (api_key, api_secret) for a row, `None` when both already use the primary key.
fn reencrypt_row(
    encryption: &EncryptionService,
    row: &XCredentialRow,
) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
    let key = encryption.reencrypt(&row.api_key_encrypted)?;
    let secret = encryption.reencrypt(&row.api_secret_encrypted)?;
    if key.is_none() && secret.is_none() {
        return Ok(None);
    }
    Ok(Some((
        key.unwrap_or_else(|| row.api_key_encrypted.clone()),
        secret.unwrap_or_else(|| row.api_secret_encrypted.clone()),
    )))
}

/// Progress is logged every 1000 records, whatever the batch size.
fn crossed_progress_mark(before: u64, after: u64) -> bool {
    before / 1000 != after / 1000
}

/// Walk x_credentials in id order, re-encrypting rows that use an old key
async fn process_credentials(
    db: &Database,
    encryption: &EncryptionService,
    batch_size: i64,
    dry_run: bool,
) -> Result<(u64, u64)> {
    let mut processed = 0u64;
    let mut reencrypted = 0u64;
    let mut offset = 0i64;

    loop {
        let rows = db
            .list_x_credentials(batch_size, offset)
            .await
            .context("Failed to fetch records")?;

        if rows.is_empty() {
            break;
        }

        for row in &rows {
            processed += 1;

            let key_id =
                EncryptionService::key_id_of(&row.api_key_encrypted).unwrap_or_default();
            if dry_run {
                match (
                    encryption.is_current_key(&row.api_key_encrypted),
                    encryption.is_current_key(&row.api_secret_encrypted),
                ) {
                    (Ok(true), Ok(true)) => {}
                    (Ok(_), Ok(_)) => {
                        tracing::info!(
                            "Would re-encrypt x_credentials (id={}, current_key={})",
                            row.id,
                            key_id
                        );
                        reencrypted += 1;
                    }
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::warn!("Failed to check key for x_credentials (id={}): {}", row.id, e);
                    }
                }
                continue;
            }

            match reencrypt_row(encryption, row) {
                Ok(Some((api_key, api_secret))) => {
                    db.update_x_credential_ciphertexts(row.id, &api_key, &api_secret)
                        .await
                        .context("Failed to update record")?;
                    tracing::info!(
                        "Re-encrypted x_credentials (id={}, {} -> {})",
                        row.id,
                        key_id,
                        encryption.primary_key_id()
                    );
                    reencrypted += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Failed to re-encrypt x_credentials (id={}): {:#}", row.id, e);
                }
            }
        }

        offset += batch_size;

        if crossed_progress_mark(processed - rows.len() as u64, processed) {
            tracing::info!(
                "Progress: {} processed, {} need re-encryption",
                processed,
                reencrypted
            );
        }
    }

    tracing::info!(
        "Finished: {} processed, {} needing re-encryption",
        processed,
        reencrypted
    );
    Ok((processed, reencrypted))
}
