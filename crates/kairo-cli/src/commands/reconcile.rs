use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use anyhow::{Context as _, Result};
use clap::Args;
use kairo_config::{validate_batch_size, validate_max_workers, MAX_BATCH_SIZE, MAX_WORKERS};
use kairo_core::domain::parse_upload;
use kairo_core::{BatchMatcher, ClaimPolicy, MatchOptions, ReconciliationReport, TracingObserver};
use kairo_store::DirectoryPool;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Upload body as JSON, or `-` for stdin
    pub input: PathBuf,
    #[arg(long)]
    pub batch_size: Option<usize>,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long, value_name = "POLICY")]
    pub claim_policy: Option<ClaimPolicy>,
}

pub fn reconcile(ctx: &Context<'_>, args: ReconcileArgs) -> Result<()> {
    let body = read_upload(&args.input)?;
    let upload: serde_json::Value = serde_json::from_str(&body)
        .map_err(|err| invalid_input(format!("upload is not valid JSON: {err}")))?;
    let contacts = parse_upload(&upload, ctx.config.matching.max_contacts)?;

    let options = resolve_options(ctx, &args)?;
    let directory = DirectoryPool::open(ctx.db_path, options.max_workers)
        .with_context(|| format!("open directory {}", ctx.db_path.display()))?;
    let observer = TracingObserver;

    let results = BatchMatcher::new(&directory, ctx.dialing)
        .with_options(options)
        .with_observer(&observer)
        .reconcile(&contacts)
        .with_context(|| "reconcile contacts")?;
    let report = ReconciliationReport::from_results(&results);

    if ctx.json {
        print_json(&report)?;
        return Ok(());
    }

    let summary = &report.summary;
    println!(
        "{} contacts: {} on kairo ({} exact, {} fuzzy), {} not found",
        summary.total_uploaded,
        summary.found_in_kairo,
        summary.exact_matches,
        summary.fuzzy_matches,
        summary.not_found_in_kairo
    );
    for user in &summary.kairo_users {
        println!(
            "  {:<6} {}  {} -> {}",
            user.match_type.as_str(), user.contact_name, user.contact_phone, user.user_phone
        );
    }
    for contact in &summary.non_kairo_users {
        println!("  {:<6} {}  {}", "none", contact.contact_name, contact.phone_number);
    }
    Ok(())
}

fn resolve_options(ctx: &Context<'_>, args: &ReconcileArgs) -> Result<MatchOptions> {
    let mut options = ctx.config.matching.match_options();
    if let Some(batch_size) = args.batch_size {
        options.batch_size = validate_batch_size(batch_size).ok_or_else(|| {
            invalid_input(format!("--batch-size must be between 1 and {MAX_BATCH_SIZE}"))
        })?;
    }
    if let Some(workers) = args.workers {
        options.max_workers = validate_max_workers(workers).ok_or_else(|| {
            invalid_input(format!("--workers must be between 1 and {MAX_WORKERS}"))
        })?;
    }
    if let Some(policy) = args.claim_policy {
        options.claim_policy = policy;
    }
    Ok(options)
}

fn read_upload(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .with_context(|| "read upload from stdin")?;
        return Ok(body);
    }
    fs::read_to_string(input).with_context(|| format!("read upload {}", input.display()))
}
