//! Runs the "System Properties tests" group against a table service.
//!
//! Point it at a running service with `--url`, or pass `--embedded` to
//! start one in-process.

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use sysprops_e2e::data::STRING_ID_TABLE_NAME;
use sysprops_e2e::{system_properties_tests, EmbeddedService, TestResult};
use table_client::MobileServiceClient;
use table_core::ServiceConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the table service
    #[arg(long, conflicts_with = "embedded")]
    url: Option<String>,

    /// Start an in-process service instead of connecting to one
    #[arg(long)]
    embedded: bool,

    /// Application key sent in X-ZUMO-APPLICATION
    #[arg(long)]
    application_key: Option<String>,

    /// Table the scenarios run against
    #[arg(long, default_value = STRING_ID_TABLE_NAME)]
    table: String,

    /// Only run cases whose name contains this text
    #[arg(long)]
    filter: Option<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    // Keeps the service or client runtime alive while the group runs.
    let mut _embedded = None;
    let mut _runtime = None;

    let client = match (&args.url, args.embedded) {
        (Some(url), _) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to build client runtime")?;
            let mut builder = MobileServiceClient::builder()
                .base_url(url.clone())
                .runtime(runtime.handle().clone());
            if let Some(key) = &args.application_key {
                builder = builder.application_key(key.clone());
            }
            let client = builder.build().context("Failed to build client")?;
            _runtime = Some(runtime);
            client
        }
        (None, true) => {
            let config = ServiceConfig {
                application_key: args.application_key.clone(),
                ..Default::default()
            };
            let service = EmbeddedService::start(config).context("Failed to start service")?;
            let client = service
                .client(args.application_key.as_deref())
                .context("Failed to build client")?;
            _embedded = Some(service);
            client
        }
        (None, false) => bail!("Either --url or --embedded is required"),
    };

    let group = system_properties_tests();
    println!("{} ({})", group.name(), client.base_url());

    let results = group.run(&client, &args.table, args.filter.as_deref(), print_result);

    let passed = results.iter().filter(|r| r.is_passed()).count();
    let failed = results.len() - passed;
    println!();
    println!("{} passed, {} failed, {} run", passed, failed, results.len());

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_result(result: &TestResult) {
    let elapsed = format!("{:.2?}", result.elapsed);
    match (&result.error, result.is_passed()) {
        (Some(error), false) => {
            println!("{} {} ({}): {}", result.status, result.name, elapsed, error);
            for line in &result.log {
                println!("    {}", line);
            }
        }
        _ => println!("{} {} ({})", result.status, result.name, elapsed),
    }
}
