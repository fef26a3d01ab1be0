mod cache;
mod config;
mod controller;
mod convert;
mod db;
mod endpoint;
mod export;
mod http;
mod models;
mod rates;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;

use cache::CacheStore;
use controller::{RatesController, RatesView};
use models::{normalize_code, RatesPayload};
use rates::RatesClient;

#[derive(Parser)]
#[command(name = "ratefeed", about = "Currency rate fetcher, cache and converter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and print the latest rates table
    Rates {
        /// Base currency code
        #[arg(long)]
        base: Option<String>,
        /// Skip the cache and hit the network
        #[arg(long)]
        force: bool,
    },
    /// Print known currency symbols
    Symbols,
    /// Convert an amount between two currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
        /// Base currency the rates table is relative to
        #[arg(long)]
        base: Option<String>,
    },
    /// Export the current rates table to CSV
    Export {
        #[arg(long)]
        base: Option<String>,
    },
    /// Save backend URLs to config.toml
    SetBackend {
        /// Preferred backend base URL
        #[arg(long)]
        primary: Option<String>,
        /// Second choice backend base URL
        #[arg(long)]
        secondary: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Config edits happen before any backend or database is touched.
    if let Command::SetBackend { primary, secondary } = &cli.command {
        let mut config = config::Config::default();
        if let Some(url) = primary {
            config.primary_api_url = Some(url.clone());
        }
        if let Some(url) = secondary {
            config.secondary_api_url = Some(url.clone());
        }
        config::save_config(&config)?;
        println!("✅ Backend configuration saved to config.toml");
        return Ok(());
    }

    let config = config::Config::default().apply_env_overrides();

    let pool = db::create_db_pool(&config.cache_db_url).await?;
    let cache = CacheStore::new(pool);
    let client = RatesClient::new(&config);
    println!("Using rates backend: {}", client.base_url());

    match cli.command {
        Command::Rates { base, force } => {
            let base = base.unwrap_or_else(|| config.default_base.clone());
            let ctl = RatesController::new(client, cache, &base);
            let view = load_view(&ctl, force).await?;
            print_rates(&view);
        }
        Command::Symbols => {
            let ctl = RatesController::new(client, cache, &config.default_base);
            let view = load_view(&ctl, false).await?;
            let mut codes: Vec<&String> = view.symbols.keys().collect();
            codes.sort();
            for code in codes {
                println!("{:<8} {}", code, view.symbols[code].description);
            }
        }
        Command::Convert {
            amount,
            from,
            to,
            base,
        } => {
            let base = base.unwrap_or_else(|| config.default_base.clone());
            let from = normalize_code(&from);
            let to = normalize_code(&to);
            let ctl = RatesController::new(client, cache, &base);
            let view = load_view(&ctl, false).await?;

            match convert::convert(amount, &from, &to, &view.rates, &view.base) {
                Some(result) => {
                    println!("{} {} = {:.4} {}", amount, from, result, to);
                }
                None => {
                    anyhow::bail!("No rate available to convert {} to {}", from, to);
                }
            }
        }
        Command::Export { base } => {
            let base = base.unwrap_or_else(|| config.default_base.clone());
            let ctl = RatesController::new(client, cache, &base);
            let view = load_view(&ctl, false).await?;
            let payload = RatesPayload {
                base: view.base.clone(),
                date: view.date.clone(),
                rates: view.rates.clone(),
                symbols: view.symbols.clone(),
                last_updated: view.last_updated.unwrap_or_default(),
            };
            let path = export::export_rates_csv(&payload, Path::new("output"))?;
            println!("✅ CSV file created at: {}", path.display());
        }
        Command::SetBackend { .. } => unreachable!(),
    }

    Ok(())
}

async fn load_view(ctl: &RatesController<RatesClient>, force: bool) -> Result<RatesView> {
    println!("Fetching current exchange rates...");
    ctl.load(force).await;

    let view = ctl.state();
    if let Some(err) = &view.error {
        anyhow::bail!("Failed to load rates: {}", err);
    }
    println!("✅ Exchange rates ready");
    Ok(view)
}

fn print_rates(view: &RatesView) {
    println!(
        "Rates for base {} ({})",
        view.base,
        view.date.as_deref().unwrap_or("no date")
    );

    let mut codes: Vec<&String> = view.rates.keys().collect();
    codes.sort();
    for code in codes {
        let description = view
            .symbols
            .get(code)
            .map(|s| s.description.as_str())
            .unwrap_or("");
        println!("{:<8} {:>14.6}  {}", code, view.rates[code], description);
    }
}
