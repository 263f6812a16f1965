//! iecbib - resolve one IEC/ISO reference from the command line

use anyhow::Result;
use clap::Parser;
use iecbib::{ResolveOptions, Resolver};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Resolve an IEC/ISO standard reference against the IEC webstore
#[derive(Parser)]
#[command(name = "iecbib", version)]
struct Args {
    /// Reference to resolve, e.g. "IEC 60950-1:2005" or "IEC 61000 (all parts)"
    reference: String,

    /// Requested publication year (alternative to a ":YYYY" suffix)
    #[arg(long)]
    year: Option<String>,

    /// Resolve to a reference covering every part of the standard
    #[arg(long)]
    all_parts: bool,

    /// Keep the resolved edition year even when none was requested
    #[arg(long)]
    keep_year: bool,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let resolver = Resolver::new()?;
    let opts = ResolveOptions {
        all_parts: args.all_parts,
        keep_year: args.keep_year,
    };

    match resolver.get(&args.reference, args.year.as_deref(), &opts).await? {
        Some(item) => {
            println!("{}", serde_json::to_string_pretty(&item)?);
            Ok(())
        }
        None => {
            eprintln!("No match for \"{}\"", args.reference);
            std::process::exit(1);
        }
    }
}
