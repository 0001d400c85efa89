//! Language-domain proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │              LANGUAGE-DOMAIN PROXY            │
//!     Client Request       │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!     ─────────────────────┼─▶│  http  │──▶│ language │──▶│  redirect  │──┼──▶ 30x
//!                          │  │ server │   │  detect  │   │   policy   │  │
//!                          │  └────────┘   └──────────┘   └─────┬──────┘  │
//!                          │                                    │ proceed │
//!                          │                                    ▼         │
//!     Client Response      │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!     ◀────────────────────┼──│response│◀──│ rewrite  │◀──│  upstream  │◀─┼──── Site
//!                          │  └────────┘   │  engine  │   │   client   │  │
//!                          │               └──────────┘   └────────────┘  │
//!                          │  config (hot reload) · bindings · observability│
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "lang-domain-proxy", version)]
#[command(about = "Reverse proxy binding site languages to their own domains", long_about = None)]
struct Args {
    /// TOML configuration file, watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    lang_domain_proxy::lifecycle::run(args.config).await?;
    Ok(())
}
