use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use lang_domain_proxy::bindings::BindingsRegistry;
use lang_domain_proxy::config::{load_config, validate_config, ProxyConfig};
use lang_domain_proxy::language::LanguageCatalog;
use lang_domain_proxy::observability::DebugTrace;
use lang_domain_proxy::rewrite::{RenderPass, UrlRewriteEngine};

#[derive(Parser)]
#[command(name = "l2d-cli")]
#[command(about = "Management CLI for the language-domain proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy status
    Status,
    /// Show the active bindings and every known domain
    Bindings,
    /// Resolve the language and primary domain of a host
    Resolve { domain: String },
    /// Parse and validate a config file without starting the proxy
    Check { config: PathBuf },
    /// Rewrite an HTML file offline and print the result
    Rewrite {
        config: PathBuf,
        file: PathBuf,
        /// Language the page was rendered in
        #[arg(short, long)]
        language: String,
        /// Build https:// links
        #[arg(long)]
        https: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Status => admin_get(&cli, "/admin/status", &[]).await?,
        Commands::Bindings => admin_get(&cli, "/admin/bindings", &[]).await?,
        Commands::Resolve { domain } => {
            admin_get(&cli, "/admin/resolve", &[("domain", domain.as_str())]).await?
        }
        Commands::Check { config } => {
            if !check(config)? {
                std::process::exit(1);
            }
        }
        Commands::Rewrite {
            config,
            file,
            language,
            https,
        } => rewrite(config, file, language, *https)?,
    }

    Ok(())
}

async fn admin_get(
    cli: &Cli,
    path: &str,
    query: &[(&str, &str)],
) -> Result<(), Box<dyn std::error::Error>> {
    let res = admin_request(&reqwest::Client::new(), cli, path, query)?
        .send()
        .await?;
    print_response(res).await
}

fn admin_request(
    client: &reqwest::Client,
    cli: &Cli,
    path: &str,
    query: &[(&str, &str)],
) -> Result<reqwest::RequestBuilder, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    Ok(client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .query(query))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Prints a report; returns false when the config would be rejected.
fn check(path: &PathBuf) -> Result<bool, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Parse error: {e}");
            return Ok(false);
        }
    };

    let (registry, skipped) = BindingsRegistry::parse_with_report(&config.language.bindings);
    for binding in registry.iter() {
        println!(
            "{} => {} [{}]",
            binding.language_tag,
            binding.primary_domain,
            binding.secondary_domains.join(", ")
        );
    }
    for line in &skipped {
        println!("warning: bindings line {} skipped ({}): {}", line.line_number, line.reason, line.content);
    }

    match validate_config(&config) {
        Ok(()) => {
            println!("OK: {} binding(s)", registry.len());
            Ok(true)
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("error: {error}");
            }
            Ok(false)
        }
    }
}

fn rewrite(
    config: &PathBuf,
    file: &PathBuf,
    language: &str,
    https: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let html = fs::read_to_string(file)?;

    let registry = BindingsRegistry::parse(&config.language.bindings);
    let catalog = LanguageCatalog::build(&config.language.languages, &registry);
    let engine = UrlRewriteEngine::new(&registry, &catalog, &config.language)?;

    let pass = RenderPass {
        current_language: Some(language),
        https,
    };
    let outcome = engine.rewrite(&html, &pass, &mut DebugTrace::disabled());

    eprintln!("{} URL(s) rewritten", outcome.replaced);
    print!("{}", outcome.body);
    Ok(())
}
