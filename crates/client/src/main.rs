//! Visual ERP command-line client.

use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use visual_erp_client::{AppState, ClientConfig, Listing, SessionState};
use visual_erp_core::{Credentials, Customer, Product, ProductId, Quote, QuoteId};

/// Visual ERP - inventory, customers and quotes from the terminal.
#[derive(Parser, Debug)]
#[command(name = "visual-erp", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show session and connectivity state.
    Status,
    /// Probe the backend health endpoint.
    Health,
    /// Log in and store the session.
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "VISUAL_ERP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// List inventory products.
    Products,
    /// List customers.
    Customers,
    /// List quotes.
    Quotes,
    /// Print a share sheet for a product.
    ShareProduct { id: String },
    /// Print a share sheet for a quote.
    ShareQuote { id: String },
    /// Run the connectivity monitor for a while.
    Watch {
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    visual_erp_observability::init();
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");
    let app = AppState::new(config).context("failed to open session storage")?;

    if app.session.state() == SessionState::Checking {
        app.session.check_status().await;
    }
    if let Some(notice) = app.session.take_notice() {
        eprintln!("{notice}");
    }

    match cli.command {
        Commands::Status => {
            let snapshot = app.monitor.snapshot();
            match app.session.user() {
                Some(user) => println!("session: signed in as {} ({})", user.display(), user.role),
                None => println!("session: signed out"),
            }
            println!("connectivity: {}", snapshot.state.as_str());
            println!("pending requests: {}", snapshot.pending);
        }
        Commands::Health => {
            let report = app.client.health().await.context("health check failed")?;
            println!(
                "backend healthy (status: {}, version: {})",
                report.status.as_deref().unwrap_or("ok"),
                report.version.as_deref().unwrap_or("unknown")
            );
        }
        Commands::Login { username, password } => {
            let session = app
                .session
                .login(&Credentials::new(username, password))
                .await
                .map_err(|e| match e.backend_message() {
                    Some(message) => anyhow::anyhow!(message.to_string()),
                    None => anyhow::anyhow!(e.user_message()),
                })
                .context("login failed")?;
            println!("signed in as {}", session.user().display());
        }
        Commands::Logout => {
            app.session.logout();
            println!("signed out");
        }
        Commands::Products => {
            let products = records(app.client.list_products().await)?;
            for p in &products {
                println!("{:<8} {:<12} {:<32} {:>6} {:>10.2}", p.id, p.sku, p.name, p.stock_on_hand, p.price);
            }
        }
        Commands::Customers => {
            let customers = records(app.client.list_customers().await)?;
            for c in &customers {
                println!("{:<8} {:<32} {:<24} {}", c.id, c.company_name, c.contact_name, c.email);
            }
        }
        Commands::Quotes => {
            let quotes = records(app.client.list_quotes().await)?;
            for q in &quotes {
                println!(
                    "{:<8} {:<32} {:<10} {} {:>10.2}",
                    q.id,
                    q.title,
                    q.status.as_str(),
                    q.valid_until,
                    q.computed_total()
                );
            }
        }
        Commands::ShareProduct { id } => {
            let id: ProductId = id.parse().context("invalid product id")?;
            let product: Product = app
                .client
                .get_product(&id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("failed to load product {id}"))?;
            println!("{}", app.share_product(&product));
        }
        Commands::ShareQuote { id } => {
            let id: QuoteId = id.parse().context("invalid quote id")?;
            let quote: Quote = app
                .client
                .get_quote(&id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("failed to load quote {id}"))?;
            let customers: Vec<Customer> = app.client.list_customers().await.into_result().unwrap_or_default();
            println!("{}", app.share_quote(&quote, &customers));
        }
        Commands::Watch { seconds } => {
            let handle = app.monitor.start();
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            app.monitor.shutdown();
            handle.await.context("connectivity monitor panicked")?;
            let snapshot = app.monitor.snapshot();
            println!(
                "connectivity: {} (last checked {})",
                snapshot.state.as_str(),
                snapshot
                    .last_checked
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string())
            );
        }
    }

    Ok(())
}

fn records<T>(listing: Listing<T>) -> anyhow::Result<Vec<T>> {
    if let Listing::Mock { cause, .. } = &listing {
        eprintln!("backend unavailable ({}); showing sample data", cause.user_message());
    }
    match listing.into_result() {
        Ok(records) => Ok(records),
        Err(err) => bail!("{}", err.user_message()),
    }
}
