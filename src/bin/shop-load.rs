use clap::{Parser, ValueEnum};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shop-load")]
#[command(about = "Drive traffic against a running storefront", long_about = None)]
struct Cli {
    #[arg(short, long, env = "SHOP_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Total number of requests to send.
    #[arg(short = 'n', long, default_value_t = 100)]
    requests: usize,

    /// Requests in flight at once.
    #[arg(short, long, default_value_t = 8)]
    concurrency: usize,

    /// Endpoints to cycle through.
    #[arg(short, long, value_enum, value_delimiter = ',', default_value = "products,users,orders,checkout")]
    endpoints: Vec<Target>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Target {
    Health,
    Products,
    Users,
    Orders,
    Checkout,
    Error,
}

impl Target {
    fn path(self) -> &'static str {
        match self {
            Target::Health => "/healthz",
            Target::Products => "/api/products",
            Target::Users => "/api/users",
            Target::Orders => "/api/orders",
            Target::Checkout => "/api/checkout",
            Target::Error => "/api/error",
        }
    }

    fn is_post(self) -> bool {
        matches!(self, Target::Orders | Target::Checkout)
    }
}

/// Status code, or `None` for a transport failure.
type Outcome = Option<u16>;

async fn send(client: &reqwest::Client, base: &str, target: Target) -> Outcome {
    let url = format!("{}{}", base.trim_end_matches('/'), target.path());
    let request = if target.is_post() {
        client.post(url)
    } else {
        client.get(url)
    };
    match request.send().await {
        Ok(res) => Some(res.status().as_u16()),
        Err(e) => {
            tracing::warn!(endpoint = target.path(), error = %e, "Request failed");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shop_load=info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.endpoints.is_empty() {
        return Err("at least one endpoint is required".into());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()?;
    let permits = Arc::new(Semaphore::new(cli.concurrency.max(1)));
    let base = Arc::new(cli.url.clone());

    tracing::info!(url = %cli.url, requests = cli.requests, concurrency = cli.concurrency, "Starting load");
    let started = Instant::now();

    let mut tasks = Vec::with_capacity(cli.requests);
    for i in 0..cli.requests {
        let target = cli.endpoints[i % cli.endpoints.len()];
        let permit = permits.clone().acquire_owned().await?;
        let client = client.clone();
        let base = base.clone();
        tasks.push(tokio::spawn(async move {
            let outcome = send(&client, &base, target).await;
            drop(permit);
            (target, outcome)
        }));
    }

    let mut tallies: BTreeMap<Target, BTreeMap<String, usize>> = BTreeMap::new();
    for task in tasks {
        let (target, outcome) = task.await?;
        let key = outcome.map_or_else(|| "error".to_string(), |code| code.to_string());
        *tallies.entry(target).or_default().entry(key).or_default() += 1;
    }

    println!("{} requests in {:.2?}", cli.requests, started.elapsed());
    for (target, counts) in &tallies {
        let summary = counts
            .iter()
            .map(|(status, n)| format!("{status}={n}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<16} {}", target.path(), summary);
    }
    Ok(())
}
