use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use pagetree::{Client, Config, HttpFetcher, IndexClass};

#[derive(Parser)]
#[command(name = "pagetree", about = "Query remote paginated B-tree indexes")]
struct Cli {
    /// Config file to layer over the defaults instead of the XDG one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `remote.index_base`.
    #[arg(long, global = true)]
    index_base: Option<String>,

    /// Log at debug level to stderr unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Suggestions for a `field:term` query.
    Suggest {
        query: String,
        /// Print a JSON array instead of one suggestion per line.
        #[arg(long)]
        json: bool,
        /// Fetch each index file once and slice pages locally.
        #[arg(long)]
        whole_index: bool,
    },
    /// Decode and print one index page.
    Node {
        field: String,
        #[arg(default_value_t = 0)]
        address: u64,
    },
    /// Print the current version token of a field's index.
    Version { field: String },
    /// Resolve the download URL of a content hash.
    FileUrl {
        hash: String,
        /// Also print the Referer header for this item.
        #[arg(long)]
        item: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    if let Some(base) = cli.index_base {
        config.remote.index_base = base;
    }
    if let Command::Suggest {
        whole_index: true, ..
    } = cli.command
    {
        config.search.cache_whole_index = true;
    }

    let fetcher = HttpFetcher::from_config(&config.fetch).context("building HTTP client")?;
    let client = Client::new(fetcher, &config);

    match cli.command {
        Command::Suggest { query, json, .. } => {
            let suggestions = client
                .suggest(&query)
                .await
                .with_context(|| format!("suggest {query:?}"))?;
            if json {
                let rows: Vec<_> = suggestions
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "header": s.header,
                            "tag": s.tag,
                            "display": s.to_string(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for s in &suggestions {
                    println!("{s}");
                }
            }
        }
        Command::Node { field, address } => {
            let node = client
                .search()
                .node_at(&field, address)
                .await
                .with_context(|| format!("reading page {address} of {field:?}"))?;
            println!("leaf: {}", node.is_leaf());
            for (key, loc) in node.keys.iter().zip(&node.locators) {
                println!("key {}  data {}+{}", hex(key), loc.offset, loc.length);
            }
            let children = node.children.iter().enumerate().filter(|(_, c)| **c != 0);
            for (slot, child) in children {
                println!("child[{slot}] {child}");
            }
        }
        Command::Version { field } => {
            let class = IndexClass::for_field(&field);
            let version = client
                .search()
                .index_version(class)
                .await
                .with_context(|| format!("fetching {class} index version"))?;
            println!("{version}");
        }
        Command::FileUrl { hash, item } => {
            client
                .update_script()
                .await
                .with_context(|| format!("loading {}", client.script_url()))?;
            println!("{}", client.file_url(&hash).await?);
            if let Some(item) = item {
                println!("Referer: {}", client.referer(item));
            }
        }
    }

    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
