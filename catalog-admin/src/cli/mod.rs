use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use catalog::prelude::*;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use catalog_admin::{
    state::{
        editor::{EditorDefaults, EditorOptions},
        form::{ItemType, format_price},
        list::{CatalogList, ListQuery},
    },
    tui::{self, BrowseSettings, LoadDelays},
};

const PAGE_SIZE_ENV: &str = "CATALOG_PAGE_SIZE";

/// Bad command-line input detected after parsing. Exits with status 2.
#[derive(Debug)]
pub struct UsageError(pub String);

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UsageError {}

#[derive(Parser, Debug)]
#[command(name = "catalog-admin")]
#[command(author, version, about = "Browse and edit a product catalog", long_about = None)]
pub struct Cli {
    /// API endpoint URL. Default: environment `CATALOG_URL` or <https://dummyjson.com>
    #[arg(short = 'u', long, env = "CATALOG_URL", global = true)]
    pub url: Option<String>,

    /// Rows per list page
    #[arg(
        long,
        env = PAGE_SIZE_ENV,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=100),
        global = true
    )]
    pub page_size: u32,

    /// Write logs to this file. In browse mode logs are discarded otherwise.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Verbose mode (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub browse: BrowseArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive catalog browser (TUI). This is the default.
    Browse,

    /// Print one page of products
    List(ListArgs),

    /// Print one product as json
    Show {
        /// Product id
        id: u64,
    },
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Restore list state from a query string printed by a previous run
    #[arg(long, value_name = "QUERY", global = true)]
    pub state: Option<String>,

    /// Show the price field in the editor
    #[arg(long, global = true)]
    pub with_price: bool,

    /// Show the availability toggle in the editor
    #[arg(long, global = true)]
    pub with_availability: bool,

    /// Initially selected location id (repeatable). Default: all locations
    #[arg(long = "default-location", value_name = "ID", global = true)]
    pub default_locations: Vec<String>,

    /// Initial item type: physical, digital, or service
    #[arg(long, value_name = "TYPE", default_value_t = ItemType::Physical, global = true)]
    pub item_type: ItemType,

    /// Delay before the image library tier resolves
    #[arg(long, value_name = "MS", default_value_t = 1000, global = true)]
    pub images_delay_ms: u64,

    /// Delay before the location tier resolves
    #[arg(long, value_name = "MS", default_value_t = 2000, global = true)]
    pub locations_delay_ms: u64,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Search text
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Title sort order: asc or desc
    #[arg(long, default_value_t = SortOrder::Asc)]
    pub sort: SortOrder,

    /// Rows to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Fetch every page instead of one
    #[arg(long)]
    pub all: bool,

    /// Print json instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// True when the command takes over the terminal.
    pub fn is_tui(&self) -> bool {
        matches!(self.command, None | Some(Commands::Browse))
    }
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{text}");
    Ok(())
}

pub async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli)?;
    match cli.command {
        None | Some(Commands::Browse) => handle_browse(client, cli.page_size, cli.browse).await,
        Some(Commands::List(args)) => handle_list(&client, &args).await,
        Some(Commands::Show { id }) => handle_show(&client, id).await,
    }
}

fn build_client(cli: &Cli) -> Result<CatalogClient> {
    let mut config = ClientConfig::default().page_size(cli.page_size);
    if let Some(url) = &cli.url {
        config = config.base_url(url);
    }
    debug!(base_url = %config.base_url, page_size = config.page_size, "client config");
    CatalogClient::with_config(config).context("failed to create catalog client")
}

fn browse_settings(client: CatalogClient, page_size: u32, args: BrowseArgs) -> Result<BrowseSettings> {
    let (list, first) = match &args.state {
        Some(state) => CatalogList::restore(state, page_size)
            .map_err(|e| UsageError(format!("invalid --state: {e}")))?,
        None => CatalogList::new(ListQuery::default(), page_size),
    };
    let defaults = EditorDefaults {
        location_ids: (!args.default_locations.is_empty()).then_some(args.default_locations),
        item_type: args.item_type,
    };
    Ok(BrowseSettings {
        client,
        list,
        first,
        options: EditorOptions {
            with_price_field: args.with_price,
            with_availability_panel: args.with_availability,
        },
        defaults,
        delays: LoadDelays {
            images: Duration::from_millis(args.images_delay_ms),
            locations: Duration::from_millis(args.locations_delay_ms),
        },
    })
}

async fn handle_browse(client: CatalogClient, page_size: u32, args: BrowseArgs) -> Result<()> {
    let settings = browse_settings(client, page_size, args)?;
    let runtime = tokio::runtime::Handle::current();
    let state = tokio::task::spawn_blocking(move || tui::run(runtime, settings))
        .await
        .context("browser task failed")??;
    info!(%state, "list state");
    println!("--state '{state}'");
    Ok(())
}

#[derive(Debug, Serialize)]
struct ListReport {
    total: usize,
    skip: usize,
    limit: usize,
    products: Vec<ProductSummary>,
}

async fn handle_list(client: &CatalogClient, args: &ListArgs) -> Result<()> {
    let request = client
        .products()
        .search(args.search.clone())
        .sort(args.sort)
        .offset(args.offset);
    let page = request.list().await.context("failed to list products")?;
    let pagination = page.pagination;
    let products = if args.all {
        page.collect_all().await.context("failed to list products")?
    } else {
        page.into_response().items
    };

    if args.json {
        return emit_json(&ListReport {
            total: pagination.total,
            skip: pagination.skip,
            limit: pagination.limit,
            products,
        });
    }

    println!("{:>6}  {:<40}  {:<20}  {:>10}", "id", "title", "category", "price");
    for row in &products {
        println!(
            "{:>6}  {:<40}  {:<20}  {:>10}",
            row.id,
            truncate(&row.title, 40),
            truncate(row.category.as_deref().unwrap_or("-"), 20),
            format_price(row.price),
        );
    }
    println!(
        "{} of {} products (skip {})",
        products.len(),
        pagination.total,
        pagination.skip
    );
    Ok(())
}

async fn handle_show(client: &CatalogClient, id: u64) -> Result<()> {
    let product = client
        .product(id)
        .get()
        .await
        .with_context(|| format!("failed to get product {id}"))?;
    emit_json(&product)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}
