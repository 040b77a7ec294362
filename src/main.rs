mod error;
mod extract;
mod normalize;
mod pipeline;
mod product;
mod profile;
mod render;
mod rows;
mod shopify_api;
mod sitemap;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use profile::SiteProfile;
use render::{PageRenderer, SpiderRenderer};
use rows::ExportLabels;
use tracing::debug;

#[derive(Parser)]
#[command(name = "shopify_export", about = "Storefront catalog → Shopify CSV exporter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Site {
    Prestashop,
    Woocommerce,
}

impl Site {
    fn profile(self, product_paths: &[String]) -> SiteProfile {
        let mut profile = match self {
            Site::Prestashop => SiteProfile::prestashop(),
            Site::Woocommerce => SiteProfile::woocommerce(),
        };
        if !product_paths.is_empty() {
            profile.product_url_patterns = product_paths.to_vec();
        }
        profile
    }
}

#[derive(clap::Args)]
struct ScrapeArgs {
    /// Root sitemap URL (plain urlset or one-level index)
    #[arg(long)]
    sitemap_url: String,
    /// Storefront platform the selectors target
    #[arg(long, value_enum, default_value_t = Site::Prestashop)]
    site: Site,
    /// Product URL path fragment; repeat to accept several (overrides the
    /// profile defaults)
    #[arg(long = "product-path")]
    product_paths: Vec<String>,
    /// Max product pages to scrape (default: all classified)
    #[arg(short = 'n', long)]
    limit: Option<usize>,
    /// Intermediate snapshot path
    #[arg(long, default_value = "products.json")]
    snapshot: PathBuf,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Intermediate snapshot path to read
    #[arg(long, default_value = "products.json")]
    input: PathBuf,
    /// Output CSV path
    #[arg(long, default_value = "products_shopify.csv")]
    out: PathBuf,
    /// Vendor label for the Vendor column
    #[arg(long)]
    vendor: String,
    /// Type column value
    #[arg(long, default_value = "")]
    product_type: String,
    /// Tags column value
    #[arg(long, default_value = "")]
    tags: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the sitemap, scrape product pages, write products.json
    Scrape(ScrapeArgs),
    /// Turn products.json into a Shopify import CSV
    Export(ExportArgs),
    /// Scrape + export in one pipeline
    Run {
        #[command(flatten)]
        scrape: ScrapeArgs,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Scrape + extract a single product URL and print the result as JSON
    Probe {
        url: String,
        #[arg(long, value_enum, default_value_t = Site::Prestashop)]
        site: Site,
    },
    /// Export straight from a Shopify store's /products.json API
    Shopify {
        /// Store base URL, e.g. https://holzwarme.shop
        #[arg(long)]
        shop_url: String,
        /// Vendor label for the Vendor column
        #[arg(long)]
        vendor: String,
        /// Output CSV path
        #[arg(long, default_value = "shopify_products.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape(args) => {
            scrape_phase(&args).await?;
            Ok(())
        }
        Commands::Export(args) => {
            export_phase(&args)?;
            Ok(())
        }
        Commands::Run { scrape, export } => {
            scrape_phase(&scrape).await?;
            export_phase(&export)?;
            Ok(())
        }
        Commands::Probe { url, site } => {
            let profile = site.profile(&[]);
            let renderer = SpiderRenderer::from_env()?;
            let html = renderer.render(&url, &profile).await?;
            match extract::extract_product(&html, &url, &profile) {
                Some(product) => println!("{}", serde_json::to_string_pretty(&product)?),
                None => println!("Page dropped: no title or no images."),
            }
            Ok(())
        }
        Commands::Shopify { shop_url, vendor, out } => {
            let fetcher = shopify_api::HttpPageFetcher::new();
            let products = shopify_api::fetch_all_products(&fetcher, &shop_url).await?;
            println!("{} products found", products.len());
            let rows = shopify_api::api_rows(&products, &vendor);
            rows::write_csv_file(&out, &rows)?;
            println!("CSV written: {} ({} rows)", out.display(), rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn scrape_phase(args: &ScrapeArgs) -> anyhow::Result<()> {
    let profile = Arc::new(args.site.profile(&args.product_paths));

    let fetcher = sitemap::HttpXmlFetcher::new();
    let all_urls = sitemap::resolve(&fetcher, &args.sitemap_url).await?;
    let mut product_urls: Vec<String> = all_urls
        .into_iter()
        .filter(|u| profile.is_product_url(u))
        .collect();
    println!(
        "{} product pages detected ({} profile)",
        product_urls.len(),
        profile.name
    );
    if let Some(limit) = args.limit {
        product_urls.truncate(limit);
    }
    if product_urls.is_empty() {
        println!("Nothing to scrape.");
        return Ok(());
    }

    let renderer = Arc::new(SpiderRenderer::from_env()?);
    let (products, stats) = pipeline::scrape_catalog(renderer, product_urls, profile).await?;
    println!(
        "Scraped {} pages ({} ok, {} dropped, {} errors)",
        stats.total, stats.ok, stats.dropped, stats.errors
    );

    product::save_snapshot(&args.snapshot, &products)?;
    println!("Snapshot written: {} ({} products)", args.snapshot.display(), products.len());
    Ok(())
}

fn export_phase(args: &ExportArgs) -> anyhow::Result<()> {
    let products = product::load_snapshot(&args.input)?;
    let labels = ExportLabels {
        vendor: args.vendor.clone(),
        product_type: args.product_type.clone(),
        tags: args.tags.clone(),
    };

    let mut rows = Vec::new();
    let mut kept = 0usize;
    for raw in products {
        // Hand-edited snapshots can reintroduce pages the extractor drops
        if raw.title.is_empty() || raw.images.is_empty() {
            continue;
        }
        kept += 1;
        let normalized = normalize::normalize(raw);
        debug!("{} -> handle '{}'", normalized.url, normalized.handle);
        rows.extend(rows::build_rows(&normalized, &labels));
    }

    rows::write_csv_file(&args.out, &rows)?;
    println!(
        "CSV written: {} ({} products, {} rows)",
        args.out.display(),
        kept,
        rows.len()
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
