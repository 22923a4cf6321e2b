//! oncokb-annotate: Print the annotation views for one gene query as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use oncokb_annotation::table::{sort_biological, sort_clinical};
use oncokb_annotation::{AnnotationStore, SortColumn};
use oncokb_client::HttpAnnotationSource;
use oncokb_common::{OncokbConfig, ReferenceGenome};
use oncokb_ordering::{Direction, Oncogenicity};

#[derive(Debug, Parser)]
#[command(name = "oncokb-annotate", version, about = "Annotate a gene or variant and print the derived views")]
struct Cli {
    /// Gene symbol or alias, e.g. BRAF.
    #[arg(long)]
    gene: Option<String>,

    #[arg(long)]
    alteration: Option<String>,

    #[arg(long)]
    tumor_type: Option<String>,

    #[arg(long, help = "GRCh37 or GRCh38")]
    reference_genome: Option<String>,

    /// Keep only rows of these oncogenicity classes (repeatable).
    #[arg(long)]
    oncogenicity: Vec<String>,

    /// Select bar chart cancer types (repeatable).
    #[arg(long)]
    cancer_type: Vec<String>,

    /// Keep only rows starting at these protein positions (repeatable).
    #[arg(long)]
    position: Vec<i32>,

    /// Sort the tables by alteration, level, oncogenicity, mutation-effect, cancer-type or citations.
    #[arg(long, default_value = "alteration")]
    sort: SortColumn,

    #[arg(long, default_value_t = false)]
    desc: bool,

    #[arg(long, env = "ONCOKB_CONFIG", help = "Path to oncokb.toml")]
    config: Option<PathBuf>,

    #[arg(long, env = "ONCOKB_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "ONCOKB_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the JSON, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("oncokb=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => OncokbConfig::from_path(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => OncokbConfig::load()?,
    };

    if let Some(gene) = cli.gene.clone() {
        config.query.hugo_symbol = gene;
    }
    if cli.alteration.is_some() {
        config.query.alteration = cli.alteration.clone();
    }
    if cli.tumor_type.is_some() {
        config.query.tumor_type = cli.tumor_type.clone();
    }
    if let Some(genome) = &cli.reference_genome {
        config.query.reference_genome = genome.parse::<ReferenceGenome>()?;
    }
    if let Some(base_url) = cli.base_url.clone() {
        config.client.base_url = base_url;
    }
    if cli.api_token.is_some() {
        config.client.api_token = cli.api_token.clone();
    }
    if config.query.hugo_symbol.trim().is_empty() {
        anyhow::bail!("no gene given: pass --gene or set query.hugo_symbol in the config file");
    }

    let oncogenicity = cli
        .oncogenicity
        .iter()
        .map(|value| {
            Oncogenicity::parse(value).with_context(|| format!("unknown oncogenicity class: {value}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    info!(
        gene = %config.query.hugo_symbol,
        base_url = %config.client.base_url,
        "annotating"
    );

    let source = HttpAnnotationSource::new(&config.client)?;
    let mut store = AnnotationStore::from_config(Arc::new(source), &config);
    store.set_oncogenicity_filter(oncogenicity);
    store.set_cancer_type_filter(cli.cancer_type.iter().cloned());
    store.set_position_filter(cli.position.iter().copied());

    // The first read starts every fetch; the second picks up the results.
    store.snapshot();
    store.settle().await;
    let mut snapshot = store.snapshot();
    let direction = if cli.desc { Direction::Descending } else { Direction::Ascending };
    sort_clinical(&mut snapshot.filtered_clinical_alterations.value, cli.sort, direction);
    sort_biological(&mut snapshot.filtered_biological_alterations.value, cli.sort, direction);

    for (node, error) in &snapshot.errors {
        warn!(node = %node, %error, "fetch failed");
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");

    store.destroy();
    Ok(())
}
