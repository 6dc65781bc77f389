mod config;
mod errors;
mod layout;
mod models;
mod pipeline;
mod print;
mod render;
mod store;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::render::{DocumentRenderer, ExternalCommandRenderer, OpListRenderer};
use crate::store::JsonStore;

#[derive(Parser)]
#[command(name = "labeler", about = "Food-label composition and print core", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List saved labels.
    List,
    /// Render a label to a document without printing.
    Preview {
        id: Uuid,
        /// Production date (YYYY-MM-DD); defaults to the last one used.
        #[arg(long)]
        production_date: Option<NaiveDate>,
    },
    /// Render a label and send it to the spooler.
    Print {
        id: Uuid,
        #[arg(long)]
        production_date: Option<NaiveDate>,
    },
    /// Import labels from an exported JSON file.
    Import { path: std::path::PathBuf },
    /// Export all labels to a JSON file.
    Export { path: std::path::PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut store = JsonStore::open(config.data_dir.join("store.json"))
        .context("failed to open label store")?;

    match cli.command {
        Command::List => {
            for label in store.labels()? {
                println!("{}  {}", label.id, label.display_name());
            }
        }
        Command::Preview { id, production_date } => {
            let preview = run_pipeline(&config, &mut store, id, production_date, false).await?;
            println!("{}", preview.display());
        }
        Command::Print { id, production_date } => {
            let outcome = run_pipeline(&config, &mut store, id, production_date, true).await?;
            println!("{}", outcome.display());
        }
        Command::Import { path } => {
            let count = store.import_labels(&path)?;
            println!("imported {count} labels");
        }
        Command::Export { path } => {
            let count = store.export_labels(&path)?;
            println!("exported {count} labels");
        }
    }
    Ok(())
}

struct Outcome {
    path: Option<std::path::PathBuf>,
    warnings: usize,
    printed: bool,
}

impl Outcome {
    fn display(&self) -> String {
        let action = if self.printed { "printed" } else { "previewed" };
        match &self.path {
            Some(path) => format!("{action} {} ({} warnings)", path.display(), self.warnings),
            None => format!("{action} ({} warnings)", self.warnings),
        }
    }
}

async fn run_pipeline(
    config: &Config,
    store: &mut JsonStore,
    id: Uuid,
    production_date: Option<NaiveDate>,
    print: bool,
) -> Result<Outcome> {
    let label = store
        .label(id)?
        .with_context(|| format!("no label with id {id}"))?;
    let settings = store.settings_for(id)?;
    let production = match production_date {
        Some(date) => {
            store.set_last_production_date(date)?;
            Some(date)
        }
        None => store.last_production_date()?,
    };

    info!(label = %label.display_name(), print, "running pipeline");
    let out_dir = config.data_dir.join("out");
    match &config.renderer_command {
        Some(command) => {
            let pipeline = Pipeline::new(ExternalCommandRenderer::new(command.clone()), out_dir);
            run_on(&pipeline, &label, &settings, production, print).await
        }
        None => {
            let pipeline = Pipeline::new(OpListRenderer, out_dir);
            run_on(&pipeline, &label, &settings, production, print).await
        }
    }
}

async fn run_on<R: DocumentRenderer>(
    pipeline: &Pipeline<R>,
    label: &crate::models::label::LabelRecord,
    settings: &crate::config::PrintSettings,
    production: Option<NaiveDate>,
    print: bool,
) -> Result<Outcome> {
    if print {
        // A fresh pipeline has no concurrent callers, so the preview inside
        // print can never be superseded.
        let warnings = pipeline.print(label, settings, production).await?;
        Ok(Outcome { path: None, warnings: warnings.len(), printed: true })
    } else {
        let preview = pipeline
            .preview(label, settings, production)
            .await?
            .context("preview unexpectedly superseded")?;
        Ok(Outcome {
            path: Some(preview.document.path),
            warnings: preview.warnings.len(),
            printed: false,
        })
    }
}
