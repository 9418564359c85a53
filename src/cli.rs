use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use anyhow::{Context, Result};
use serde_json::Value;
use crate::client::CubicClient;
use crate::config::ClientConfig;
use crate::invoice::{publish_invoice, InvoiceData};
use crate::load_config::load_config;
use crate::render::PdfRenderer;
use crate::types::{CreateFolder, DeleteFolder};

/// CLI for cubic-invoice: browse cubics and publish rendered invoices.
#[derive(Parser)]
#[clap(
    name = "cubic-invoice",
    version,
    about = "Browse content-delivery cubics and publish rendered PDF invoices to them"
)]
pub struct Cli {
    /// Overrides CUBIC_BASE_URL for the API commands
    #[clap(long, global = true)]
    pub base_url: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SectionView {
    /// The section record itself
    Section,
    /// The flat file listing
    Singles,
    /// The folder listing
    Folders,
    /// All three, fetched concurrently
    All,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every cubic on the account
    Cubics,
    /// Show one cubic
    Cubic {
        #[clap(long)]
        id: String,
    },
    /// Show a section of a cubic (image, music, video or files)
    Section {
        #[clap(long)]
        id: String,
        #[clap(long)]
        section: String,
        #[clap(long, value_enum, default_value = "section")]
        view: SectionView,
    },
    /// Show one folder of a section
    Folder {
        #[clap(long)]
        id: String,
        #[clap(long)]
        section: String,
        #[clap(long)]
        folder: String,
    },
    /// Create a folder in a section
    CreateFolder {
        #[clap(long)]
        id: String,
        #[clap(long)]
        name: String,
        #[clap(long)]
        section: String,
        #[clap(long)]
        folder: String,
    },
    /// Delete a folder and its files
    DeleteFolder {
        #[clap(long)]
        id: String,
        #[clap(long)]
        name: String,
        #[clap(long)]
        section: String,
        #[clap(long)]
        folder: String,
        #[clap(long)]
        folder_id: String,
    },
    /// Render an invoice to PDF and upload it using the given job file
    Invoice {
        /// Path to the YAML job file
        #[clap(long)]
        config: PathBuf,
        /// Path to the JSON invoice record
        #[clap(long)]
        data: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let output = match cli.command {
        Commands::Invoice { config, data } => {
            let config = load_config(config)?;
            let raw = std::fs::read_to_string(&data)
                .with_context(|| format!("Failed to read invoice data {:?}", data))?;
            let record: InvoiceData = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse invoice data {:?}", data))?;

            let client = CubicClient::new(config.client)?;
            let renderer = PdfRenderer::new(config.template_dir);
            println!("Publishing invoice {}...", record.order_info.inv_no);
            match publish_invoice(&renderer, &client, &config.invoice, &record).await {
                Ok(response) => {
                    println!("Invoice published.");
                    response
                }
                Err(e) => {
                    eprintln!("[ERROR] Invoice publishing failed: {}", e);
                    return Err(anyhow::Error::new(e));
                }
            }
        }
        command => {
            let config = ClientConfig::from_env(cli.base_url.as_deref())?;
            let client = CubicClient::new(config)?;
            api_command(&client, command).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn api_command(client: &CubicClient, command: Commands) -> Result<Value> {
    let value = match command {
        Commands::Cubics => client.list_cubics().await?,
        Commands::Cubic { id } => client.get_cubic(&id).await?,
        Commands::Section { id, section, view } => match view {
            SectionView::Section => client.get_section(&id, &section).await?,
            SectionView::Singles => client.get_singles(&id, &section).await?,
            SectionView::Folders => client.get_folders(&id, &section).await?,
            SectionView::All => {
                let (record, singles, folders) = futures::try_join!(
                    client.get_section(&id, &section),
                    client.get_singles(&id, &section),
                    client.get_folders(&id, &section),
                )?;
                serde_json::json!({
                    "section": record,
                    "singles": singles,
                    "folders": folders,
                })
            }
        },
        Commands::Folder { id, section, folder } => client.get_folder(&id, &section, &folder).await?,
        Commands::CreateFolder { id, name, section, folder } => {
            client
                .create_folder(&CreateFolder {
                    cubic_id: id,
                    cubic_name: name,
                    section_name: section,
                    folder_name: folder,
                })
                .await?
        }
        Commands::DeleteFolder { id, name, section, folder, folder_id } => {
            client
                .delete_folder(&DeleteFolder {
                    cubic_id: id,
                    cubic_name: name,
                    section_name: section,
                    folder_name: folder,
                    folder_id,
                })
                .await?
        }
        Commands::Invoice { .. } => anyhow::bail!("invoice is not an API command"),
    };
    Ok(value)
}
