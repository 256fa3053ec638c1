//! avaluos: command-line front end of the avalúos document tracker.
//!
//! Configuration comes from the environment (and `.env`). See `Config::from_env`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use avaluos_cli::{format_links, format_table, init_tracing};
use avaluos_core::{
    object_name_from_reference, validation::content_type_for_filename, Config, DocumentSlot,
    FilterState, UploadFile,
};
use avaluos_db::{connect, AvaluoRepository, AvaluoStore, UserRoleRepository};
use avaluos_services::{
    DocumentQuery, DocumentTracker, DocumentUploadService, JwtIdentity, LinkResolver, QueryEvent,
    RefreshTask, UploadSettings,
};
use avaluos_storage::create_storage;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::{broadcast::error::RecvError, watch};

#[derive(Parser)]
#[command(name = "avaluos", about = "Avalúos document tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Address contains (case-insensitive)
    #[arg(long, default_value = "")]
    direccion: String,
    /// Folio SHIT contains (case-insensitive)
    #[arg(long, default_value = "")]
    folio_shit: String,
    /// Do not include in-progress records
    #[arg(long)]
    hide_in_progress: bool,
    /// Include closed records
    #[arg(long)]
    closed: bool,
    /// Show cancelled records instead of active ones
    #[arg(long)]
    cancelled: bool,
    /// Only records already sent
    #[arg(long)]
    sent: bool,
}

impl From<FilterArgs> for FilterState {
    fn from(args: FilterArgs) -> Self {
        FilterState {
            direccion: args.direccion,
            folio_shit: args.folio_shit,
            show_in_progress: !args.hide_in_progress,
            show_closed: args.closed,
            show_cancelled: args.cancelled,
            show_sent: args.sent,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List records matching the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Also print a fresh signed URL for every stored document
        #[arg(long)]
        links: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Keep printing the filtered records as they refresh (Ctrl-C to stop)
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Upload a document into a record's slot
    Upload {
        /// Record id
        #[arg(long)]
        id: i64,
        /// Document column, e.g. predial or ine_comp
        #[arg(long)]
        slot: String,
        /// File to upload
        file: PathBuf,
        /// Content type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Print a fresh signed URL for a stored reference
    Link {
        /// Object name or previously stored URL
        reference: String,
    },
    /// Download the stored object behind a reference
    Fetch {
        /// Object name or previously stored URL
        reference: String,
        /// Destination file; defaults to the object name in the current directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let result = match cli.command {
        Commands::List {
            filters,
            links,
            format,
        } => list(&config, filters.into(), links, format).await,
        Commands::Watch { filters } => watch_records(&config, filters.into()).await,
        Commands::Upload {
            id,
            slot,
            file,
            content_type,
        } => upload(&config, id, &slot, file, content_type).await,
        Commands::Link { reference } => link(&config, &reference).await,
        Commands::Fetch { reference, output } => fetch(&config, &reference, output).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{:#}", e), "Command failed");
    }
    result
}

async fn list(
    config: &Config,
    filters: FilterState,
    links: bool,
    format: OutputFormat,
) -> Result<()> {
    let pool = connect(config).await?;
    let query = DocumentQuery::new(Arc::new(AvaluoRepository::new(pool)));
    let rows = query.get(&filters).await?;
    tracing::info!(rows = rows.len(), "Records fetched");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows.as_slice())?),
        OutputFormat::Table => print!("{}", format_table(&rows)),
    }

    if links {
        let storage = create_storage(config).await?;
        let resolver = LinkResolver::with_ttl(storage, config.signed_url_ttl);
        for row in rows.iter() {
            let cells = resolver.resolve_row(row).await;
            print!("{}", format_links(row, &cells));
        }
    }

    Ok(())
}

async fn watch_records(config: &Config, filters: FilterState) -> Result<()> {
    let pool = connect(config).await?;
    let query = DocumentQuery::new(Arc::new(AvaluoRepository::new(pool)));

    let (_filters_tx, filters_rx) = watch::channel(filters.clone());
    let mut events = query.subscribe(&filters);
    let refresh = RefreshTask::new(query.clone(), filters_rx, config.refresh_interval).start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(QueryEvent::Updated) | Err(RecvError::Lagged(_)) => {
                    if let Some(rows) = query.cached(&filters).and_then(|c| c.data) {
                        print!("{}", format_table(&rows));
                    }
                }
                Ok(QueryEvent::Invalidated) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }

    refresh.abort();
    Ok(())
}

async fn upload(
    config: &Config,
    id: i64,
    slot: &str,
    file: PathBuf,
    content_type: Option<String>,
) -> Result<()> {
    let slot: DocumentSlot = slot.parse()?;

    let data = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("File name is not valid UTF-8")?
        .to_string();
    let content_type =
        content_type.unwrap_or_else(|| content_type_for_filename(&file_name).to_string());

    let pool = connect(config).await?;
    let store: Arc<dyn AvaluoStore> = Arc::new(AvaluoRepository::new(pool.clone()));
    let record = store
        .get(id)
        .await?
        .with_context(|| format!("Avalúo {} not found", id))?;

    let uploads = DocumentUploadService::new(
        store.clone(),
        Arc::new(UserRoleRepository::new(pool)),
        create_storage(config).await?,
        Arc::new(JwtIdentity::from_config(config)?),
        UploadSettings::from_config(config),
    );
    let tracker = DocumentTracker::new(DocumentQuery::new(store.clone()), uploads);

    if !tracker.open_upload(record, slot.column()) {
        bail!("Column {} does not hold documents", slot);
    }
    tracker
        .upload_document(UploadFile::new(file_name, content_type, data))
        .await;

    let session = tracker.session();
    if let Some(error) = session.error {
        bail!(error);
    }

    let linked = store.get(id).await?;
    if let Some(reference) = linked.as_ref().and_then(|r| r.document(slot)) {
        tracing::info!(avaluo.id = id, slot = %slot, "Document uploaded");
        println!("{}", reference);
    }
    Ok(())
}

async fn link(config: &Config, reference: &str) -> Result<()> {
    let storage = create_storage(config).await?;
    let resolver = LinkResolver::with_ttl(storage, config.signed_url_ttl);

    match resolver.resolve(Some(reference)).await.url() {
        Some(url) => {
            println!("{}", url);
            Ok(())
        }
        None => bail!("Could not sign a URL for {}", reference),
    }
}

async fn fetch(config: &Config, reference: &str, output: Option<PathBuf>) -> Result<()> {
    let name = object_name_from_reference(reference)
        .with_context(|| format!("No object name in {}", reference))?;
    let storage = create_storage(config).await?;

    let data = storage
        .get_object(&name)
        .await
        .with_context(|| format!("Could not download {}", name))?;
    let output = output.unwrap_or_else(|| PathBuf::from(&name));
    tokio::fs::write(&output, &data)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        object = %name,
        size = data.len(),
        path = %output.display(),
        "Document downloaded"
    );
    Ok(())
}
