use anyhow::{bail, Context};
use clap::Parser;
use recall_core::Mode;
use recall_store::{Catalog, Database, DatabaseSpec, FileStore};
use recalld::cli::{default_catalog_path, Cli, Command, DbCommand, ServeArgs};
use recalld::http::{router, AppState};
use recalld::metrics::AppMetrics;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Db { command } => run_db_command(command),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let (data_dir, dims, mode_name) = resolve_database(&args)?;
    let mode: Mode = mode_name.parse()?;

    tracing::info!("Opening database: {} dims, mode {}", dims, mode);
    tracing::info!("Record directory: {}", data_dir.display());

    let store = Box::new(FileStore::open(&data_dir)?);
    let db = Database::open(store, dims, mode)?;

    let state = AppState {
        db: Arc::new(db),
        metrics: Arc::new(AppMetrics::new()),
    };
    let app = router(state);

    tracing::info!("Starting recalld on {}", args.addr);
    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received shutdown signal, gracefully shutting down...");
        })
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve the record directory, dimension, and mode for `serve`,
/// either from a catalog entry or from the ad-hoc flags.
fn resolve_database(args: &ServeArgs) -> anyhow::Result<(PathBuf, usize, String)> {
    if let Some(name) = &args.db {
        let path = args.config.clone().unwrap_or_else(default_catalog_path);
        let catalog = Catalog::load(&path)?;
        let spec = catalog
            .get(name)
            .with_context(|| format!("database '{}' is not registered in {}", name, path.display()))?;
        if spec.kind != "file" {
            bail!("unsupported store kind '{}'", spec.kind);
        }
        return Ok((PathBuf::from(&spec.uri), spec.dims, spec.mode.clone()));
    }

    match (&args.data_dir, args.dims, &args.mode) {
        (Some(dir), Some(dims), Some(mode)) => Ok((dir.clone(), dims, mode.clone())),
        _ => bail!("either --db or --data-dir with --dims and --mode is required"),
    }
}

fn run_db_command(command: DbCommand) -> anyhow::Result<()> {
    match command {
        DbCommand::Add {
            name,
            dims,
            mode,
            uri,
            config,
        } => {
            // Reject bad modes before they land in the catalog.
            mode.parse::<Mode>()?;
            let mut catalog = Catalog::load(config.unwrap_or_else(default_catalog_path))?;
            catalog.add(
                &name,
                DatabaseSpec {
                    kind: "file".to_string(),
                    mode,
                    dims,
                    uri,
                },
            )?;
            println!("Registered database '{}'", name);
        }
        DbCommand::Remove { name, config } => {
            let mut catalog = Catalog::load(config.unwrap_or_else(default_catalog_path))?;
            catalog.remove(&name)?;
            println!("Removed database '{}'", name);
        }
        DbCommand::List { config } => {
            let catalog = Catalog::load(config.unwrap_or_else(default_catalog_path))?;
            for (name, spec) in catalog.entries() {
                println!(
                    "{}\t{}\tdims={}\tmode={}\turi={}",
                    name, spec.kind, spec.dims, spec.mode, spec.uri
                );
            }
        }
    }
    Ok(())
}
