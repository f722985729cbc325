//! Metaloom CLI — schema-driven metadata transformation and reconciliation.
//!
//! Usage:
//!   metaloom run --schema schema.yaml --workflow workflow.yaml --input doc.json
//!   metaloom reconcile --schema schema.yaml --config reconcile.yaml --snapshot snap.json

use clap::{Parser, Subcommand};
use metaloom::{
    ArtifactSnapshot, LogNotifier, PipelineExecutor, ReconcileConfig, Reconciler, Schema,
    SqliteResourceStore, TransformationRegistry, WorkflowConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "metaloom",
    version,
    about = "Schema-driven metadata transformation and reconciliation engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a transformation workflow over one document
    Run {
        /// Path to the schema YAML file
        #[arg(long)]
        schema: PathBuf,
        /// Path to the workflow YAML file
        #[arg(long)]
        workflow: PathBuf,
        /// Path to the input document (JSON)
        #[arg(long)]
        input: PathBuf,
        /// Optional annotation document passed to transformations (JSON)
        #[arg(long)]
        annotation: Option<PathBuf>,
        /// Print only this artifact instead of all of them
        #[arg(long)]
        artifact: Option<String>,
        /// Write artifacts as <name>.json files into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Reconcile an artifact snapshot into the resource store
    Reconcile {
        /// Path to the schema YAML file
        #[arg(long)]
        schema: PathBuf,
        /// Path to the reconciliation config YAML file
        #[arg(long)]
        config: PathBuf,
        /// Path to the snapshot (JSON map of artifact type to instances)
        #[arg(long)]
        snapshot: PathBuf,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Get the default database path (~/.local/share/metaloom/metaloom.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let metaloom_dir = data_dir.join("metaloom");
    std::fs::create_dir_all(&metaloom_dir).ok();
    metaloom_dir.join("metaloom.db")
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))
}

fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    serde_json::from_str(&read_file(path)?)
        .map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
}

fn load_schema(path: &Path) -> Result<Schema, String> {
    Schema::from_yaml(&read_file(path)?)
        .map_err(|e| format!("cannot load schema '{}': {}", path.display(), e))
}

fn cmd_run(
    schema: &Path,
    workflow: &Path,
    input: &Path,
    annotation: Option<&Path>,
    artifact: Option<&str>,
    out: Option<&Path>,
) -> i32 {
    let result = (|| -> Result<i32, String> {
        let schema = load_schema(schema)?;
        let config = WorkflowConfig::from_yaml(&read_file(workflow)?)
            .map_err(|e| format!("cannot load workflow '{}': {}", workflow.display(), e))?;
        let registry = TransformationRegistry::with_builtins();
        let workflow = config
            .build(&registry)
            .map_err(|e| format!("invalid workflow: {}", e))?;

        let document = read_json(input)?;
        let annotation = annotation.map(read_json).transpose()?;

        let executor = PipelineExecutor::new();
        let artifacts = executor
            .run(&workflow, schema, document, annotation.as_ref())
            .map_err(|e| format!("workflow failed: {}", e))?;

        if let Some(name) = artifact {
            let found = artifacts
                .get(name)
                .ok_or_else(|| format!("workflow declares no artifact '{}'", name))?;
            println!("{}", serde_json::to_string_pretty(&found.document).unwrap_or_default());
            return Ok(0);
        }

        if let Some(dir) = out {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("cannot create '{}': {}", dir.display(), e))?;
            for (name, artifact) in &artifacts {
                let path = dir.join(format!("{}.json", name));
                let json = serde_json::to_string_pretty(&artifact.document)
                    .map_err(|e| format!("cannot serialize artifact '{}': {}", name, e))?;
                std::fs::write(&path, json)
                    .map_err(|e| format!("cannot write '{}': {}", path.display(), e))?;
                println!("Wrote artifact '{}' to {}", name, path.display());
            }
        } else {
            for (name, artifact) in &artifacts {
                println!("=== {} ===", name);
                println!("{}", serde_json::to_string_pretty(&artifact.document).unwrap_or_default());
            }
        }
        Ok(0)
    })();

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_reconcile(
    schema: &Path,
    config: &Path,
    snapshot: &Path,
    db: Option<PathBuf>,
) -> i32 {
    let result = async {
        let schema = load_schema(schema)?;
        let config = ReconcileConfig::from_yaml(&read_file(config)?)
            .map_err(|e| format!("cannot load config '{}': {}", config.display(), e))?;
        let snapshot: ArtifactSnapshot = serde_json::from_str(&read_file(snapshot)?)
            .map_err(|e| format!("cannot parse snapshot '{}': {}", snapshot.display(), e))?;

        let db_path = db.unwrap_or_else(default_db_path);
        let store = SqliteResourceStore::open(&db_path)
            .map_err(|e| format!("cannot open database '{}': {}", db_path.display(), e))?;

        let reconciler = Reconciler::new(
            &schema,
            config,
            Arc::new(store),
            Arc::new(LogNotifier::new()),
        )
        .map_err(|e| format!("invalid reconciliation setup: {}", e))?;

        let report = reconciler
            .reconcile(&snapshot)
            .await
            .map_err(|e| format!("reconciliation failed: {}", e))?;

        println!("{:<24}  {:>8}  {:>8}  {:>8}", "ARTIFACT", "CREATED", "CHANGED", "REMOVED");
        println!("{}", "-".repeat(56));
        for (artifact, counts) in &report {
            println!(
                "{:<24}  {:>8}  {:>8}  {:>8}",
                artifact, counts.created, counts.changed, counts.removed
            );
        }
        Ok::<i32, String>(0)
    }
    .await;

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run {
            schema,
            workflow,
            input,
            annotation,
            artifact,
            out,
        } => cmd_run(
            &schema,
            &workflow,
            &input,
            annotation.as_deref(),
            artifact.as_deref(),
            out.as_deref(),
        ),
        Commands::Reconcile {
            schema,
            config,
            snapshot,
            db,
        } => cmd_reconcile(&schema, &config, &snapshot, db).await,
    };
    std::process::exit(code);
}
