use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use draftrag_core::config::{expand_path, Config, DataConfig};
use draftrag_core::store::JsonlChunkStore;
use draftrag_core::traits::ChunkStore;
use draftrag_core::types::RetrievalRequest;
use draftrag_core::validation::validate_project_id;
use draftrag_hybrid::RetrievalEngine;

const USAGE: &str = "Usage:\n  draftrag query <project> \"<query>\" [--k N] [--owner ID]\n  draftrag stats <project> [--owner ID]";

struct Args {
    cmd: String,
    positional: Vec<String>,
    k: Option<i64>,
    owner: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut raw = env::args().skip(1);
    let Some(cmd) = raw.next() else { anyhow::bail!("{USAGE}") };
    let mut args = Args { cmd, positional: Vec::new(), k: None, owner: None };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--k" => {
                let value = raw.next().context("--k needs a value")?;
                args.k = Some(value.parse().with_context(|| format!("invalid --k value {value:?}"))?);
            }
            "--owner" => args.owner = Some(raw.next().context("--owner needs a value")?),
            "-h" | "--help" => anyhow::bail!("{USAGE}"),
            _ => args.positional.push(arg),
        }
    }
    Ok(args)
}

// Logs go to stderr so stdout carries only JSON.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = parse_args()?;
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {e}"); e })?;
    let engine_config = config.engine()?;
    let data: DataConfig = config.get("data").unwrap_or_default();
    let store = Arc::new(JsonlChunkStore::new(expand_path(&data.chunk_dir)));

    match args.cmd.as_str() {
        "query" => {
            let [project, query] = args.positional.as_slice() else { anyhow::bail!("{USAGE}") };
            let engine = RetrievalEngine::from_config(store, &engine_config)?;
            let request = RetrievalRequest {
                project_id: project.clone(),
                query: query.clone(),
                k: args.k,
                owner_id: args.owner,
            };
            let response = engine.handle(&request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "stats" => {
            let [project] = args.positional.as_slice() else { anyhow::bail!("{USAGE}") };
            validate_project_id(project)?;
            let owner = args.owner.as_deref();
            if !store.project_accessible(project, owner).await? {
                anyhow::bail!("project not found: {project}");
            }
            let chunks = store.find_eligible_chunks(project, owner).await?;
            let embedded = chunks.iter().filter(|c| c.dense_vector().is_some()).count();
            let stats = serde_json::json!({
                "project_id": project,
                "chunk_dir": data.chunk_dir,
                "eligible_chunks": chunks.len(),
                "embedded_chunks": embedded,
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        other => anyhow::bail!("Unknown command: {other}\n{USAGE}"),
    }
    Ok(())
}
