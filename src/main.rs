//! Command-line front end for the document backend.
use std::{collections::BTreeMap, fmt::Write as _, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use docpoint_client::{
    ApiClient, DocumentApi, DocumentFile, config, logging,
    client::{DataPointResults, DocumentList, UploadReceipt},
};
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "docpoint",
    about = "Upload documents and read extracted data points"
)]
struct Cli {
    /// Backend base URL; overrides `DOCPOINT_API_URL`.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Print the raw JSON response instead of a summary.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a document and request data points to extract from it.
    Upload {
        path: PathBuf,
        #[arg(long = "data-point")]
        data_points: Vec<String>,
        #[arg(long)]
        mime: Option<String>,
    },
    /// List uploaded documents.
    List,
    /// Show extracted data points for a document.
    Datapoints { document_id: String },
    /// Store extraction results for a document.
    Update {
        document_id: String,
        #[arg(required = true, value_parser = parse_key_value)]
        results: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load().context("failed to load configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    logging::init_tracing(&config);

    let client = ApiClient::new(&config).context("failed to build API client")?;
    let output = execute(&client, cli.command, cli.json).await?;
    println!("{output}");
    Ok(())
}

async fn execute<A>(api: &A, command: Command, json: bool) -> Result<String>
where
    A: DocumentApi,
{
    match command {
        Command::Upload {
            path,
            data_points,
            mime,
        } => {
            let mut file = DocumentFile::from_path(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            if let Some(mime) = mime {
                file = file.with_mime(mime);
            }
            let descriptors: Vec<Value> = data_points.into_iter().map(Value::String).collect();
            let value = api.upload_document(file, &descriptors).await?;
            render(value, json, |value| {
                let receipt: UploadReceipt = serde_json::from_value(value)?;
                Ok(format!(
                    "Uploaded {} ({})",
                    receipt.document_id, receipt.status
                ))
            })
        }
        Command::List => {
            let value = api.list_documents().await?;
            render(value, json, |value| {
                let list: DocumentList = serde_json::from_value(value)?;
                if list.documents.is_empty() {
                    return Ok("No documents".to_string());
                }
                let mut out = String::new();
                for doc in list.documents {
                    writeln!(out, "{}\t{}\t{}", doc.document_id, doc.status, doc.filename)?;
                }
                Ok(out.trim_end().to_string())
            })
        }
        Command::Datapoints { document_id } => {
            let value = api.get_data_points(&document_id).await?;
            render(value, json, |value| {
                let results: DataPointResults = serde_json::from_value(value)?;
                let mut out = format!("Document {}: {}", results.document_id, results.status);
                for (name, extracted) in results.results {
                    write!(out, "\n  {name}: {extracted}")?;
                }
                Ok(out)
            })
        }
        Command::Update {
            document_id,
            results,
        } => {
            let results: BTreeMap<String, String> = results.into_iter().collect();
            let value = api.update_data_points(&document_id, &results).await?;
            render(value, json, |value| {
                let status = value
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                Ok(format!("Updated {document_id}: {status}"))
            })
        }
    }
}

fn render<F>(value: Value, json: bool, summarize: F) -> Result<String>
where
    F: FnOnce(Value) -> Result<String>,
{
    if json {
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    summarize(value)
}

fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("data point name must not be empty in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
