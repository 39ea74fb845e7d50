use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use sheet_gateway::config::NormalizerConfig;
use sheet_gateway::normalizer::{normalize, NormalizeOptions};

#[derive(Parser)]
#[command(name = "sheet-cli")]
#[command(about = "Command-line tools for the spreadsheet normalizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a normalizer service is up
    Health {
        #[arg(short, long, default_value = "http://localhost:5001")]
        url: String,
    },
    /// Send a workbook to a normalizer service
    Normalize {
        file: PathBuf,
        #[arg(short, long, default_value = "http://localhost:5001")]
        url: String,
        /// Where to write the combined HTML (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Normalize a workbook in-process, without a service
    Local {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Force the header height instead of detecting it
        #[arg(long)]
        header_rows: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Health { url } => {
            let res = reqwest::Client::new()
                .get(format!("{}/health", url.trim_end_matches('/')))
                .send()
                .await?;
            let body = json_response(res).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Normalize { file, url, output } => {
            let bytes = tokio::fs::read(&file).await?;
            let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name(&file));
            let form = reqwest::multipart::Form::new().part("file", part);

            let res = reqwest::Client::new()
                .post(format!("{}/process", url.trim_end_matches('/')))
                .multipart(form)
                .send()
                .await?;
            let body = json_response(res).await?;

            if let Some(names) = body["sheet_names"].as_array() {
                eprintln!("Sheets: {}", names.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(", "));
            }
            let combined = body["combined"].as_str().unwrap_or_default();
            write_output(output.as_deref(), combined).await?;
        }
        Commands::Local {
            file,
            output,
            header_rows,
        } => {
            let bytes = tokio::fs::read(&file).await?;
            let mut options = NormalizeOptions::from(&NormalizerConfig::default());
            options.header_rows = header_rows;

            let name = file_name(&file);
            let document = tokio::task::spawn_blocking(move || normalize(&bytes, &name, &options)).await??;
            for sheet in &document.sheets {
                eprintln!("{}", sheet.summary);
            }
            write_output(output.as_deref(), &document.combined).await?;
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook.xlsx".to_string())
}

async fn write_output(path: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            tokio::fs::write(path, content).await?;
            eprintln!("Wrote {} bytes to {}", content.len(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

async fn json_response(res: reqwest::Response) -> Result<Value, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(format!("service returned status {}: {}", status, text).into());
    }
    Ok(res.json().await?)
}
