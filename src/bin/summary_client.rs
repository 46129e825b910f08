use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::{Args, Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "summary-client",
    about = "Command-line client for a running summary gateway"
)]
struct Cli {
    /// Base URL of the gateway.
    #[arg(long, global = true, default_value = "http://localhost:10000")]
    url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize inline text or a PDF file.
    Summarize(SummarizeArgs),
    /// Synthesize speech for a summary and write the decoded audio to disk.
    Audio {
        #[arg(long)]
        text: String,
        #[arg(long)]
        output: PathBuf,
    },
    /// Summarize every `.pdf` below a directory into `<name>.summary.txt` files.
    Batch {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SummarizeArgs {
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioResponse {
    audio_data: String,
    mime_type: String,
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
    let client = GatewayClient::new(&cli.url);
    match cli.command {
        Command::Summarize(args) => {
            let summary = match (args.text, args.file) {
                (Some(text), _) => client.summarize_text(&text).await?,
                (None, Some(file)) => client.summarize_file(&file).await?,
                (None, None) => bail!("pass --text or --file"),
            };
            println!("{summary}");
        }
        Command::Audio { text, output } => {
            let mime_type = client.audio(&text, &output).await?;
            println!("Wrote {} ({mime_type})", output.display());
        }
        Command::Batch { dir, output } => {
            let count = batch(&client, &dir, &output).await?;
            println!("Wrote {count} summaries to {}", output.display());
        }
    }
    Ok(())
}

struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn summarize_text(&self, text: &str) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint("summary"))
            .json(&json!({ "text": text }))
            .send()
            .await
            .context("Failed to reach gateway")?;
        let body: SummaryResponse = decode(response).await?;
        Ok(body.summary)
    }

    async fn summarize_file(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        if !is_pdf(path) {
            let text = String::from_utf8(bytes)
                .with_context(|| format!("{} is not UTF-8 text", path.display()))?;
            return self.summarize_text(&text).await;
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .context("Invalid MIME type")?;
        let response = self
            .http
            .post(self.endpoint("summary"))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .context("Failed to reach gateway")?;
        let body: SummaryResponse = decode(response).await?;
        Ok(body.summary)
    }

    async fn audio(&self, text: &str, output: &Path) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint("audio-summary"))
            .json(&json!({ "summaryText": text }))
            .send()
            .await
            .context("Failed to reach gateway")?;
        let body: AudioResponse = decode(response).await?;
        let audio = STANDARD
            .decode(body.audio_data.as_bytes())
            .context("Gateway returned invalid base64 audio")?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(output, audio).with_context(|| format!("Failed to write {}", output.display()))?;
        Ok(body.mime_type)
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Gateway returned a non-JSON body ({status})"))?;
    if !status.is_success() {
        let error = body.get("error").and_then(Value::as_str).unwrap_or("request failed");
        return Err(match body.get("detail").and_then(Value::as_str) {
            Some(detail) => anyhow!("{status}: {error} ({detail})"),
            None => anyhow!("{status}: {error}"),
        });
    }
    serde_json::from_value(body).context("Unexpected gateway response shape")
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

async fn batch(client: &GatewayClient, dir: &Path, output: &Path) -> Result<usize> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    if files.is_empty() {
        bail!("No .pdf files found under {}", dir.display());
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut failures = String::new();
    let mut written = 0;
    for path in &files {
        match client.summarize_file(path).await {
            Ok(summary) => {
                let target = output.join(summary_file_name(path));
                fs::write(&target, summary)
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                written += 1;
            }
            Err(err) => writeln!(failures, "  {}: {err:#}", path.display())?,
        }
    }

    if !failures.is_empty() {
        eprintln!("Some files could not be summarized:\n{failures}");
    }
    Ok(written)
}

fn summary_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}.summary.txt")
}
