use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};

use ogeditor::{
    preview, Diagnostics, EditorConfig, EditorPipeline, MemoryStorage, TemplateCompiler,
};

/// Headless OpenGraph template editor: compile, render and publish
/// templates without the UI.
#[derive(Parser)]
#[command(name = "ogeditor", version, about)]
struct Cli {
    /// Base URL of the hosted rendering service
    #[arg(long)]
    service: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile the template locally and print the preview document
    Compile {
        /// Template HTML file (Handlebars)
        #[arg(long)]
        html: PathBuf,
        /// Stylesheet file
        #[arg(long)]
        css: PathBuf,
        /// JSON parameter file
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Render the template through the hosted service and write the image
    Render {
        #[arg(long)]
        html: PathBuf,
        #[arg(long)]
        css: PathBuf,
        #[arg(long)]
        params: Option<PathBuf>,
        /// Output image path
        #[arg(long, default_value = "preview.png")]
        out: PathBuf,
    },
    /// Publish the template to the hosted service
    Publish {
        #[arg(long)]
        html: PathBuf,
        #[arg(long)]
        css: PathBuf,
        /// API key forwarded in the Authorization header
        #[arg(long)]
        api_key: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = EditorConfig::default();
    if let Some(service) = cli.service {
        config.service_url = service;
    }

    match cli.command {
        Command::Compile { html, css, params } => {
            let (html, css, params_text) = load_buffers(&html, &css, params.as_deref())?;
            let params = serde_json::from_str(&params_text)
                .context("params file is not a JSON object")?;
            let compiler = TemplateCompiler::new(Diagnostics::new());
            let compiled = compiler.compile(&html, &params);
            println!("{}", preview::preview_document(&compiled, &css));
        }
        Command::Render {
            html,
            css,
            params,
            out,
        } => {
            let (html, css, params_text) = load_buffers(&html, &css, params.as_deref())?;
            let pipeline = EditorPipeline::new(config, Arc::new(MemoryStorage::new()))?;
            pipeline.set_html(html);
            pipeline.set_css(css);
            if !pipeline.set_params_text(params_text) {
                bail!("params file is not a JSON object");
            }
            pipeline.flush();

            let rendered = pipeline.remote_preview();
            if rendered.image_data_uri.is_empty() {
                let detail = pipeline
                    .diagnostics()
                    .last()
                    .map(|d| d.message)
                    .unwrap_or_else(|| "no diagnostic recorded".to_string());
                pipeline.close();
                bail!("render produced no image: {}", detail);
            }
            let bytes = decode_data_uri(&rendered.image_data_uri)?;
            fs::write(&out, bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Wrote {}", out.display());
            pipeline.close();
        }
        Command::Publish { html, css, api_key } => {
            let (html, css, _) = load_buffers(&html, &css, None)?;
            let pipeline = EditorPipeline::new(config, Arc::new(MemoryStorage::new()))?;
            pipeline.set_html(html);
            pipeline.set_css(css);
            let template = pipeline.publish(&api_key)?;
            pipeline.close();
            println!("Save successful. Use template ID {}.", template);
        }
    }

    Ok(())
}

fn load_buffers(
    html: &std::path::Path,
    css: &std::path::Path,
    params: Option<&std::path::Path>,
) -> anyhow::Result<(String, String, String)> {
    let html = fs::read_to_string(html)
        .with_context(|| format!("failed to read {}", html.display()))?;
    let css = fs::read_to_string(css)
        .with_context(|| format!("failed to read {}", css.display()))?;
    let params = match params {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => "{}".to_string(),
    };
    Ok((html, css, params))
}

fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let payload = uri
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .context("preview is not a base64 data URI")?;
    STANDARD
        .decode(payload)
        .context("preview data URI is not valid base64")
}
