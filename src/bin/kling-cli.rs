use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use kling_proxy::config::PollerConfig;
use kling_proxy::imaging::{encode_image, image_dimensions};
use kling_proxy::upstream::{
    AspectRatio, ImageReference, JobKind, Page, Resolution, SubmitRequest, TaskEnvelope,
};
use kling_proxy::ProxyClient;

#[derive(Parser)]
#[command(name = "kling-cli")]
#[command(about = "Submit and track image jobs through kling-proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Seconds between status queries.
    #[arg(long, default_value_t = 2)]
    interval_secs: u64,

    /// Status queries before giving up.
    #[arg(long, default_value_t = 30)]
    max_attempts: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a prompt and/or reference image
    Generate {
        #[arg(short, long)]
        prompt: Option<String>,
        /// Style prepended to the prompt
        #[arg(short, long)]
        style: Option<String>,
        /// Reference image file
        #[arg(short, long)]
        image: Option<PathBuf>,
        #[arg(long)]
        negative_prompt: Option<String>,
        #[arg(long)]
        model: Option<String>,
        /// e.g. 1:1, 16:9, 9:16 (detected from the image when omitted)
        #[arg(long, value_parser = parse_aspect_ratio)]
        aspect_ratio: Option<AspectRatio>,
        #[arg(long, value_parser = parse_resolution)]
        resolution: Option<Resolution>,
        #[arg(short)]
        n: Option<u32>,
        /// Use the image as a face reference instead of a subject reference
        #[arg(long)]
        face: bool,
        /// Print the submission response instead of waiting
        #[arg(long)]
        no_wait: bool,
    },
    /// Outpaint an image in four directions
    Expand {
        image: PathBuf,
        #[arg(long, default_value_t = 0.0)]
        up: f32,
        #[arg(long, default_value_t = 0.0)]
        down: f32,
        #[arg(long, default_value_t = 0.0)]
        left: f32,
        #[arg(long, default_value_t = 0.0)]
        right: f32,
        #[arg(short, long)]
        prompt: Option<String>,
        #[arg(long)]
        no_wait: bool,
    },
    /// Show one task
    Status {
        task_id: String,
        #[arg(long)]
        expand: bool,
    },
    /// List recent tasks
    List {
        #[arg(long)]
        expand: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 30)]
        page_size: u32,
    },
}

fn parse_aspect_ratio(s: &str) -> Result<AspectRatio, String> {
    s.parse()
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    match s {
        "1k" => Ok(Resolution::OneK),
        "2k" => Ok(Resolution::TwoK),
        other => Err(format!("unsupported resolution '{}', expected 1k or 2k", other)),
    }
}

fn kind(expand: bool) -> JobKind {
    if expand {
        JobKind::Expand
    } else {
        JobKind::Generate
    }
}

fn read_image(path: &Path) -> Result<(String, Option<AspectRatio>), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let ratio = image_dimensions(&bytes).and_then(|(w, h)| AspectRatio::from_dimensions(w, h));
    Ok((encode_image(&bytes), ratio))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ProxyClient::new(&cli.url);
    let poller = PollerConfig {
        interval_ms: cli.interval_secs * 1000,
        max_attempts: cli.max_attempts,
    };

    match cli.command {
        Commands::Generate {
            prompt,
            style,
            image,
            negative_prompt,
            model,
            aspect_ratio,
            resolution,
            n,
            face,
            no_wait,
        } => {
            let (image, detected) = match image {
                Some(path) => {
                    let (encoded, ratio) = read_image(&path)?;
                    (Some(encoded), ratio)
                }
                None => (None, None),
            };
            let image_reference = image.as_ref().map(|_| {
                if face {
                    ImageReference::Face
                } else {
                    ImageReference::Subject
                }
            });
            let request = SubmitRequest {
                kind: JobKind::Generate,
                prompt,
                style,
                image,
                negative_prompt,
                model_name: model,
                aspect_ratio: aspect_ratio.or(detected),
                resolution,
                n,
                image_reference,
                ..SubmitRequest::default()
            };
            run_job(&client, &request, &poller, no_wait).await?;
        }
        Commands::Expand {
            image,
            up,
            down,
            left,
            right,
            prompt,
            no_wait,
        } => {
            let (encoded, _) = read_image(&image)?;
            let request = SubmitRequest {
                kind: JobKind::Expand,
                prompt,
                image: Some(encoded),
                up_expansion_ratio: Some(up),
                down_expansion_ratio: Some(down),
                left_expansion_ratio: Some(left),
                right_expansion_ratio: Some(right),
                ..SubmitRequest::default()
            };
            run_job(&client, &request, &poller, no_wait).await?;
        }
        Commands::Status { task_id, expand } => {
            let envelope = client.task(kind(expand), &task_id).await?;
            print_json(&envelope)?;
        }
        Commands::List {
            expand,
            page,
            page_size,
        } => {
            let value: Value = client
                .list(
                    kind(expand),
                    Page {
                        number: page,
                        size: page_size,
                    },
                )
                .await?;
            print_json(&value)?;
        }
    }

    Ok(())
}

async fn run_job(
    client: &ProxyClient,
    request: &SubmitRequest,
    poller: &PollerConfig,
    no_wait: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if no_wait {
        let envelope: TaskEnvelope = client.submit(request).await?;
        return print_json(&envelope);
    }

    match client.generate(request, poller).await {
        Ok(url) => println!("{}", url),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
