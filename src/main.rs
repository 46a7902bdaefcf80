//! Kling image proxy.
//!
//! ```text
//!     Client                    kling-proxy                          Vendor API
//!     ──────                    ───────────                          ──────────
//!  POST /api/kling-generate ─▶ validate + reshape body ─▶ sign JWT ─▶ POST /v1/images/...
//!  GET  ?task_id=...        ─▶ sign JWT             ─────────────▶ GET  /v1/images/.../{id}
//!        ◀──────────────────── status + body relayed verbatim ◀───────
//! ```
//!
//! Credentials come from `KLING_ACCESS_KEY_ID` and `KLING_ACCESS_KEY_SECRET`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "kling-proxy", version, about = "Signing proxy for the Kling image API")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "KLING_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    kling_proxy::lifecycle::startup::run(args.config.as_deref()).await?;
    Ok(())
}
