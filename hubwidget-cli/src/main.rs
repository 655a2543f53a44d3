//! Hub widget inspector
//!
//! Shows what the widget host bridge would see for one installation:
//! the reachable Hub services, the widget manifest, and the sandbox frame
//! the widget would be embedded in.
//!
//! Usage:
//!   hubwidget --properties widget.toml --token <token> frame

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hubwidget_host::{
    AnonymousHandshake, AuthSession, FrameSpec, HostContext, IdentityHandshake, ManifestLoader,
    StaticTokenHandshake,
};
use hubwidget_types::{HubConfig, InstallationProperties};
use serde_json::json;
use std::path::PathBuf;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "hubwidget")]
#[command(about = "Inspect a Hub the way the widget host bridge sees it")]
struct Args {
    /// Installation properties (TOML or JSON)
    #[arg(short, long)]
    properties: PathBuf,

    /// Bearer token; anonymous access when omitted
    #[arg(short, long, env = "HUB_TOKEN")]
    token: Option<String>,

    /// Location of the embedding page, used as the default redirect URI
    #[arg(long, default_value = "http://localhost/")]
    page_location: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List reachable Hub services
    Services {
        /// Only services of this application
        #[arg(short, long)]
        application: Option<String>,
    },
    /// Print the widget manifest
    Manifest,
    /// Print the sandbox frame the widget would be embedded in
    Frame,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let props = InstallationProperties::load(&args.properties)
        .with_context(|| format!("loading {}", args.properties.display()))?;
    props.validate().context("invalid installation properties")?;

    let context = HostContext::new(args.page_location.as_str());
    let config = HubConfig::derive(&props, context.page_location());
    context
        .registry()
        .validate_or_adopt(&props.widget_name, &config)?;
    debug!(?config, "Derived Hub configuration");

    let handshake: Box<dyn IdentityHandshake> = match args.token {
        Some(token) => Box::new(StaticTokenHandshake::new(token)),
        None => Box::new(AnonymousHandshake),
    };
    let session = AuthSession::init(handshake.as_ref(), config)
        .await
        .context("identity handshake failed")?;
    info!(
        widget = %props.widget_name,
        hub = %session.client().server_uri(),
        anonymous = session.is_anonymous(),
        "Connected"
    );

    let output = match args.command {
        Command::Services { application } => {
            let services = context
                .directory()
                .resolve_services(session.client(), application.as_deref())
                .await
                .context("loading service list")?;
            json!(services)
        }
        Command::Manifest => {
            let manifest = ManifestLoader::new(session.client())
                .load_manifest(&props.widget_name)
                .await
                .context("loading widget manifest")?;
            json!(manifest.manifest())
        }
        Command::Frame => {
            let manifest = ManifestLoader::new(session.client())
                .load_manifest(&props.widget_name)
                .await
                .context("loading widget manifest")?;
            let frame = FrameSpec::for_widget(&props, manifest.capabilities());
            json!({
                "frame": frame,
                "permissions": frame.policy(),
                "logo": manifest.logo().map(|l| l.to_string()),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
