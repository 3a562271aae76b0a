use anyhow::Result;
use clap::Parser;
use slow_m2m::client::{Client, SERVICE_URL};
use slow_m2m::model::Credentials;
use slow_m2m::scene_selection::{selection_template_toml, SceneSelection};
use slow_m2m::workflow;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Search the USGS M2M catalog and print download URLs for the matching scenes.
///
/// Passing credentials on the command line is not secure; prefer M2M_PASSWORD.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(short, long, required_unless_present = "write_template")]
    username: Option<String>,

    #[arg(
        short,
        long,
        env = "M2M_PASSWORD",
        hide_env_values = true,
        required_unless_present = "write_template"
    )]
    password: Option<String>,

    /// TOML scene selection; the built-in template is used when omitted
    #[arg(short, long)]
    selection: Option<PathBuf>,

    #[arg(long, default_value = SERVICE_URL)]
    base_url: String,

    /// Seconds between download-retrieve calls
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Retrieve attempts before giving up on preparing downloads
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Write the template selection to this path and exit
    #[arg(long)]
    write_template: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let template = SceneSelection::from_template(&selection_template_toml())?;
    if let Some(path) = args.write_template {
        template.write(&path)?;
        println!("Wrote template selection to {}", path.display());
        return Ok(());
    }

    let selection = match args.selection {
        Some(path) => SceneSelection::read(path)?,
        None => template,
    };

    let mut policy = selection.polling.unwrap_or_default();
    if let Some(secs) = args.poll_interval {
        policy.interval = Duration::from_secs(secs);
    }
    if let Some(max_attempts) = args.max_attempts {
        policy.max_attempts = max_attempts;
    }

    // clap enforces both unless --write-template was given
    let credentials = Credentials::new(
        args.username.unwrap_or_default(),
        args.password.unwrap_or_default(),
    );

    let client = Client::new(&args.base_url)?;
    let _ = workflow::run(&client, &credentials, &selection, policy).await?;

    Ok(())
}
