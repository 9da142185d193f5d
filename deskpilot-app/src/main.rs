use anyhow::Result;
use clap::Parser;
use deskpilot_app::{render, AppConfig, ProcessAugmenter, Repl, Router, Timeouts};
use deskpilot_backends::{CapabilityRegistry, EngineSettings};
use deskpilot_classifier::InputClassifier;
use deskpilot_core::Metrics;
use deskpilot_executor::{CallContext, CommandChannel, SystemCommandChannel};
use deskpilot_intent::IntentTranslator;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "deskpilot", version, about = "Drive the desktop with plain-text commands")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = "DESKPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Print each reply as one JSON object
    #[arg(long)]
    json: bool,

    /// Command to run once; without one, lines are read from stdin
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref())?;
    init_tracing(&config.log_level);

    let metrics = Metrics::new();
    let mut channel = SystemCommandChannel::new();
    if let Some(augment) = &config.augment {
        channel.allow(augment.program.clone());
    }
    let channel: Arc<dyn CommandChannel> = Arc::new(channel);

    let settings = EngineSettings {
        bus_timeout: config.bus_timeout(),
        disabled: config.disabled_capabilities.clone(),
        ..EngineSettings::default()
    };
    let registry = CapabilityRegistry::new(channel.clone(), metrics.clone(), settings);
    let timeouts = Timeouts::from(&config);
    let startup = CallContext::new(timeouts.request).with_step_timeout(timeouts.tool);
    let backend = registry.detect(&startup).await;
    if backend.is_none() {
        warn!("Desktop commands will fail until GNOME or KDE is running");
    }

    let mut translator = IntentTranslator::new().with_metrics(metrics.clone());
    if let Some(augment) = &config.augment {
        let augmenter = ProcessAugmenter::new(channel.clone(), augment);
        translator = translator
            .with_augmenter(Arc::new(augmenter))
            .with_complex_threshold(augment.complex_threshold);
        info!("Augmentation through {}", augment.program);
    }

    let router = Router::new(InputClassifier::new(), translator, backend, metrics, timeouts);

    if !cli.command.is_empty() {
        let line = cli.command.join(" ");
        let reply = router.handle(&line, &router.new_context()).await;
        println!("{}", render(&reply, cli.json)?);
        if !reply.result.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let stdin = BufReader::new(tokio::io::stdin());
    Repl::new(&router, cli.json).run(stdin, &mut std::io::stdout()).await
}
