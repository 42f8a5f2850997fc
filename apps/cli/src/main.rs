mod audio;
mod commands;
mod env;
mod runtime;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lumen_gemini_tts::GeminiTts;
use tracing_subscriber::prelude::*;

use crate::env::Env;
use crate::runtime::CliRuntime;

#[derive(Parser)]
#[command(name = "lumen", about = "Generate and play long-form narration")]
struct Cli {
    /// Where generated sessions and exports are written.
    #[arg(long, global = true)]
    output_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a script into one long-form WAV file.
    Generate(commands::generate::Args),
    /// Render a short script in memory, one call per line.
    Draft(commands::draft::Args),
    /// Play a finalized WAV file.
    Play(commands::play::Args),
    /// Play or export the tracks of a JSON playlist.
    Playlist(commands::playlist::Args),
}

pub struct Context {
    pub env: Env,
    pub runtime: Arc<CliRuntime>,
}

impl Context {
    fn new(env: Env, output_dir: Option<String>) -> anyhow::Result<Self> {
        let base = match output_dir.or_else(|| env.output_dir.clone()) {
            Some(dir) => lumen_storage::global::expand_path(&dir),
            None => lumen_storage::global::compute_default_base()
                .ok_or(lumen_storage::Error::DataDirUnavailable)?,
        };
        tracing::debug!(base = %base.display(), "output_base");
        Ok(Self {
            env,
            runtime: Arc::new(CliRuntime::new(base)),
        })
    }

    pub fn base(&self) -> PathBuf {
        self.runtime.base().to_path_buf()
    }

    pub fn synthesizer(&self) -> anyhow::Result<Arc<GeminiTts>> {
        let mut builder = GeminiTts::builder();
        if let Some(key) = &self.env.gemini_api_key {
            builder = builder.api_key(key);
        }
        if let Some(base) = &self.env.gemini_api_base {
            builder = builder.api_base(base);
        }
        if let Some(model) = &self.env.gemini_model {
            builder = builder.model(model);
        }
        if let Some(voice) = &self.env.voice {
            builder = builder.voice(voice);
        }
        Ok(Arc::new(builder.build()?))
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rodio=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let env = env::load()?;
    let cli = Cli::parse();
    let ctx = Context::new(env, cli.output_dir)?;

    match cli.command {
        Commands::Generate(args) => commands::generate::run(&ctx, args).await,
        Commands::Draft(args) => commands::draft::run(&ctx, args).await,
        Commands::Play(args) => commands::play::run(&ctx, args).await,
        Commands::Playlist(args) => commands::playlist::run(&ctx, args).await,
    }
}
