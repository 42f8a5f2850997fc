use std::path::PathBuf;
use std::sync::Arc;

use lumen_longform::LongFormAudio;
use lumen_script::{PlaylistItem, compose_playlist_script};

use crate::Context;

#[derive(clap::Args)]
pub struct Args {
    /// A plain-text script, or a JSON array of `{title, text}` items.
    script: PathBuf,

    /// File name prefix for the generated session.
    #[arg(long, env = "LUMEN_SESSION_PREFIX", default_value = "session")]
    prefix: String,

    /// Play the result once it is ready.
    #[arg(long)]
    play: bool,
}

pub async fn read_script(path: &std::path::Path) -> anyhow::Result<String> {
    let raw = tokio::fs::read_to_string(path).await?;
    if path.extension().is_some_and(|ext| ext == "json") {
        let items: Vec<PlaylistItem> = serde_json::from_str(&raw)?;
        return Ok(compose_playlist_script(&items));
    }
    Ok(raw)
}

pub async fn run(ctx: &Context, args: Args) -> anyhow::Result<()> {
    let script = read_script(&args.script).await?;
    let audio = Arc::new(LongFormAudio::builder(ctx.runtime.clone(), ctx.synthesizer()?).build());

    let mut state = audio.subscribe();
    let progress = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = state.borrow_and_update().clone();
            if current.is_generating {
                eprint!("\rgenerating {:>3}%", current.progress);
            }
        }
    });

    let canceller = {
        let audio = audio.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("cancel_requested");
                audio.cancel();
            }
        })
    };

    let result = audio.generate(&script, &args.prefix).await;
    canceller.abort();
    progress.abort();
    eprintln!();

    let blob = match result {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            eprintln!("Generation cancelled.");
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    println!("{}", blob.path().display());
    eprintln!(
        "{} of audio, {} bytes",
        lumen_player::format_time(blob.duration()),
        blob.len()
    );

    if args.play {
        super::play::play_blob(ctx, blob).await?;
    }
    Ok(())
}
