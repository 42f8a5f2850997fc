use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lumen_player::{DirectoryExporter, PlaybackState, Player, format_time};
use lumen_storage::AudioBlob;
use rodio::OutputStreamBuilder;

use crate::Context;
use crate::audio::RodioElement;

const TICK: Duration = Duration::from_millis(200);

#[derive(clap::Args)]
pub struct Args {
    /// A finalized WAV file.
    file: PathBuf,

    /// Start this many seconds in.
    #[arg(long, default_value_t = 0.0)]
    start: f64,
}

pub async fn run(ctx: &Context, args: Args) -> anyhow::Result<()> {
    let blob = AudioBlob::open(&args.file).await?;
    let stream = OutputStreamBuilder::open_default_stream()?;

    let player = blob_player(ctx, blob, &stream);
    if args.start > 0.0 {
        player.seek(args.start).await?;
    }
    player.toggle_play_pause().await?;
    drive(&player).await
}

pub async fn play_blob(ctx: &Context, blob: AudioBlob) -> anyhow::Result<()> {
    let stream = OutputStreamBuilder::open_default_stream()?;
    let player = blob_player(ctx, blob, &stream);
    player.toggle_play_pause().await?;
    drive(&player).await
}

fn blob_player(ctx: &Context, blob: AudioBlob, stream: &rodio::OutputStream) -> Player {
    Player::builder(
        ctx.runtime.clone(),
        Arc::new(DirectoryExporter::new(ctx.base())),
    )
    .blob(blob, Box::new(RodioElement::new(stream.mixer().clone())))
}

/// Ticks the player until playback ends or Ctrl-C stops it.
pub async fn drive(player: &Player) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(TICK);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                player.stop();
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = player.tick().await {
                    tracing::warn!(error = %e, "tick_failed");
                }
                let snapshot = player.snapshot();
                let track = snapshot
                    .active_index
                    .map(|i| format!("track {} ", i + 1))
                    .unwrap_or_default();
                eprint!(
                    "\r{track}{} / {}   ",
                    format_time(snapshot.position_seconds),
                    format_time(snapshot.duration_seconds)
                );
                if snapshot.state == PlaybackState::Idle && !snapshot.loading {
                    break;
                }
            }
        }
    }
    eprintln!();
    Ok(())
}
