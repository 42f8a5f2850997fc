use std::path::PathBuf;
use std::sync::Arc;

use lumen_player::{DirectoryExporter, Player};
use lumen_script::PlaylistItem;
use rodio::OutputStreamBuilder;

use crate::Context;
use crate::audio::RodioOutput;

#[derive(clap::Args)]
pub struct Args {
    /// A JSON array of `{title, text}` items.
    file: PathBuf,

    /// Play (or export) only this track, counting from 1.
    #[arg(long)]
    track: Option<usize>,

    /// Write tracks as WAV files instead of playing them.
    #[arg(long)]
    export: bool,
}

pub async fn run(ctx: &Context, args: Args) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.file).await?;
    let items: Vec<PlaylistItem> = serde_json::from_str(&raw)?;
    let count = items.len();
    let track = args.track.map(|t| t.saturating_sub(1));

    let stream = OutputStreamBuilder::open_default_stream()?;
    let player = Player::builder(
        ctx.runtime.clone(),
        Arc::new(DirectoryExporter::new(ctx.base())),
    )
    .tracks(
        items,
        ctx.synthesizer()?,
        Arc::new(RodioOutput::new(stream.mixer().clone())),
    );

    if args.export {
        let indices: Vec<usize> = match track {
            Some(index) => vec![index],
            None => (0..count).collect(),
        };
        for index in indices {
            let path = player.download(Some(index)).await?;
            println!("{}", path.display());
        }
        return Ok(());
    }

    match track {
        Some(index) => player.track_clicked(index).await?,
        None => player.toggle_play_pause().await?,
    }
    super::play::drive(&player).await
}
