use std::path::PathBuf;
use std::time::SystemTime;

use crate::Context;

#[derive(clap::Args)]
pub struct Args {
    /// A short script; every non-blank line is one synthesis call.
    script: PathBuf,

    /// Output file. Defaults to `draft_<millis>.wav` in the output directory.
    #[arg(long, short)]
    out: Option<PathBuf>,
}

pub async fn run(ctx: &Context, args: Args) -> anyhow::Result<()> {
    let script = super::generate::read_script(&args.script).await?;
    let synthesizer = ctx.synthesizer()?;

    let wav = lumen_longform::render_draft(&script, synthesizer.as_ref(), |percent| {
        eprint!("\rrendering {percent:>3}%")
    })
    .await?;
    eprintln!();

    let Some(wav) = wav else {
        eprintln!("The speech service returned no audio.");
        return Ok(());
    };

    let target = args.out.unwrap_or_else(|| {
        ctx.base().join(format!(
            "draft_{}.wav",
            lumen_storage::unix_millis(SystemTime::now())
        ))
    });
    lumen_storage::fs::atomic_write_bytes_async(&target, &wav).await?;
    println!("{}", target.display());
    Ok(())
}
