use anyhow::{bail, Context, Result};
use clap::Parser;
use oxidize_fonts::MakeFontOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "makefont",
    about = "Generate font definition files for oxidize-fonts",
    version,
    author
)]
struct Cli {
    /// TrueType (.ttf, .otf) or Type1 (.pfb) font files
    #[arg(required = true)]
    fonts: Vec<PathBuf>,

    /// Store the font program next to the definition
    #[arg(long)]
    embed: bool,

    /// Code page map (defaults to the bundled cp1252)
    #[arg(long, value_name = "MAP")]
    enc: Option<PathBuf>,

    /// Output directory (defaults to each font's directory)
    #[arg(long, value_name = "DIR")]
    dst: Option<PathBuf>,

    /// Log extraction details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "makefont=debug,oxidize_fonts=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(dst) = &cli.dst {
        if !dst.is_dir() {
            bail!("Destination directory not found: {}", dst.display());
        }
    }

    let options = MakeFontOptions {
        embed: cli.embed,
        encoding: cli.enc,
        destination: cli.dst,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0;

    for font in &cli.fonts {
        writeln!(out, "Processing {}...", font.display())?;
        match options
            .run(font, &mut out)
            .with_context(|| format!("Failed to process {}", font.display()))
        {
            Ok(json_path) => writeln!(
                out,
                "Font definition file successfully generated: {}",
                json_path.display()
            )?,
            Err(err) => {
                eprintln!("Error: {err:#}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} fonts failed", cli.fonts.len());
    }
    Ok(())
}
