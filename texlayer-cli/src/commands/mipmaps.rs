//! Mipmaps command - write the gamma-correct mipmap chain of an image.

use std::path::PathBuf;

use clap::Args;
use texlayer::image::MemoryImage;

use super::common::{create_output_dir, file_stem, read_image, write_png};
use crate::error::CliError;

/// Arguments for the mipmaps command.
#[derive(Debug, Args)]
pub struct MipmapsArgs {
    /// Source image
    pub image: PathBuf,

    /// Highest mipmap level to generate
    #[arg(long, default_value_t = 4)]
    pub levels: u8,

    /// Output directory for the level PNGs
    #[arg(long)]
    pub out: PathBuf,
}

/// Run the mipmaps command.
pub fn run(args: MipmapsArgs) -> Result<(), CliError> {
    let pixels = read_image(&args.image)?;
    let stem = file_stem(&args.image);
    create_output_dir(&args.out)?;

    let mut written = 0;
    for level in MemoryImage::mipmap_chain(pixels, args.levels) {
        let pixels = level.to_rgba()?;
        if pixels.width() == 0 || pixels.height() == 0 {
            tracing::debug!(level = level.level(), "Skipping empty mipmap level");
            continue;
        }

        let path = args.out.join(format!("{}_mip{}.png", stem, level.level()));
        write_png(&pixels, &path)?;
        println!(
            "  level {}: {}x{} -> {}",
            level.level(),
            pixels.width(),
            pixels.height(),
            path.display()
        );
        written += 1;
    }

    tracing::info!(image = %args.image.display(), levels = written, "Mipmaps written");
    Ok(())
}
