//! Animate command - play a sprite strip through an event-driven texture.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use image::RgbaImage;
use texlayer::base::TextureLocation;
use texlayer::component::{AnimationComponent, ImmediateRenderQueue, SingleUploadComponent};
use texlayer::config::EngineConfig;
use texlayer::frame::{CloseableImageFrame, TransformExecutor};
use texlayer::image::{CloseableImage, MemoryImage, MemorySurface, UploadSink};
use texlayer::texture::{EventDrivenTexture, TextureHandle};

use super::common::{create_output_dir, file_stem, read_image, write_png};
use crate::error::CliError;

/// Namespace given to textures loaded from files.
const FILE_NAMESPACE: &str = "texlayer";

/// Layers used by the animated texture: animation, then upload.
const LAYERS: usize = 2;

/// Arguments for the animate command.
#[derive(Debug, Args)]
pub struct AnimateArgs {
    /// Sprite strip with frames stacked vertically
    pub sprite: PathBuf,

    /// Height of one frame in pixels
    #[arg(long)]
    pub frame_height: u32,

    /// Ticks each frame is shown for
    #[arg(long, default_value_t = 1)]
    pub frame_time: u32,

    /// Number of ticks to render
    #[arg(long, default_value_t = 1)]
    pub ticks: u32,

    /// Blend between frames instead of switching
    #[arg(long)]
    pub interpolate: bool,

    /// Highest mipmap level to render
    #[arg(long, default_value_t = 0)]
    pub mipmaps: u8,

    /// Output directory for the rendered PNGs
    #[arg(long)]
    pub out: PathBuf,
}

/// Run the animate command.
pub fn run(args: AnimateArgs, config: &EngineConfig) -> Result<(), CliError> {
    let strip = read_image(&args.sprite)?;
    let (width, height) = strip.dimensions();
    if args.frame_height == 0 || width == 0 {
        return Err(CliError::InvalidInput(
            "frames must be at least one pixel wide and tall".to_string(),
        ));
    }
    if height % args.frame_height != 0 {
        return Err(CliError::InvalidInput(format!(
            "sprite height {} is not a multiple of the frame height {}",
            height, args.frame_height
        )));
    }

    let frame_count = height / args.frame_height;
    let executor = Arc::new(TransformExecutor::from_config(config)?);
    let surface = Arc::new(MemorySurface::new(width, args.frame_height, args.mipmaps));

    let make_frame = |pixels: RgbaImage| -> Result<CloseableImageFrame, CliError> {
        let images = MemoryImage::mipmap_chain(pixels, args.mipmaps)
            .into_iter()
            .map(|level| {
                Box::new(level.with_sink(Arc::clone(&surface) as Arc<dyn UploadSink>))
                    as Box<dyn CloseableImage>
            })
            .collect();
        Ok(CloseableImageFrame::new(width, args.frame_height, images, LAYERS)?
            .with_executor(Arc::clone(&executor)))
    };

    let predefined = (0..frame_count)
        .map(|index| {
            let top = index * args.frame_height;
            make_frame(image::imageops::crop_imm(&strip, 0, top, width, args.frame_height).to_image())
        })
        .collect::<Result<Vec<_>, _>>()?;
    let generated = make_frame(RgbaImage::new(width, args.frame_height))?;

    let handle = TextureHandle::new(texture_location(&args.sprite)?, 1);
    let preparer = |id: u32, mipmap: u8, width: u32, height: u32| {
        tracing::debug!(id, mipmap, width, height, "Prepared output surface");
    };

    let mut texture = EventDrivenTexture::builder(handle)
        .set_predefined_frames(predefined)
        .set_generated_frame(generated)
        .add(AnimationComponent::uniform(
            frame_count as usize,
            args.frame_time,
            args.interpolate,
        )?)
        .add(SingleUploadComponent::with_mipmaps(
            args.mipmaps,
            Arc::new(preparer),
            Arc::new(ImmediateRenderQueue),
        ))
        .build()?;

    create_output_dir(&args.out)?;
    texture.load()?;

    let mut written = 0;
    for tick in 0..args.ticks {
        texture.tick()?;
        texture.bind()?;
        written += write_surface(&surface, &args.out, tick)?;
    }
    texture.close()?;

    tracing::info!(
        frames = frame_count,
        ticks = args.ticks,
        files = written,
        "Animation rendered"
    );
    println!(
        "Rendered {} ticks of {} frames to {} ({} files)",
        args.ticks,
        frame_count,
        args.out.display(),
        written
    );
    Ok(())
}

/// Location for a texture loaded from `path`, named after the file stem.
fn texture_location(path: &Path) -> Result<TextureLocation, CliError> {
    Ok(TextureLocation::new(FILE_NAMESPACE, &file_stem(path))?)
}

/// Write every non-empty surface level for `tick`; returns the file count.
fn write_surface(surface: &MemorySurface, out: &Path, tick: u32) -> Result<usize, CliError> {
    let mut written = 0;
    for level in 0..surface.level_count() {
        let Some(pixels) = surface.snapshot(level as u8) else {
            continue;
        };
        if pixels.width() == 0 || pixels.height() == 0 {
            continue;
        }
        write_png(&pixels, &out.join(format!("tick_{:04}_mip{}.png", tick, level)))?;
        written += 1;
    }
    Ok(written)
}
