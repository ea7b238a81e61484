//! Animated container decoding.
//!
//! [`ContainerDecoder`] is the seam between the export pipeline and whatever
//! turns a file into a [`DecodedAnimation`]. [`ImageContainerDecoder`] is
//! the bundled implementation, built on the `image` crate's
//! [`AnimationDecoder`] support for GIF, APNG and animated WebP. Plain PNG
//! and WebP files decode as single-frame animations.
//!
//! # Example
//!
//! ```no_run
//! use animdump::{ContainerDecoder, ImageContainerDecoder};
//!
//! let animation = ImageContainerDecoder::new().decode("input.webp".as_ref())?;
//! println!(
//!     "{}×{} canvas, {} frames",
//!     animation.canvas_width(),
//!     animation.canvas_height(),
//!     animation.frame_count(),
//! );
//! # Ok::<(), animdump::AnimDumpError>(())
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{
    AnimationDecoder, DynamicImage, ImageDecoder, ImageFormat, ImageReader, ImageResult,
    codecs::{gif::GifDecoder, png::PngDecoder, webp::WebPDecoder},
};

use crate::{
    animation::{ContainerKind, DecodedAnimation, RgbaFrame},
    error::AnimDumpError,
};

/// Turns a file into a fully decoded animation.
///
/// Implementations fail as a unit: either every frame is decoded, or an
/// error is returned and nothing is exported for that input.
pub trait ContainerDecoder {
    /// Decode every frame of the container at `path`.
    fn decode(&self, path: &Path) -> Result<DecodedAnimation, AnimDumpError>;
}

impl<D: ContainerDecoder + ?Sized> ContainerDecoder for &D {
    fn decode(&self, path: &Path) -> Result<DecodedAnimation, AnimDumpError> {
        (**self).decode(path)
    }
}

/// Decoder for GIF, PNG/APNG and WebP backed by the `image` crate.
///
/// The format is sniffed from the file contents, not the extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageContainerDecoder;

impl ImageContainerDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerDecoder for ImageContainerDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedAnimation, AnimDumpError> {
        log::debug!("Decoding container: {}", path.display());

        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|error| AnimDumpError::decode(path, error))?;

        let format = reader.format();
        let input = reader.into_inner();

        let (kind, width, height, frames) = match format {
            Some(ImageFormat::Gif) => {
                let decoder = GifDecoder::new(input).map_err(|e| AnimDumpError::decode(path, e))?;
                let (width, height) = decoder.dimensions();
                let frames = collect_frames(decoder).map_err(|e| AnimDumpError::decode(path, e))?;
                (ContainerKind::Gif, width, height, frames)
            }
            Some(ImageFormat::Png) => {
                let decoder = PngDecoder::new(input).map_err(|e| AnimDumpError::decode(path, e))?;
                let (width, height) = decoder.dimensions();
                let frames = decode_png(decoder).map_err(|e| AnimDumpError::decode(path, e))?;
                (ContainerKind::Png, width, height, frames)
            }
            Some(ImageFormat::WebP) => {
                let decoder =
                    WebPDecoder::new(input).map_err(|e| AnimDumpError::decode(path, e))?;
                let (width, height) = decoder.dimensions();
                let frames = if decoder.has_animation() {
                    collect_frames(decoder)
                } else {
                    single_frame(decoder)
                }
                .map_err(|e| AnimDumpError::decode(path, e))?;
                (ContainerKind::WebP, width, height, frames)
            }
            Some(other) => {
                return Err(AnimDumpError::decode(
                    path,
                    format!("unsupported container format {other:?}"),
                ));
            }
            None => {
                return Err(AnimDumpError::decode(path, "unrecognised container format"));
            }
        };

        log::debug!(
            "Decoded {kind} container {}: {width}×{height}, {} frames",
            path.display(),
            frames.len(),
        );

        DecodedAnimation::new(width, height, kind, frames)
            .map_err(|error| AnimDumpError::decode(path, error))
    }
}

fn decode_png(decoder: PngDecoder<BufReader<File>>) -> ImageResult<Vec<RgbaFrame>> {
    if decoder.is_apng()? {
        collect_frames(decoder.apng()?)
    } else {
        single_frame(decoder)
    }
}

/// Drain an animation decoder into owned RGBA frames.
///
/// The `image` crate composites each frame onto the full canvas, so every
/// buffer comes out canvas-sized.
fn collect_frames<'a, A: AnimationDecoder<'a>>(decoder: A) -> ImageResult<Vec<RgbaFrame>> {
    decoder
        .into_frames()
        .map(|frame| {
            let frame = frame?;
            let (numerator, denominator) = frame.delay().numer_denom_ms();
            let delay_ms = numerator / denominator.max(1);
            Ok(RgbaFrame::new(frame.into_buffer().into_raw()).with_delay_ms(delay_ms))
        })
        .collect()
}

fn single_frame<D: ImageDecoder>(decoder: D) -> ImageResult<Vec<RgbaFrame>> {
    let image = DynamicImage::from_decoder(decoder)?;
    Ok(vec![RgbaFrame::new(image.into_rgba8().into_raw())])
}
