//! Still-image encoding.
//!
//! [`StillImageEncoder`] writes one frame to one file. The bundled
//! [`ImageStillEncoder`] uses the `image` crate's PNG, TIFF and PNM encoders;
//! PAM output is PNM with the `P7` arbitrary-map subtype, which keeps the
//! alpha channel.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use image::{
    ExtendedColorType, ImageEncoder,
    codecs::{
        png::PngEncoder,
        pnm::{PnmEncoder, PnmSubtype},
        tiff::TiffEncoder,
    },
};

use crate::{
    animation::FrameBufferView, config::OutputFormat, conversion::packed_pixels,
    error::AnimDumpError,
};

/// Writes one RGBA frame as a still image.
///
/// Implementations fail as a unit: a failed call leaves no file at the
/// target path. Callers do not retry.
pub trait StillImageEncoder {
    /// Encode `view` as `format` and write it to `path`, replacing any
    /// existing file.
    fn save(
        &self,
        view: &FrameBufferView<'_>,
        format: OutputFormat,
        path: &Path,
    ) -> Result<(), AnimDumpError>;
}

impl<E: StillImageEncoder + ?Sized> StillImageEncoder for &E {
    fn save(
        &self,
        view: &FrameBufferView<'_>,
        format: OutputFormat,
        path: &Path,
    ) -> Result<(), AnimDumpError> {
        (**self).save(view, format, path)
    }
}

/// Encoder for PNG, TIFF and PAM backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageStillEncoder;

impl ImageStillEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl StillImageEncoder for ImageStillEncoder {
    fn save(
        &self,
        view: &FrameBufferView<'_>,
        format: OutputFormat,
        path: &Path,
    ) -> Result<(), AnimDumpError> {
        let pixels = packed_pixels(view);
        let (width, height) = (view.width(), view.height());

        let file = File::create(path)?;
        if let Err(error) = write_still(file, &pixels, width, height, format) {
            discard_partial(path);
            return Err(error);
        }

        log::debug!("Wrote {width}×{height} {format} to {}", path.display());
        Ok(())
    }
}

fn write_still(
    file: File,
    pixels: &[u8],
    width: u32,
    height: u32,
    format: OutputFormat,
) -> Result<(), AnimDumpError> {
    let mut writer = BufWriter::new(file);
    match format {
        OutputFormat::Png => PngEncoder::new(&mut writer).write_image(
            pixels,
            width,
            height,
            ExtendedColorType::Rgba8,
        )?,
        OutputFormat::Tiff => TiffEncoder::new(&mut writer).write_image(
            pixels,
            width,
            height,
            ExtendedColorType::Rgba8,
        )?,
        OutputFormat::Pam => PnmEncoder::new(&mut writer)
            .with_subtype(PnmSubtype::ArbitraryMap)
            .write_image(pixels, width, height, ExtendedColorType::Rgba8)?,
    }
    writer.flush()?;
    Ok(())
}

/// Remove a file left half-written by a failed encode.
fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed partial output {}", path.display()),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => log::warn!("Could not remove partial output {}: {error}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let on = (x + y) % 2 == 0;
                pixels.extend_from_slice(if on { &[255, 255, 255, 255] } else { &[0, 0, 0, 128] });
            }
        }
        pixels
    }

    #[test]
    fn png_round_trips_dimensions_and_alpha() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("frame.png");
        let pixels = checkerboard(4, 3);
        let view = FrameBufferView::packed(&pixels, 4, 3);

        ImageStillEncoder::new()
            .save(&view, OutputFormat::Png, &path)
            .unwrap();

        let loaded = image::open(&path).unwrap().into_rgba8();
        assert_eq!(loaded.dimensions(), (4, 3));
        assert_eq!(loaded.into_raw(), pixels);
    }

    #[test]
    fn tiff_has_canvas_dimensions() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("frame.tiff");
        let pixels = checkerboard(6, 2);
        let view = FrameBufferView::packed(&pixels, 6, 2);

        ImageStillEncoder::new()
            .save(&view, OutputFormat::Tiff, &path)
            .unwrap();

        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (6, 2));
    }

    #[test]
    fn pam_header_declares_rgb_alpha() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("frame.pam");
        let pixels = checkerboard(2, 2);
        let view = FrameBufferView::packed(&pixels, 2, 2);

        ImageStillEncoder::new()
            .save(&view, OutputFormat::Pam, &path)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let header = String::from_utf8_lossy(&bytes[..bytes.len() - pixels.len()]);
        assert!(header.starts_with("P7"), "{header}");
        assert!(header.contains("WIDTH 2"), "{header}");
        assert!(header.contains("TUPLTYPE RGB_ALPHA"), "{header}");
        assert_eq!(&bytes[bytes.len() - pixels.len()..], pixels.as_slice());
    }

    #[test]
    fn padded_rows_are_packed_before_encoding() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("padded.png");
        // 1×2 image with two bytes of padding per row.
        let pixels = [10, 20, 30, 255, 0, 0, 40, 50, 60, 255, 0, 0];
        let view = FrameBufferView::with_stride(&pixels, 1, 2, 6).unwrap();

        ImageStillEncoder::new()
            .save(&view, OutputFormat::Png, &path)
            .unwrap();

        let loaded = image::open(&path).unwrap().into_rgba8();
        assert_eq!(loaded.into_raw(), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn missing_folder_fails() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("absent").join("frame.png");
        let pixels = checkerboard(1, 1);
        let view = FrameBufferView::packed(&pixels, 1, 1);

        let result = ImageStillEncoder::new().save(&view, OutputFormat::Png, &path);
        assert!(matches!(result, Err(AnimDumpError::IoError(_))));
    }

    #[test]
    fn failed_encode_removes_the_created_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("empty.png");
        // PNG has no zero-width images, so the encoder fails after the file
        // has been created.
        let view = FrameBufferView::packed(&[], 0, 3);

        let result = ImageStillEncoder::new().save(&view, OutputFormat::Png, &path);
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn failed_encode_replaces_an_older_frame() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("dump_0000.png");
        std::fs::write(&path, b"left over from an earlier run").unwrap();
        let view = FrameBufferView::packed(&[], 0, 1);

        assert!(ImageStillEncoder::new().save(&view, OutputFormat::Png, &path).is_err());
        assert!(!path.exists());
    }
}
