//! Decoded animation types.
//!
//! [`DecodedAnimation`] owns every frame buffer of one input file.
//! [`FrameBufferView`] is a borrowed window onto a single frame, handed to
//! the still-image encoder and discarded right after; the borrow checker
//! guarantees it never outlives the animation that owns the pixels.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::AnimDumpError;

/// Bytes per pixel of an RGBA8 buffer.
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Container kind an animation was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContainerKind {
    /// Graphics Interchange Format.
    Gif,
    /// Animated (or plain) PNG.
    Png,
    /// Animated (or plain) WebP.
    WebP,
    /// Produced by something other than the bundled decoder.
    Other,
}

impl Display for ContainerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ContainerKind::Gif => write!(f, "GIF"),
            ContainerKind::Png => write!(f, "PNG"),
            ContainerKind::WebP => write!(f, "WebP"),
            ContainerKind::Other => write!(f, "other"),
        }
    }
}

/// Pixel layout of a frame buffer. Only 8-bit RGBA is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorLayout {
    /// Four 8-bit channels: red, green, blue, alpha.
    #[default]
    Rgba8,
}

/// One owned, tightly-packed RGBA8 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaFrame {
    /// Raw pixels, `width * height * 4` bytes, row-major.
    pub pixels: Vec<u8>,
    /// Display delay in milliseconds, if the container reported one.
    pub delay_ms: Option<u32>,
}

impl RgbaFrame {
    /// Wrap raw RGBA pixels with no delay information.
    pub fn new(pixels: Vec<u8>) -> Self {
        Self {
            pixels,
            delay_ms: None,
        }
    }

    /// Attach a display delay.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u32) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }
}

/// A fully decoded animation: canvas size plus every frame in order.
///
/// Every frame holds exactly `canvas_width * canvas_height * 4` bytes; the
/// only way to build one is [`DecodedAnimation::new`], which checks that.
#[derive(Debug, Clone)]
pub struct DecodedAnimation {
    canvas_width: u32,
    canvas_height: u32,
    kind: ContainerKind,
    frames: Vec<RgbaFrame>,
}

impl DecodedAnimation {
    /// Assemble an animation, validating the canvas and every buffer size.
    ///
    /// # Errors
    ///
    /// - [`AnimDumpError::InvalidCanvas`] if either dimension is zero.
    /// - [`AnimDumpError::InvalidFrameBuffer`] for the first frame whose
    ///   length is not `width * height * 4`.
    pub fn new(
        canvas_width: u32,
        canvas_height: u32,
        kind: ContainerKind,
        frames: Vec<RgbaFrame>,
    ) -> Result<Self, AnimDumpError> {
        if canvas_width == 0 || canvas_height == 0 {
            return Err(AnimDumpError::InvalidCanvas {
                width: canvas_width,
                height: canvas_height,
            });
        }

        let expected = canvas_width as usize * canvas_height as usize * RGBA_BYTES_PER_PIXEL;
        if let Some((frame_index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, frame)| frame.pixels.len() != expected)
        {
            return Err(AnimDumpError::InvalidFrameBuffer {
                frame_index,
                expected,
                actual: frame.pixels.len(),
            });
        }

        Ok(Self {
            canvas_width,
            canvas_height,
            kind,
            frames,
        })
    }

    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[RgbaFrame] {
        &self.frames
    }

    /// Borrow frame `index` as a view sized to the canvas.
    pub fn frame_view(&self, index: usize) -> Option<FrameBufferView<'_>> {
        self.frames.get(index).map(|frame| {
            FrameBufferView::packed(&frame.pixels, self.canvas_width, self.canvas_height)
        })
    }

    /// Iterate over views of every frame, in frame order.
    pub fn views(&self) -> impl Iterator<Item = FrameBufferView<'_>> + '_ {
        self.frames.iter().map(|frame| {
            FrameBufferView::packed(&frame.pixels, self.canvas_width, self.canvas_height)
        })
    }
}

/// Borrowed, non-owning view over one frame's pixels.
#[derive(Debug, Clone, Copy)]
pub struct FrameBufferView<'a> {
    pixels: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    layout: ColorLayout,
}

impl<'a> FrameBufferView<'a> {
    /// View over a tightly packed buffer: stride is `width * 4`.
    pub(crate) fn packed(pixels: &'a [u8], width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
            stride: width as usize * RGBA_BYTES_PER_PIXEL,
            layout: ColorLayout::Rgba8,
        }
    }

    /// View over a buffer whose rows are `stride` bytes apart.
    ///
    /// Returns `None` if `stride` is shorter than a row or `pixels` is too
    /// short to hold `height` rows.
    pub fn with_stride(pixels: &'a [u8], width: u32, height: u32, stride: usize) -> Option<Self> {
        let row_bytes = width as usize * RGBA_BYTES_PER_PIXEL;
        if stride < row_bytes || pixels.len() < stride * height as usize {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
            stride,
            layout: ColorLayout::Rgba8,
        })
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the start of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total bytes covered by the view: `stride * height`.
    pub fn size(&self) -> usize {
        self.stride * self.height as usize
    }

    pub fn layout(&self) -> ColorLayout {
        self.layout
    }

    /// Always `true`: the pixels belong to the [`DecodedAnimation`].
    pub fn is_external_memory(&self) -> bool {
        true
    }

    /// `true` when rows carry no padding.
    pub fn is_packed(&self) -> bool {
        self.stride == self.width as usize * RGBA_BYTES_PER_PIXEL
    }
}
