//! Row packing for frame buffer views.

use std::borrow::Cow;

use crate::animation::{FrameBufferView, RGBA_BYTES_PER_PIXEL};

/// Return the view's pixels as a tightly-packed RGBA buffer.
///
/// Views whose stride equals `width * 4` are borrowed as-is. Padded views
/// are copied row by row with the padding stripped, so the result can be
/// handed straight to an encoder.
pub(crate) fn packed_pixels<'a>(view: &FrameBufferView<'a>) -> Cow<'a, [u8]> {
    let row_bytes = view.width() as usize * RGBA_BYTES_PER_PIXEL;
    let height = view.height() as usize;
    let data = view.pixels();

    if view.is_packed() {
        Cow::Borrowed(&data[..row_bytes * height])
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * height);
        for row in 0..height {
            let row_start = row * view.stride();
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        Cow::Owned(buffer)
    }
}
