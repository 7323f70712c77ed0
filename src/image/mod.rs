//! Image views and owned pixel buffers.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer of interleaved samples
//! with an explicit stride. `width` counts pixels, `channels` counts samples
//! per pixel (1 for grayscale, 3 for RGB), and the stride counts elements
//! between the starts of consecutive rows, so a stride larger than
//! `width * channels` represents padded rows. ROI slices are zero-copy views
//! into the same backing slice and retain the original stride.

use crate::util::{LocateError, LocateResult};

pub mod io;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous single-channel view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> LocateResult<Self> {
        Self::new(data, width, height, 1, width)
    }

    /// Creates a contiguous interleaved view with `stride == width * channels`.
    pub fn from_interleaved(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
    ) -> LocateResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(LocateError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, channels, stride)
    }

    /// Creates a view with an explicit stride in elements.
    pub fn new(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
    ) -> LocateResult<Self> {
        let needed = required_len(width, height, channels, stride)?;
        if data.len() < needed {
            return Err(LocateError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the samples of pixel `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [T]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y
            .checked_mul(self.stride)?
            .checked_add(x.checked_mul(self.channels)?)?;
        self.data.get(start..start.checked_add(self.channels)?)
    }

    /// Returns a contiguous slice for row `y` with length `width * channels`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.channels)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> LocateResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(LocateError::InvalidDimensions { width, height });
        }

        let out_of_bounds = LocateError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x * self.channels))
            .ok_or(LocateError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self.data.get(start..).ok_or(LocateError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;

        ImageView::new(data, width, height, self.channels, self.stride)
    }
}

fn required_len(
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
) -> LocateResult<usize> {
    if width == 0 || height == 0 || channels == 0 {
        return Err(LocateError::InvalidDimensions { width, height });
    }
    let row_len = width
        .checked_mul(channels)
        .ok_or(LocateError::InvalidDimensions { width, height })?;
    if stride < row_len {
        return Err(LocateError::InvalidStride {
            width: row_len,
            stride,
        });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or(LocateError::InvalidDimensions { width, height })
}

/// Owned, contiguous 8-bit image with interleaved channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl OwnedImage {
    /// Creates a single-channel image from a contiguous buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> LocateResult<Self> {
        Self::with_channels(data, width, height, 1)
    }

    /// Creates an interleaved image from a contiguous buffer.
    pub fn with_channels(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> LocateResult<Self> {
        ImageView::from_interleaved(&data, width, height, channels)?;
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Copies a (possibly strided) view into a contiguous image.
    pub fn from_view(view: ImageView<'_, u8>) -> LocateResult<Self> {
        let mut data = Vec::with_capacity(view.width() * view.height() * view.channels());
        for y in 0..view.height() {
            data.extend_from_slice(view.row(y).expect("row within view bounds"));
        }
        Self::with_channels(data, view.width(), view.height(), view.channels())
    }

    /// Creates an image filled with one value per channel.
    pub fn filled(width: usize, height: usize, value: &[u8]) -> LocateResult<Self> {
        let channels = value.len();
        let count = width
            .checked_mul(height)
            .ok_or(LocateError::InvalidDimensions { width, height })?;
        let data = value.repeat(count);
        Self::with_channels(data, width, height, channels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the raw interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the whole image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.width * self.channels,
        }
    }

    /// Copies a sub-image into the pixel grid at `(x, y)`, clipping at the edges.
    ///
    /// Both images must have the same channel count.
    pub fn blit(&mut self, src: ImageView<'_, u8>, x: usize, y: usize) -> LocateResult<()> {
        if src.channels() != self.channels {
            return Err(LocateError::InvalidMatchInput {
                reason: "channel count mismatch",
            });
        }
        let c = self.channels;
        for sy in 0..src.height() {
            let dy = y + sy;
            if dy >= self.height {
                break;
            }
            let row = src.row(sy).expect("row within source bounds");
            let copy_w = src.width().min(self.width.saturating_sub(x));
            if copy_w == 0 {
                break;
            }
            let dst_start = (dy * self.width + x) * c;
            self.data[dst_start..dst_start + copy_w * c].copy_from_slice(&row[..copy_w * c]);
        }
        Ok(())
    }

    /// Crops a region into a new contiguous image.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> LocateResult<Self> {
        Self::from_view(self.view().roi(x, y, width, height)?)
    }
}
