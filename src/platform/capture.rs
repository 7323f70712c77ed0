//! Screen capture.

use crate::image::OwnedImage;
use crate::util::{LocateError, LocateResult, Point, Rect};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Captured pixels and where their top-left pixel sits on the screen.
///
/// A requested region that extends past the screen edge is clipped, so
/// `origin` may differ from the requested origin.
#[derive(Clone, Debug)]
pub struct Frame {
    /// RGB pixels.
    pub image: OwnedImage,
    /// Screen coordinate of `image`'s top-left pixel.
    pub origin: Point,
}

/// Source of screen pixels.
///
/// Implementations must make each call self-contained: no state may be carried
/// between a capture and the next one.
pub trait ScreenCapture: Send + Sync {
    /// Captures `region`, or the whole screen when `None`.
    fn capture(&self, region: Option<Rect>) -> LocateResult<Frame>;

    /// Addressable screen area.
    fn screen_bounds(&self) -> LocateResult<Rect>;
}

/// Clips `region` to `bounds`, failing with a capture error when nothing is left.
pub(crate) fn clip_region(region: Option<Rect>, bounds: Rect) -> LocateResult<Rect> {
    match region {
        None => Ok(bounds),
        Some(region) => region.intersection(&bounds).ok_or_else(|| {
            LocateError::Capture(format!("region {region:?} lies outside the screen {bounds:?}"))
        }),
    }
}

/// A screen backed by an in-memory image placed at the origin.
///
/// The image can be swapped at any time to simulate the desktop changing
/// between polls.
pub struct StaticScreen {
    image: RwLock<Arc<OwnedImage>>,
    captures: AtomicUsize,
}

impl StaticScreen {
    pub fn new(image: OwnedImage) -> Self {
        Self {
            image: RwLock::new(Arc::new(image)),
            captures: AtomicUsize::new(0),
        }
    }

    /// Replaces the displayed image.
    pub fn set_image(&self, image: OwnedImage) {
        *self.image.write() = Arc::new(image);
    }

    /// Number of capture calls served so far.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::Relaxed)
    }
}

impl ScreenCapture for StaticScreen {
    fn capture(&self, region: Option<Rect>) -> LocateResult<Frame> {
        self.captures.fetch_add(1, Ordering::Relaxed);
        let image = Arc::clone(&self.image.read());
        let bounds = Rect::new(0, 0, image.width() as u32, image.height() as u32);
        let clipped = clip_region(region, bounds)?;
        let cropped = image.crop(
            clipped.left() as usize,
            clipped.top() as usize,
            clipped.size.width as usize,
            clipped.size.height as usize,
        )?;
        Ok(Frame {
            image: cropped,
            origin: clipped.origin,
        })
    }

    fn screen_bounds(&self) -> LocateResult<Rect> {
        let image = self.image.read();
        Ok(Rect::new(0, 0, image.width() as u32, image.height() as u32))
    }
}

/// Captures the primary monitor via the `screenshots` crate.
#[cfg(feature = "desktop")]
pub struct DesktopScreen;

#[cfg(feature = "desktop")]
impl DesktopScreen {
    fn primary() -> LocateResult<screenshots::Screen> {
        let screens =
            screenshots::Screen::all().map_err(|e| LocateError::Capture(e.to_string()))?;
        let index = screens
            .iter()
            .position(|s| s.display_info.is_primary)
            .unwrap_or(0);
        screens
            .into_iter()
            .nth(index)
            .ok_or_else(|| LocateError::Capture("no monitor found".into()))
    }
}

#[cfg(feature = "desktop")]
impl ScreenCapture for DesktopScreen {
    fn capture(&self, region: Option<Rect>) -> LocateResult<Frame> {
        let screen = Self::primary()?;
        let bounds = self.screen_bounds()?;
        let clipped = clip_region(region, bounds)?;
        let rgba = screen
            .capture_area(
                clipped.left() - bounds.left(),
                clipped.top() - bounds.top(),
                clipped.size.width,
                clipped.size.height,
            )
            .map_err(|e| LocateError::Capture(e.to_string()))?;
        let width = rgba.width() as usize;
        let height = rgba.height() as usize;
        let rgb: Vec<u8> = rgba
            .into_raw()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        Ok(Frame {
            image: OwnedImage::with_channels(rgb, width, height, 3)?,
            origin: clipped.origin,
        })
    }

    fn screen_bounds(&self) -> LocateResult<Rect> {
        let info = Self::primary()?.display_info;
        Ok(Rect::new(info.x, info.y, info.width, info.height))
    }
}

#[cfg(test)]
mod tests {
    use super::{ScreenCapture, StaticScreen};
    use crate::image::OwnedImage;
    use crate::util::{LocateError, Point, Rect};

    fn gradient(width: usize, height: usize) -> OwnedImage {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 0]);
            }
        }
        OwnedImage::with_channels(data, width, height, 3).unwrap()
    }

    #[test]
    fn region_capture_crops_and_reports_origin() {
        let screen = StaticScreen::new(gradient(40, 30));
        let frame = screen.capture(Some(Rect::new(5, 7, 10, 4))).unwrap();
        assert_eq!(frame.origin, Point::new(5, 7));
        assert_eq!((frame.image.width(), frame.image.height()), (10, 4));
        assert_eq!(frame.image.view().pixel(0, 0).unwrap(), &[5, 7, 0]);
    }

    #[test]
    fn partially_offscreen_region_is_clipped() {
        let screen = StaticScreen::new(gradient(40, 30));
        let frame = screen.capture(Some(Rect::new(-5, 25, 20, 20))).unwrap();
        assert_eq!(frame.origin, Point::new(0, 25));
        assert_eq!((frame.image.width(), frame.image.height()), (15, 5));
    }

    #[test]
    fn offscreen_region_is_a_capture_error() {
        let screen = StaticScreen::new(gradient(40, 30));
        let err = screen.capture(Some(Rect::new(100, 100, 5, 5))).unwrap_err();
        assert!(matches!(err, LocateError::Capture(_)));
        assert!(err.is_recoverable());
        assert_eq!(screen.capture_count(), 1);
    }
}
