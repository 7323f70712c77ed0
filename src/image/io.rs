//! Conversions between `OwnedImage` and the `image` crate.

use crate::image::{ImageView, OwnedImage};
use crate::util::{LocateError, LocateResult};
use std::path::Path;

/// Creates an owned single-channel image from a grayscale buffer.
pub fn owned_from_gray_image(img: &image::GrayImage) -> LocateResult<OwnedImage> {
    OwnedImage::new(img.as_raw().clone(), img.width() as usize, img.height() as usize)
}

/// Creates an owned 3-channel image from an RGB buffer.
pub fn owned_from_rgb_image(img: &image::RgbImage) -> LocateResult<OwnedImage> {
    OwnedImage::with_channels(
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
        3,
    )
}

/// Creates an owned RGB image from a dynamic image, dropping any alpha channel.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> LocateResult<OwnedImage> {
    owned_from_rgb_image(&img.to_rgb8())
}

/// Loads and decodes an image file into an owned RGB image.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> LocateResult<OwnedImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|err| LocateError::ImageIo {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}

/// Reads only the header of an image file and returns its dimensions.
pub fn probe_dimensions<P: AsRef<Path>>(path: P) -> LocateResult<(u32, u32)> {
    let path = path.as_ref();
    image::image_dimensions(path).map_err(|err| LocateError::ImageIo {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Converts an RGB image to single-channel luma (Rec. 601 weights).
///
/// Single-channel input is returned as a copy.
pub fn to_gray(img: &OwnedImage) -> LocateResult<OwnedImage> {
    match img.channels() {
        1 => Ok(img.clone()),
        3 => {
            let rgb = image::RgbImage::from_raw(
                img.width() as u32,
                img.height() as u32,
                img.data().to_vec(),
            )
            .ok_or(LocateError::BufferTooSmall {
                needed: img.width() * img.height() * 3,
                got: img.data().len(),
            })?;
            owned_from_gray_image(&image::imageops::grayscale(&rgb))
        }
        _ => Err(LocateError::InvalidMatchInput {
            reason: "unsupported channel count",
        }),
    }
}

/// Converts a (possibly strided) RGB view to an owned luma image.
pub fn view_to_gray(view: ImageView<'_, u8>) -> LocateResult<OwnedImage> {
    to_gray(&OwnedImage::from_view(view)?)
}

/// Writes an owned image to disk; the format is chosen from the extension.
pub fn save_image<P: AsRef<Path>>(img: &OwnedImage, path: P) -> LocateResult<()> {
    let path = path.as_ref();
    let color = match img.channels() {
        1 => image::ExtendedColorType::L8,
        3 => image::ExtendedColorType::Rgb8,
        _ => {
            return Err(LocateError::InvalidMatchInput {
                reason: "unsupported channel count",
            })
        }
    };
    image::save_buffer(
        path,
        img.data(),
        img.width() as u32,
        img.height() as u32,
        color,
    )
    .map_err(|err| LocateError::ImageIo {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
