use std::path::Path;

use kornia_image::{Image, ImageSize};

use crate::error::IoError;

/// Reads an RGB8 image from the given file path.
///
/// The method tries to read from any image format supported by the image crate and
/// converts the pixels to 8-bit RGB, dropping the alpha channel if present.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An RGB8 image containing the image data.
///
/// # Errors
///
/// [`IoError::FileDoesNotExist`] when the path does not exist, [`IoError::ImageDecodeError`]
/// when the content cannot be decoded.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    log::debug!("decoded {} as {}", file_path.display(), size);

    Ok(Image::new(size, img.into_rgb8().into_raw())?)
}

/// Writes an RGB8 image to the given file path as PNG.
///
/// # Arguments
///
/// * `file_path` - The path of the PNG file to write.
/// * `image` - The image to encode.
pub fn write_image_png_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
) -> Result<(), IoError> {
    image::save_buffer_with_format(
        file_path,
        image.as_slice(),
        image.width() as u32,
        image.height() as u32,
        image::ExtendedColorType::Rgb8,
        image::ImageFormat::Png,
    )?;

    Ok(())
}
