//! Image encoding: rendered page `DynamicImage` → JPEG file on disk.
//!
//! Page images are served to browsers as illustrations, not fed back to a
//! model, so JPEG at a moderate quality is the right trade: a rendered A4
//! page lands around 150–300 KB instead of the 1–2 MB a PNG would take.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// JPEG quality used for page images.
pub const JPEG_QUALITY: u8 = 85;

/// Write `img` to `path` as a JPEG. Returns the file size in bytes.
///
/// Alpha is dropped: JPEG has no alpha channel and pdfium renders pages on
/// an opaque white background anyway.
pub fn write_jpeg(img: &DynamicImage, path: &Path) -> Result<u64, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut writer = BufWriter::new(File::create(path)?);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY).encode_image(&rgb)?;
    writer.flush()?;
    drop(writer);

    let size = std::fs::metadata(path)?.len();
    debug!("Encoded {} → {} bytes JPEG", path.display(), size);
    Ok(size)
}

/// File name of the image for a 1-based page number.
pub fn page_image_name(page_num: usize) -> String {
    format!("img-{page_num}.jpg")
}
