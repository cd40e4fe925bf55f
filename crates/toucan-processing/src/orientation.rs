use image::metadata::Orientation;
use image::DynamicImage;
use std::io::Cursor;

/// Read the EXIF orientation tag (1-8), defaulting to 1 when absent or unreadable
pub fn read_exif_orientation(data: &[u8]) -> u8 {
    let mut cursor = Cursor::new(data);
    exif::Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .and_then(|value| u8::try_from(value).ok())
        .filter(|value| (1..=8).contains(value))
        .unwrap_or(1)
}

/// Rotate/flip pixels so the image displays upright without its EXIF tag
pub fn apply_exif_orientation(mut img: DynamicImage, data: &[u8]) -> DynamicImage {
    let orientation = read_exif_orientation(data);
    if orientation == 1 {
        return img;
    }

    tracing::debug!(orientation, "Applying EXIF orientation");

    if let Some(orientation) = Orientation::from_exif(orientation) {
        img.apply_orientation(orientation);
    }
    img
}
