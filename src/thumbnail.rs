use std::time::Duration;

use eframe::egui::ColorImage;

/// Largest edge, in pixels, of the preview texture.
const MAX_EDGE: u32 = 320;

/// Upper bound for the whole thumbnail request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Downloads and decodes the thumbnail yt-dlp reported. Blocking.
pub fn fetch_thumbnail(url: &str) -> Option<ColorImage> {
    fetch_with_timeout(url, REQUEST_TIMEOUT)
}

fn fetch_with_timeout(url: &str, timeout: Duration) -> Option<ColorImage> {
    let resp = match reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .and_then(|c| c.get(url).send())
        .and_then(|r| r.error_for_status())
    {
        Ok(resp) => resp,
        Err(e) => {
            log::warn!("Thumbnail request failed: {e}");
            return None;
        }
    };
    let bytes = resp.bytes().ok()?;
    decode_thumbnail(&bytes)
}

/// Decodes image bytes into an RGBA texture, downscaling large images.
pub fn decode_thumbnail(bytes: &[u8]) -> Option<ColorImage> {
    let mut img = image::load_from_memory(bytes).ok()?;
    if img.width() > MAX_EDGE || img.height() > MAX_EDGE {
        img = img.thumbnail(MAX_EDGE, MAX_EDGE);
    }
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, &rgba))
}
