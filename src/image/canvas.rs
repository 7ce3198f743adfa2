use crate::models::Dimensions;
use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

const BYTES_PER_PIXEL: u64 = 4;

/// RGBA8 drawing surface owned by a single compression call.
///
/// Acquired fresh per call and dropped when the call ends, whichever way it
/// ends. Never cached or shared.
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// Allocate a blank surface, refusing sizes over `max_alloc_bytes`.
    pub fn acquire(dimensions: Dimensions, max_alloc_bytes: u64) -> Result<Self> {
        let Dimensions { width, height } = dimensions;
        if width == 0 || height == 0 {
            return Err(Error::Render(format!(
                "Cannot create a {} canvas",
                dimensions
            )));
        }

        let len = u64::from(width)
            .checked_mul(u64::from(height))
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| Error::Render(format!("Canvas {} overflows", dimensions)))?;
        if len > max_alloc_bytes {
            return Err(Error::Render(format!(
                "Canvas {} needs {} bytes, limit is {}",
                dimensions, len, max_alloc_bytes
            )));
        }
        let len = usize::try_from(len)
            .map_err(|_| Error::Render(format!("Canvas {} overflows", dimensions)))?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|e| {
            Error::Render(format!("Failed to allocate {} canvas: {}", dimensions, e))
        })?;
        buf.resize(len, 0);

        let pixels = RgbaImage::from_raw(width, height, buf).ok_or_else(|| {
            Error::Render(format!("Canvas buffer does not match {}", dimensions))
        })?;

        Ok(Self { pixels })
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.pixels.width(), self.pixels.height())
    }

    /// Draw the whole of `image` scaled to fill the canvas.
    pub fn draw(&mut self, image: &DynamicImage, filter: FilterType) {
        let Dimensions { width, height } = self.dimensions();

        if image.width() == width && image.height() == height {
            imageops::replace(&mut self.pixels, &image.to_rgba8(), 0, 0);
        } else {
            let scaled = image.resize_exact(width, height, filter).into_rgba8();
            imageops::replace(&mut self.pixels, &scaled, 0, 0);
        }
    }

    pub fn into_image(self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const LIMIT: u64 = 64 * 1024 * 1024;

    #[test]
    fn test_acquire_blank_canvas() {
        let canvas = Canvas::acquire(Dimensions::new(3, 2), LIMIT).unwrap();
        assert_eq!(canvas.dimensions(), Dimensions::new(3, 2));

        let image = canvas.into_image().into_rgba8();
        assert!(image.pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_acquire_over_limit_is_render_error() {
        let result = Canvas::acquire(Dimensions::new(1000, 1000), 1000);
        assert!(matches!(result, Err(Error::Render(_))));
    }

    #[test]
    fn test_acquire_overflow_is_render_error() {
        let result = Canvas::acquire(Dimensions::new(u32::MAX, u32::MAX), u64::MAX);
        assert!(matches!(result, Err(Error::Render(_))));
    }

    #[test]
    fn test_acquire_zero_is_render_error() {
        let result = Canvas::acquire(Dimensions::new(0, 10), LIMIT);
        assert!(matches!(result, Err(Error::Render(_))));
    }

    #[test]
    fn test_draw_scales_whole_image() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            40,
            20,
            Rgba([10, 200, 30, 255]),
        ));

        let mut canvas = Canvas::acquire(Dimensions::new(4, 2), LIMIT).unwrap();
        canvas.draw(&source, FilterType::Triangle);

        let drawn = canvas.into_image().into_rgba8();
        assert_eq!(drawn.dimensions(), (4, 2));
        assert!(drawn.pixels().all(|p| *p == Rgba([10, 200, 30, 255])));
    }

    #[test]
    fn test_draw_same_size_copies_pixels() {
        let mut source = RgbaImage::new(2, 2);
        source.put_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let source = DynamicImage::ImageRgba8(source);

        let mut canvas = Canvas::acquire(Dimensions::new(2, 2), LIMIT).unwrap();
        canvas.draw(&source, FilterType::Triangle);

        let drawn = canvas.into_image().into_rgba8();
        assert_eq!(drawn.get_pixel(1, 1), &Rgba([1, 2, 3, 4]));
        assert_eq!(drawn.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }
}
