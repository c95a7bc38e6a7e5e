use image::{GrayImage, Luma};

use crate::config::CanvasConfig;

/// A single-channel bitmap the user draws on.
///
/// Coordinates are in pixels with the origin at the top-left corner; points
/// outside the bitmap are clipped rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: GrayImage,
    background: u8,
}

impl Canvas {
    /// A square canvas of `size` pixels filled with `background`.
    pub fn new(size: u32, background: u8) -> Self {
        Self {
            image: GrayImage::from_pixel(size, size, Luma([background])),
            background,
        }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.size, config.background)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn background(&self) -> u8 {
        self.background
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Intensity at `(x, y)`, or `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        self.image.get_pixel_checked(x, y).map(|p| p[0])
    }

    /// Resets every pixel to the background value.
    pub fn clear(&mut self) {
        let background = self.background;
        self.image.pixels_mut().for_each(|p| *p = Luma([background]));
    }

    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p[0] == self.background)
    }

    /// Fills the disc of `radius` centered on `(cx, cy)` with `value`.
    ///
    /// A pixel is covered when its center lies inside the disc.
    pub fn paint_disc(&mut self, cx: f32, cy: f32, radius: f32, value: u8) {
        let (w, h) = (self.width() as f32, self.height() as f32);
        let x0 = (cx - radius).floor().clamp(0.0, w) as u32;
        let x1 = (cx + radius).ceil().clamp(0.0, w) as u32;
        let y0 = (cy - radius).floor().clamp(0.0, h) as u32;
        let y1 = (cy + radius).ceil().clamp(0.0, h) as u32;
        let r2 = radius * radius;

        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cy;
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.image.put_pixel(x, y, Luma([value]));
                }
            }
        }
    }

    /// Paints a stroke from `from` to `to` by stamping discs along the
    /// segment, closely enough that no gaps appear.
    pub fn paint_segment(&mut self, from: (f32, f32), to: (f32, f32), radius: f32, value: u8) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        let spacing = (radius / 2.0).max(1.0);
        let steps = (length / spacing).ceil().max(1.0) as u32;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.paint_disc(from.0 + dx * t, from.1 + dy * t, radius, value);
        }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_canvas_is_blank() {
        let canvas = Canvas::default();
        assert_eq!((canvas.width(), canvas.height()), (280, 280));
        assert!(canvas.is_blank());
        assert_eq!(canvas.pixel(0, 0), Some(0));
        assert_eq!(canvas.pixel(280, 0), None);
    }

    #[test]
    fn test_paint_disc_covers_center_but_not_corners() {
        let mut canvas = Canvas::new(40, 0);
        canvas.paint_disc(20.0, 20.0, 8.0, 255);
        assert_eq!(canvas.pixel(20, 20), Some(255));
        assert_eq!(canvas.pixel(13, 20), Some(255));
        assert_eq!(canvas.pixel(12, 12), Some(0));
        assert_eq!(canvas.pixel(29, 20), Some(0));
        assert!(!canvas.is_blank());
    }

    #[test]
    fn test_paint_disc_clips_at_edges() {
        let mut canvas = Canvas::new(16, 0);
        canvas.paint_disc(-2.0, -2.0, 5.0, 200);
        canvas.paint_disc(100.0, 100.0, 5.0, 200);
        assert_eq!(canvas.pixel(0, 0), Some(200));
        assert_eq!(canvas.pixel(15, 15), Some(0));
    }

    #[test]
    fn test_segment_has_no_gaps() {
        let mut canvas = Canvas::new(100, 0);
        canvas.paint_segment((10.0, 50.0), (90.0, 50.0), 3.0, 255);
        for x in 10..90 {
            assert_eq!(canvas.pixel(x, 50), Some(255), "gap at x = {x}");
        }
    }

    #[test]
    fn test_clear_restores_background() {
        let mut canvas = Canvas::new(64, 17);
        let blank = canvas.clone();
        canvas.paint_segment((5.0, 5.0), (60.0, 40.0), 8.0, 255);
        assert_ne!(canvas, blank);

        canvas.clear();
        assert_eq!(canvas, blank);
        assert!(canvas.is_blank());
    }
}
