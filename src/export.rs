use gif::{Encoder, Frame, Repeat};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Widest GIF that gets written; larger frames are scaled down
pub const GIF_MAX_WIDTH: u32 = 480;
/// Frames per second captured into a GIF
pub const GIF_FPS: f32 = 20.0;

/// Write a snapshot of `image` as PNG
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), String> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| format!("Failed to write PNG {}: {}", path.display(), e))?;
    log::info!("saved snapshot {}", path.display());
    Ok(())
}

/// `<prefix>-<unix seconds>.<ext>` in the working directory
pub fn timestamped_path(prefix: &str, ext: &str) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("{}-{}.{}", prefix, secs, ext))
}

/// GIF output size for a source frame: at most `GIF_MAX_WIDTH` wide, aspect kept
pub fn gif_size(width: u32, height: u32) -> (u16, u16) {
    let (w, h) = if width > GIF_MAX_WIDTH {
        let scaled_h = (height as f64 * GIF_MAX_WIDTH as f64 / width as f64).round() as u32;
        (GIF_MAX_WIDTH, scaled_h)
    } else {
        (width, height)
    };
    (
        w.clamp(1, u16::MAX as u32) as u16,
        h.clamp(1, u16::MAX as u32) as u16,
    )
}

/// Streams composited frames into an infinitely looping GIF
pub struct GifRecorder {
    encoder: Encoder<BufWriter<File>>,
    path: PathBuf,
    width: u16,
    height: u16,
    /// Seconds of animation since the last captured frame
    pending: f32,
    frames: usize,
}

impl GifRecorder {
    /// Start a recording sized for `source_width` x `source_height` frames
    pub fn create(path: &Path, source_width: u32, source_height: u32) -> Result<Self, String> {
        if source_width == 0 || source_height == 0 {
            return Err("Cannot record an empty surface".to_string());
        }
        let (width, height) = gif_size(source_width, source_height);
        let file = File::create(path)
            .map_err(|e| format!("Failed to create GIF {}: {}", path.display(), e))?;
        let mut encoder = Encoder::new(BufWriter::new(file), width, height, &[])
            .map_err(|e| format!("Failed to start GIF encoder: {}", e))?;
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| format!("Failed to set GIF looping: {}", e))?;
        log::info!("recording {}x{} GIF to {}", width, height, path.display());
        Ok(Self {
            encoder,
            path: path.to_path_buf(),
            width,
            height,
            // Capture the very first offered frame
            pending: 1.0 / GIF_FPS,
            frames: 0,
        })
    }

    /// Offer a frame that is `dt` seconds after the previous one. Frames are captured at
    /// `GIF_FPS`; the rest are dropped.
    pub fn offer_frame(&mut self, image: &RgbaImage, dt: f32) -> Result<bool, String> {
        self.pending += dt.max(0.0);
        if self.pending < 1.0 / GIF_FPS {
            return Ok(false);
        }
        self.pending -= 1.0 / GIF_FPS;
        self.write_frame(image)?;
        Ok(true)
    }

    /// Append `image`, scaled to the recording size
    pub fn write_frame(&mut self, image: &RgbaImage) -> Result<(), String> {
        let (w, h) = (self.width as u32, self.height as u32);
        let mut pixels = if image.width() == w && image.height() == h {
            image.as_raw().clone()
        } else {
            imageops::resize(image, w, h, FilterType::Triangle).into_raw()
        };
        let mut frame = Frame::from_rgba_speed(self.width, self.height, &mut pixels, 10);
        frame.delay = (100.0 / GIF_FPS).round() as u16;
        self.encoder
            .write_frame(&frame)
            .map_err(|e| format!("Failed to write GIF frame: {}", e))?;
        self.frames += 1;
        Ok(())
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Write the trailer and flush. Returns the number of frames recorded.
    pub fn finish(self) -> Result<usize, String> {
        let mut writer = self
            .encoder
            .into_inner()
            .map_err(|e| format!("Failed to finish GIF: {}", e))?;
        writer
            .flush()
            .map_err(|e| format!("Failed to flush GIF: {}", e))?;
        log::info!("saved {} frames to {}", self.frames, self.path.display());
        Ok(self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_gif_size_caps_width() {
        assert_eq!(gif_size(320, 200), (320, 200));
        assert_eq!(gif_size(960, 540), (480, 270));
        assert_eq!(gif_size(4800, 10), (480, 1));
    }

    #[test]
    fn test_png_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let image = RgbaImage::from_pixel(12, 8, Rgba([200, 10, 30, 255]));
        save_png(&image, &path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (12, 8));
        assert_eq!(*loaded.get_pixel(5, 5), Rgba([200, 10, 30, 255]));
    }

    #[test]
    fn test_gif_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.gif");
        let mut recorder = GifRecorder::create(&path, 960, 480).unwrap();
        assert_eq!(recorder.size(), (480, 240));

        let image = RgbaImage::from_pixel(960, 480, Rgba([20, 40, 200, 255]));
        // One second at 60 fps yields 20 captured frames
        let captured = (0..60)
            .filter(|_| recorder.offer_frame(&image, 1.0 / 60.0).unwrap())
            .count();
        assert!((19..=21).contains(&captured));
        assert_eq!(recorder.finish().unwrap(), captured);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");
        assert_eq!(*bytes.last().unwrap(), 0x3b);
    }

    #[test]
    fn test_empty_surface_cannot_record() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GifRecorder::create(&dir.path().join("x.gif"), 0, 10).is_err());
    }
}
