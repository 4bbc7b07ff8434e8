use crate::color::Rgb;
use image::{Rgba, RgbaImage};
use ratatui::style::Color;

/// Half-block rendering: each terminal cell shows two vertically stacked pixel blocks,
/// the upper one as the foreground of '▀' and the lower one as the background.
pub const UPPER_HALF: char = '▀';

/// Surface pixels covered by one terminal cell (width, height)
pub const CELL_PIXELS: (u32, u32) = (8, 16);

/// Samples taken per axis when averaging a half-cell block
const SAMPLES: u32 = 3;

/// A single rendered cell with position and colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockCell {
    pub x: u16,
    pub y: u16,
    pub top: Color,
    pub bottom: Color,
}

/// Render an image to half-block cells filling a `canvas_width` x `canvas_height` area.
///
/// The image is stretched to the canvas, so a frame composed before a resize still fills it.
pub fn render_to_blocks(image: &RgbaImage, canvas_width: u16, canvas_height: u16) -> Vec<BlockCell> {
    if image.width() == 0 || image.height() == 0 || canvas_width == 0 || canvas_height == 0 {
        return Vec::new();
    }

    // Two blocks per cell vertically
    let block_w = image.width() as f32 / canvas_width as f32;
    let block_h = image.height() as f32 / (canvas_height as f32 * 2.0);

    let mut cells = Vec::with_capacity(canvas_width as usize * canvas_height as usize);
    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let x0 = cx as f32 * block_w;
            let top_y0 = cy as f32 * 2.0 * block_h;
            let top = average_block(image, x0, top_y0, block_w, block_h);
            let bottom = average_block(image, x0, top_y0 + block_h, block_w, block_h);
            cells.push(BlockCell {
                x: cx,
                y: cy,
                top: to_color(top),
                bottom: to_color(bottom),
            });
        }
    }
    cells
}

/// Mean color of a `SAMPLES` x `SAMPLES` grid inside the block
fn average_block(image: &RgbaImage, x0: f32, y0: f32, w: f32, h: f32) -> [f32; 3] {
    let mut sum = [0.0f32; 3];
    let mut count = 0.0f32;
    for sy in 0..SAMPLES {
        for sx in 0..SAMPLES {
            let x = (x0 + (sx as f32 + 0.5) * w / SAMPLES as f32) as u32;
            let y = (y0 + (sy as f32 + 0.5) * h / SAMPLES as f32) as u32;
            if let Some(Rgba([r, g, b, a])) = image.get_pixel_checked(x, y).copied() {
                // Transparent pixels read as black
                let alpha = a as f32 / 255.0;
                sum[0] += r as f32 * alpha;
                sum[1] += g as f32 * alpha;
                sum[2] += b as f32 * alpha;
                count += 1.0;
            }
        }
    }
    if count > 0.0 {
        sum.map(|c| c / count)
    } else {
        sum
    }
}

fn to_color(rgb: [f32; 3]) -> Color {
    let [r, g, b] = rgb.map(|c| c.round().clamp(0.0, 255.0) as u8);
    Rgb::new(r, g, b).to_terminal()
}

/// Surface size for a given canvas size, in pixels
pub fn surface_size_for(canvas_width: u16, canvas_height: u16) -> (u32, u32) {
    (
        canvas_width as u32 * CELL_PIXELS.0,
        canvas_height as u32 * CELL_PIXELS.1,
    )
}

/// Surface position of the center of canvas cell (`col`, `row`)
pub fn cell_to_surface(col: u16, row: u16) -> (f32, f32) {
    (
        (col as f32 + 0.5) * CELL_PIXELS.0 as f32,
        (row as f32 + 0.5) * CELL_PIXELS.1 as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves_take_their_own_color() {
        // 16 px tall: top half red, bottom half blue, one cell
        let image = RgbaImage::from_fn(8, 16, |_, y| {
            if y < 8 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let cells = render_to_blocks(&image, 1, 1);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].top, Color::Rgb(255, 0, 0));
        assert_eq!(cells[0].bottom, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_transparent_reads_black() {
        let image = RgbaImage::new(16, 32);
        let cells = render_to_blocks(&image, 2, 2);
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().all(|c| c.top == Color::Rgb(0, 0, 0)));
    }

    #[test]
    fn test_cells_cover_canvas_in_order() {
        let image = RgbaImage::from_pixel(80, 48, Rgba([10, 20, 30, 255]));
        let cells = render_to_blocks(&image, 10, 3);
        assert_eq!(cells.len(), 30);
        assert_eq!((cells[0].x, cells[0].y), (0, 0));
        assert_eq!((cells[29].x, cells[29].y), (9, 2));
        assert!(cells.iter().all(|c| c.bottom == Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(render_to_blocks(&RgbaImage::new(0, 0), 10, 10).is_empty());
        assert!(render_to_blocks(&RgbaImage::new(8, 8), 0, 10).is_empty());
    }

    #[test]
    fn test_size_mapping() {
        assert_eq!(surface_size_for(100, 40), (800, 640));
        assert_eq!(cell_to_surface(0, 0), (4.0, 8.0));
        assert_eq!(cell_to_surface(10, 2), (84.0, 40.0));
    }
}
