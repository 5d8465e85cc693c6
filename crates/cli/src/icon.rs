//! Application icon generator.
//!
//! Draws the document glyph (page, shadow, folded corner, "PDF"
//! lettering) once at 256x256 and derives the platform icon files from
//! it: `icon.png`, a multi-size `icon.ico`, and the smaller PNG variants
//! Linux desktop entries want.

use anyhow::{Context, Result};
use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::imageops::FilterType;
use image::{ExtendedColorType, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

const BASE_SIZE: u32 = 256;
const MARGIN: u32 = 30;
const SHADOW_OFFSET: u32 = 5;
const FOLD_SIZE: u32 = 40;
const BORDER_WIDTH: u32 = 3;

/// Sizes embedded in the Windows ICO, smallest first.
const ICO_SIZES: [u32; 6] = [16, 32, 48, 64, 128, 256];
/// Standalone PNG sizes for Linux desktop entries.
const PNG_SIZES: [u32; 3] = [48, 64, 128];

const SHADOW: Rgba<u8> = Rgba([100, 100, 100, 100]);
const PAGE: Rgba<u8> = Rgba([240, 240, 240, 255]);
const BORDER: Rgba<u8> = Rgba([200, 200, 200, 255]);
const FOLD: Rgba<u8> = Rgba([220, 220, 220, 255]);
const LETTER: Rgba<u8> = Rgba([200, 50, 50, 255]);
const LETTER_SHADOW: Rgba<u8> = Rgba([0, 0, 0, 50]);

/// Writes every icon file into `output_dir` and returns the paths.
pub fn generate(output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let base = draw_base_icon();
    let mut written = Vec::new();

    let icon_png = output_dir.join("icon.png");
    base.save(&icon_png)
        .with_context(|| format!("failed to write {}", icon_png.display()))?;
    written.push(icon_png);

    let icon_ico = output_dir.join("icon.ico");
    write_ico(&base, &icon_ico)?;
    written.push(icon_ico);

    for size in PNG_SIZES {
        let path = output_dir.join(format!("icon_{size}x{size}.png"));
        resized(&base, size)
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}

fn resized(base: &RgbaImage, size: u32) -> RgbaImage {
    image::imageops::resize(base, size, size, FilterType::Lanczos3)
}

fn write_ico(base: &RgbaImage, path: &Path) -> Result<()> {
    let images: Vec<RgbaImage> = ICO_SIZES.iter().map(|&size| resized(base, size)).collect();

    let frames = images
        .iter()
        .map(|img| IcoFrame::as_png(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to encode ICO frame")?;

    let file = fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    IcoEncoder::new(file)
        .encode_images(&frames)
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

fn draw_base_icon() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(BASE_SIZE, BASE_SIZE, Rgba([0, 0, 0, 0]));

    let left = MARGIN;
    let top = MARGIN;
    let right = BASE_SIZE - MARGIN;
    let bottom = BASE_SIZE - MARGIN;

    // Drop shadow behind the page.
    fill_rect(
        &mut img,
        left + SHADOW_OFFSET,
        top + SHADOW_OFFSET,
        right + SHADOW_OFFSET,
        bottom + SHADOW_OFFSET,
        SHADOW,
    );

    // The page itself, with a border.
    fill_rect(&mut img, left, top, right, bottom, PAGE);
    for inset in 0..BORDER_WIDTH {
        stroke_rect(&mut img, left + inset, top + inset, right - inset, bottom - inset, BORDER);
    }

    // Folded corner at the top right.
    for dy in 0..FOLD_SIZE {
        for dx in 0..(FOLD_SIZE - dy) {
            put_pixel(&mut img, right - 1 - dx, top + dy, FOLD);
        }
    }

    draw_word(&mut img, "PDF");

    img
}

/// Blocky 5x7 lettering, scaled up.
fn draw_word(img: &mut RgbaImage, word: &str) {
    const SCALE: u32 = 8;
    const SPACING: u32 = 1;

    let letter_count = word.chars().count() as u32;
    let word_width = letter_count * 5 * SCALE + (letter_count - 1) * SPACING * SCALE;
    let word_height = 7 * SCALE;
    let origin_x = (BASE_SIZE - word_width) / 2;
    let origin_y = (BASE_SIZE - word_height) / 2 + SCALE;

    for (index, c) in word.chars().enumerate() {
        let offset_x = origin_x + index as u32 * (5 + SPACING) * SCALE;
        draw_glyph(img, c, offset_x + 2, origin_y + 2, SCALE, LETTER_SHADOW);
        draw_glyph(img, c, offset_x, origin_y, SCALE, LETTER);
    }
}

fn draw_glyph(img: &mut RgbaImage, c: char, origin_x: u32, origin_y: u32, scale: u32, color: Rgba<u8>) {
    for (row, cells) in glyph(c).iter().enumerate() {
        for (col, cell) in cells.chars().enumerate() {
            if cell != '#' {
                continue;
            }
            let x0 = origin_x + col as u32 * scale;
            let y0 = origin_y + row as u32 * scale;
            fill_rect(img, x0, y0, x0 + scale, y0 + scale, color);
        }
    }
}

fn glyph(c: char) -> [&'static str; 7] {
    match c {
        'P' => ["####.", "#...#", "#...#", "####.", "#....", "#....", "#...."],
        'D' => ["####.", "#...#", "#...#", "#...#", "#...#", "#...#", "####."],
        'F' => ["#####", "#....", "#....", "####.", "#....", "#....", "#...."],
        _ => ["....."; 7],
    }
}

fn fill_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            blend_pixel(img, x, y, color);
        }
    }
}

fn stroke_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    for x in x0..x1.min(img.width()) {
        put_pixel(img, x, y0, color);
        put_pixel(img, x, y1 - 1, color);
    }
    for y in y0..y1.min(img.height()) {
        put_pixel(img, x0, y, color);
        put_pixel(img, x1 - 1, y, color);
    }
}

fn put_pixel(img: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, color);
    }
}

/// Source-over blend so the shadow stays translucent against the
/// transparent background.
fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    if x >= img.width() || y >= img.height() {
        return;
    }

    if color.0[3] == 255 {
        img.put_pixel(x, y, color);
        return;
    }

    let below = *img.get_pixel(x, y);
    let alpha = u32::from(color.0[3]);
    let inverse = 255 - alpha;

    let mut blended = [0u8; 4];
    for channel in 0..3 {
        let over = u32::from(color.0[channel]) * alpha;
        let under = u32::from(below.0[channel]) * u32::from(below.0[3]) / 255 * inverse;
        blended[channel] = ((over + under) / 255) as u8;
    }
    blended[3] = (alpha + u32::from(below.0[3]) * inverse / 255) as u8;

    img.put_pixel(x, y, Rgba(blended));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn base_icon_has_expected_shape() {
        let icon = draw_base_icon();

        assert_eq!((icon.width(), icon.height()), (BASE_SIZE, BASE_SIZE));
        // Corners outside the page stay transparent.
        assert_eq!(icon.get_pixel(0, 0).0[3], 0);
        // The page interior is opaque.
        assert_eq!(icon.get_pixel(BASE_SIZE / 2, BASE_SIZE - MARGIN - 10), &PAGE);
        // The folded corner replaces the page color at the top right.
        assert_eq!(icon.get_pixel(BASE_SIZE - MARGIN - 2, MARGIN + 1), &FOLD);
    }

    #[test]
    fn generate_writes_all_variants() {
        let temp = TempDir::new().unwrap();

        let written = generate(temp.path()).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["icon.png", "icon.ico", "icon_48x48.png", "icon_64x64.png", "icon_128x128.png"]
        );

        for path in &written {
            assert!(path.exists(), "{} should exist", path.display());
        }

        let base = image::open(temp.path().join("icon.png")).unwrap();
        assert_eq!((base.width(), base.height()), (BASE_SIZE, BASE_SIZE));
    }
}
