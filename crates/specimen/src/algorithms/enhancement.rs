//! Contrast limited adaptive histogram equalization (CLAHE).
//!
//! The image is split into a grid of tiles. Each tile gets its own
//! clipped-histogram equalization lookup table, and every output pixel
//! bilinearly blends the tables of the four nearest tile centres so that
//! tile seams do not show.

use image::{GrayImage, Luma};
use crate::{
    algorithms::smoothing::reflect_101,
    error::{Result, SpecimenError},
    traits::ImagePreprocessor,
};

const HIST_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct ClaheEnhancer {
    /// Histogram bin ceiling relative to a uniform distribution; zero or
    /// negative disables clipping
    pub clip_limit: f64,
    /// Tiles across and down
    pub tile_grid: (u32, u32),
}

impl Default for ClaheEnhancer {
    fn default() -> Self {
        Self {
            clip_limit: 3.0,
            tile_grid: (8, 8),
        }
    }
}

impl ClaheEnhancer {
    pub fn new(clip_limit: f64, tile_grid: (u32, u32)) -> Self {
        Self { clip_limit, tile_grid }
    }

    fn tile_lut(&self, image: &GrayImage, origin: (u32, u32), tile: (u32, u32)) -> [u8; HIST_SIZE] {
        let (width, height) = image.dimensions();
        let tile_area = (tile.0 * tile.1) as usize;

        let mut hist = [0usize; HIST_SIZE];
        for ty in 0..tile.1 {
            let y = reflect_101((origin.1 + ty) as i64, height);
            for tx in 0..tile.0 {
                let x = reflect_101((origin.0 + tx) as i64, width);
                hist[image.get_pixel(x, y)[0] as usize] += 1;
            }
        }

        if self.clip_limit > 0.0 {
            let limit = ((self.clip_limit * tile_area as f64 / HIST_SIZE as f64) as usize).max(1);
            clip_histogram(&mut hist, limit);
        }

        let scale = (HIST_SIZE - 1) as f32 / tile_area as f32;
        let mut lut = [0u8; HIST_SIZE];
        let mut cumulative = 0usize;
        for (bin, entry) in hist.iter().zip(lut.iter_mut()) {
            cumulative += bin;
            *entry = saturate_round(cumulative as f32 * scale);
        }
        lut
    }
}

/// Caps every bin at `limit` and hands the excess back evenly, spreading
/// the remainder one count at a time at a fixed stride from bin zero.
fn clip_histogram(hist: &mut [usize; HIST_SIZE], limit: usize) {
    let mut clipped = 0usize;
    for bin in hist.iter_mut() {
        if *bin > limit {
            clipped += *bin - limit;
            *bin = limit;
        }
    }

    let batch = clipped / HIST_SIZE;
    let mut residual = clipped - batch * HIST_SIZE;
    for bin in hist.iter_mut() {
        *bin += batch;
    }

    if residual != 0 {
        let step = (HIST_SIZE / residual).max(1);
        let mut i = 0;
        while i < HIST_SIZE && residual > 0 {
            hist[i] += 1;
            i += step;
            residual -= 1;
        }
    }
}

/// Tile size over the mirrored extension of the image.
///
/// An image that divides evenly into the grid is used as is. Otherwise both
/// axes grow by `tiles - dim % tiles`, so an axis that already divides
/// evenly still gains a whole extra tile.
fn tile_size(dimensions: (u32, u32), tile_grid: (u32, u32)) -> (u32, u32) {
    let (width, height) = dimensions;
    let (tiles_x, tiles_y) = tile_grid;
    if width % tiles_x == 0 && height % tiles_y == 0 {
        return (width / tiles_x, height / tiles_y);
    }
    (
        (width + tiles_x - width % tiles_x) / tiles_x,
        (height + tiles_y - height % tiles_y) / tiles_y,
    )
}

/// Round half to even and clamp into the 8-bit range
fn saturate_round(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, u8::MAX as f32) as u8
}

/// Lower tile index, upper tile index and the weight of the upper one for
/// a pixel coordinate
fn neighbours(coord: u32, tile_len: u32, tiles: u32) -> (usize, usize, f32) {
    let pos = coord as f32 * (1.0 / tile_len as f32) - 0.5;
    let lower = pos.floor();
    let weight = pos - lower;
    let lower = lower as i64;
    let upper = (lower + 1).min(tiles as i64 - 1);
    (lower.max(0) as usize, upper as usize, weight)
}

impl ImagePreprocessor for ClaheEnhancer {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let (width, height) = image.dimensions();
        let (tiles_x, tiles_y) = self.tile_grid;
        if tiles_x == 0 || tiles_y == 0 {
            return Err(SpecimenError::ImageProcessing(format!(
                "CLAHE tile grid must be non-zero, got {}x{}",
                tiles_x, tiles_y
            )));
        }
        if width == 0 || height == 0 {
            return Ok(image.clone());
        }

        let (tile_w, tile_h) = tile_size((width, height), self.tile_grid);

        let luts: Vec<[u8; HIST_SIZE]> = (0..tiles_y)
            .flat_map(|ty| (0..tiles_x).map(move |tx| (tx, ty)))
            .map(|(tx, ty)| self.tile_lut(image, (tx * tile_w, ty * tile_h), (tile_w, tile_h)))
            .collect();
        let lut = |tx: usize, ty: usize| &luts[ty * tiles_x as usize + tx];

        let columns: Vec<(usize, usize, f32)> = (0..width)
            .map(|x| neighbours(x, tile_w, tiles_x))
            .collect();

        let mut enhanced = GrayImage::new(width, height);
        for y in 0..height {
            let (ty1, ty2, ya) = neighbours(y, tile_h, tiles_y);
            for x in 0..width {
                let (tx1, tx2, xa) = columns[x as usize];
                let v = image.get_pixel(x, y)[0] as usize;

                let top = lut(tx1, ty1)[v] as f32 * (1.0 - xa) + lut(tx2, ty1)[v] as f32 * xa;
                let bottom = lut(tx1, ty2)[v] as f32 * (1.0 - xa) + lut(tx2, ty2)[v] as f32 * xa;
                let value = top * (1.0 - ya) + bottom * ya;

                enhanced.put_pixel(x, y, Luma([saturate_round(value)]));
            }
        }

        Ok(enhanced)
    }
}
