//! Intensity grids
//!
//! A grid maps (column, row) to an 8-bit intensity. Columns run along the
//! circumference, rows are printed layers with row 0 being the last layer
//! printed (image top). Any `image::GrayImage` is a grid; [`RasterGrid`] is
//! an owned buffer for generated content.

use crate::error::ToolpathResult;
use image::{DynamicImage, GrayImage};
use std::path::Path;

/// Read-only 8-bit intensity raster
pub trait IntensityGrid {
    /// Number of columns
    fn width(&self) -> u32;

    /// Number of rows
    fn height(&self) -> u32;

    /// Intensity at `(column, row)`; both must be in range
    fn get(&self, column: u32, row: u32) -> u8;
}

impl IntensityGrid for GrayImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn get(&self, column: u32, row: u32) -> u8 {
        self.get_pixel(column, row).0[0]
    }
}

impl<G: IntensityGrid + ?Sized> IntensityGrid for &G {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn get(&self, column: u32, row: u32) -> u8 {
        (**self).get(column, row)
    }
}

/// Owned row-major intensity buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterGrid {
    /// Grid where every cell has the same intensity
    pub fn uniform(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// Grid computed cell by cell from `f(column, row)`
    pub fn from_fn<F: FnMut(u32, u32) -> u8>(width: u32, height: u32, mut f: F) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for row in 0..height {
            for column in 0..width {
                data.push(f(column, row));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    fn index(&self, column: u32, row: u32) -> usize {
        debug_assert!(
            column < self.width && row < self.height,
            "grid access ({column}, {row}) outside {}x{}",
            self.width,
            self.height
        );
        row as usize * self.width as usize + column as usize
    }
}

impl IntensityGrid for RasterGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get(&self, column: u32, row: u32) -> u8 {
        self.data[self.index(column, row)]
    }
}

/// Adjustments applied when an image becomes a grid
#[derive(Debug, Clone, Default)]
pub struct GridTransformations {
    /// Mirror horizontally (reverses the direction around the cylinder)
    pub mirror_x: bool,
    /// Mirror vertically (prints the image upside down)
    pub mirror_y: bool,
    /// Invert intensities so that dark pixels become deep relief
    pub invert: bool,
    /// Resize to this many rows, keeping the aspect ratio
    pub rows: Option<u32>,
}

/// Load an image file as an intensity grid.
///
/// Missing, unreadable and undecodable files all fail with
/// [`ToolpathError::Image`](crate::error::ToolpathError::Image).
pub fn load_grid<P: AsRef<Path>>(
    path: P,
    transformations: &GridTransformations,
) -> ToolpathResult<GrayImage> {
    let img = image::open(path.as_ref())?;
    Ok(grid_from_image(img, transformations))
}

/// Convert a decoded image to an intensity grid
pub fn grid_from_image(img: DynamicImage, transformations: &GridTransformations) -> GrayImage {
    let mut gray = img.to_luma8();

    if transformations.mirror_x {
        image::imageops::flip_horizontal_in_place(&mut gray);
    }
    if transformations.mirror_y {
        image::imageops::flip_vertical_in_place(&mut gray);
    }

    if let Some(rows) = transformations.rows {
        if rows > 0 && rows != gray.height() {
            let aspect_ratio = gray.width() as f64 / gray.height() as f64;
            let columns = ((rows as f64 * aspect_ratio).round() as u32).max(1);
            gray = image::imageops::resize(
                &gray,
                columns,
                rows,
                image::imageops::FilterType::Lanczos3,
            );
        }
    }

    if transformations.invert {
        image::imageops::invert(&mut gray);
    }

    gray
}
