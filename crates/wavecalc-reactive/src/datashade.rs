//! Curve rasterization ("datashading") with an explicit fallback.
//!
//! A [`Rasterizer`] either produces a fixed-size [`Raster`] of per-pixel hit
//! counts or says why it could not. [`apply_datashader`] turns a failure into
//! the plain curve sized to the requested dimensions and keeps the reason.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    #[error("Curve has no samples")]
    EmptyCurve,

    #[error("Curve has {xs} x samples but {ys} y samples")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("Sample {index} is not finite")]
    NonFinite { index: usize },

    #[error("Raster size {width}x{height} has no area")]
    ZeroSize { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Display size; unset until a renderer or the fallback assigns it.
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Curve {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        Self { xs, ys, width: None, height: None }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn len(&self) -> usize {
        self.xs.len().min(self.ys.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    fn check(&self) -> Result<(), RasterError> {
        if self.xs.len() != self.ys.len() {
            return Err(RasterError::LengthMismatch { xs: self.xs.len(), ys: self.ys.len() });
        }
        if self.xs.is_empty() {
            return Err(RasterError::EmptyCurve);
        }
        match self.points().position(|(x, y)| !(x.is_finite() && y.is_finite())) {
            Some(index) => Err(RasterError::NonFinite { index }),
            None => Ok(()),
        }
    }
}

/// Row-major hit counts; row 0 is the top of the image (largest y).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub counts: Vec<u32>,
}

impl Raster {
    pub fn count(&self, col: u32, row: u32) -> u32 {
        if col >= self.width || row >= self.height {
            return 0;
        }
        self.counts[row as usize * self.width as usize + col as usize]
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn filled(&self) -> usize {
        self.counts.iter().filter(|c| **c > 0).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Plot {
    Curve(Curve),
    Raster(Raster),
}

impl Plot {
    pub fn width(&self) -> Option<u32> {
        match self {
            Plot::Curve(c) => c.width,
            Plot::Raster(r) => Some(r.width),
        }
    }

    pub fn height(&self) -> Option<u32> {
        match self {
            Plot::Curve(c) => c.height,
            Plot::Raster(r) => Some(r.height),
        }
    }

    pub fn is_raster(&self) -> bool {
        matches!(self, Plot::Raster(_))
    }
}

pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, curve: &Curve, width: u32, height: u32) -> Result<Raster, RasterError>;
}

/// Aggregates each line segment into the pixels it crosses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineRasterizer;

impl Rasterizer for LineRasterizer {
    fn rasterize(&self, curve: &Curve, width: u32, height: u32) -> Result<Raster, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroSize { width, height });
        }
        curve.check()?;

        let x_range = padded_range(&curve.xs);
        let y_range = padded_range(&curve.ys);
        let to_pixel = |x: f64, y: f64| -> (f64, f64) {
            let px = (x - x_range.0) / (x_range.1 - x_range.0) * f64::from(width - 1);
            let py = (y_range.1 - y) / (y_range.1 - y_range.0) * f64::from(height - 1);
            (px, py)
        };

        let cell = |px: f64, py: f64| -> usize {
            let col = (px.round() as u32).min(width - 1);
            let row = (py.round() as u32).min(height - 1);
            row as usize * width as usize + col as usize
        };

        let mut counts = vec![0u32; (width as usize) * (height as usize)];
        let pixels: Vec<(f64, f64)> = curve.points().map(|(x, y)| to_pixel(x, y)).collect();
        if let [(px, py)] = pixels.as_slice() {
            counts[cell(*px, *py)] += 1;
        }
        for segment in pixels.windows(2) {
            let ((x0, y0), (x1, y1)) = (segment[0], segment[1]);
            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
            // A pixel is counted at most once per segment.
            let mut last = None;
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                let idx = cell(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
                if last != Some(idx) {
                    counts[idx] += 1;
                    last = Some(idx);
                }
            }
        }

        Ok(Raster { width, height, x_range, y_range, counts })
    }
}

fn padded_range(values: &[f64]) -> (f64, f64) {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    }
}

/// Outcome of [`apply_datashader`]. `fallback` holds the rasterizer's
/// reason when the plain curve was returned instead of a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Shaded {
    pub plot: Plot,
    pub fallback: Option<RasterError>,
}

pub fn apply_datashader(curve: Curve, rasterizer: &dyn Rasterizer, width: u32, height: u32) -> Shaded {
    match rasterizer.rasterize(&curve, width, height) {
        Ok(raster) => Shaded { plot: Plot::Raster(raster), fallback: None },
        Err(err) => {
            tracing::debug!(error = %err, "datashading failed, rendering curve directly");
            Shaded {
                plot: Plot::Curve(curve.with_size(width, height)),
                fallback: Some(err),
            }
        }
    }
}

/// `samples` evenly spaced points from `start` to `end`, both inclusive.
pub fn linspace(start: f64, end: f64, samples: usize) -> Vec<f64> {
    match samples {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
