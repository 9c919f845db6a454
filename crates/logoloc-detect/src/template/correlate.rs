// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zero-mean normalized cross-correlation over sparse edge maps.
//
// Edge maps are mostly zero, so the raw cross term is accumulated by
// scattering only non-zero pixel pairs. Window sums come from summed-area
// tables, which gives the mean-corrected numerator and both variances.

use image::GrayImage;

/// Non-zero pixels of a single-channel map, grouped by row.
#[derive(Debug, Clone)]
pub struct SparseRows {
    width: usize,
    height: usize,
    /// `entries[row_start[y]..row_start[y + 1]]` are row `y`, sorted by x.
    row_start: Vec<usize>,
    entries: Vec<(usize, f64)>,
}

impl SparseRows {
    pub fn from_gray(map: &GrayImage) -> Self {
        let (width, height) = (map.width() as usize, map.height() as usize);
        let mut row_start = Vec::with_capacity(height + 1);
        let mut entries = Vec::new();

        for (y, row) in map.rows().enumerate() {
            row_start.push(entries.len());
            for (x, px) in row.enumerate() {
                if px.0[0] != 0 {
                    entries.push((x, f64::from(px.0[0])));
                }
            }
        }
        row_start.push(entries.len());

        Self {
            width,
            height,
            row_start,
            entries,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    fn row(&self, y: usize) -> &[(usize, f64)] {
        &self.entries[self.row_start[y]..self.row_start[y + 1]]
    }

    /// Sum and sum of squares over every pixel.
    fn moments(&self) -> (f64, f64) {
        self.entries
            .iter()
            .fold((0.0, 0.0), |(s, s2), &(_, v)| (s + v, s2 + v * v))
    }
}

/// Summed-area tables of values and squared values.
///
/// `sum[y * (width+1) + x]` holds the total over `[0, x) x [0, y)`; the
/// first row and column are zero.
#[derive(Debug, Clone)]
pub struct IntegralTables {
    stride: usize,
    sum: Vec<f64>,
    sq_sum: Vec<f64>,
}

impl IntegralTables {
    pub fn new(map: &GrayImage) -> Self {
        let (w, h) = (map.width() as usize, map.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0f64; stride * (h + 1)];
        let mut sq_sum = vec![0.0f64; stride * (h + 1)];

        for y in 0..h {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let v = f64::from(map.get_pixel(x as u32, y as u32).0[0]);
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + (x + 1);
                let above = y * stride + (x + 1);
                sum[idx] = row_sum + sum[above];
                sq_sum[idx] = row_sq + sq_sum[above];
            }
        }

        Self {
            stride,
            sum,
            sq_sum,
        }
    }

    /// Sum and sum of squares over the `w x h` window at `(x, y)`.
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let (x2, y2) = (x + w, y + h);
        let rect = |t: &[f64]| t[y2 * s + x2] - t[y * s + x2] - t[y2 * s + x] + t[y * s + x];
        (rect(&self.sum), rect(&self.sq_sum))
    }
}

/// Best placement of a template inside an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub x: usize,
    pub y: usize,
    pub score: f64,
}

/// Correlate `template` against every valid placement in `image` and return
/// the first maximum in row-major order.
///
/// `None` when the template does not fit inside the image. A template with
/// zero variance scores 1 everywhere, so the peak is the origin. Windows with
/// zero variance score 0.
pub fn best_match(
    image: &SparseRows,
    tables: &IntegralTables,
    template: &SparseRows,
) -> Option<Peak> {
    let (tw, th) = (template.width(), template.height());
    if tw == 0 || th == 0 || tw > image.width() || th > image.height() {
        return None;
    }
    let rw = image.width() - tw + 1;
    let rh = image.height() - th + 1;

    let n = (tw * th) as f64;
    let (t_sum, t_sq) = template.moments();
    let t_var = t_sq - t_sum * t_sum / n;
    if t_var <= f64::EPSILON {
        return Some(Peak {
            x: 0,
            y: 0,
            score: 1.0,
        });
    }
    let t_mean = t_sum / n;

    let cross = cross_correlation(image, template, rw, rh);

    let mut best: Option<Peak> = None;
    for y in 0..rh {
        for x in 0..rw {
            let (w_sum, w_sq) = tables.window(x, y, tw, th);
            let w_var = (w_sq - w_sum * w_sum / n).max(0.0);
            let numerator = cross[y * rw + x] - t_mean * w_sum;
            let score = normalized_score(numerator, (w_var * t_var).sqrt());
            if best.is_none_or(|b| score > b.score) {
                best = Some(Peak { x, y, score });
            }
        }
    }
    best
}

/// `num / denom`, saturating to the sign within 12.5% above the denominator
/// to absorb rounding, and 0 beyond that or when the denominator is 0.
fn normalized_score(numerator: f64, denominator: f64) -> f64 {
    if numerator.abs() < denominator {
        numerator / denominator
    } else if numerator.abs() < denominator * 1.125 {
        numerator.signum()
    } else {
        0.0
    }
}

/// Raw `sum(I * T)` for every placement, `rw x rh`, row-major.
fn cross_correlation(image: &SparseRows, template: &SparseRows, rw: usize, rh: usize) -> Vec<f64> {
    let mut out = vec![0.0f64; rw * rh];

    for v in 0..template.height() {
        let t_row = template.row(v);
        if t_row.is_empty() {
            continue;
        }
        for y in 0..rh {
            let i_row = image.row(y + v);
            if i_row.is_empty() {
                continue;
            }
            let out_row = &mut out[y * rw..(y + 1) * rw];
            for &(u, tv) in t_row {
                let start = i_row.partition_point(|&(px, _)| px < u);
                for &(px, iv) in &i_row[start..] {
                    let x = px - u;
                    if x >= rw {
                        break;
                    }
                    out_row[x] += iv * tv;
                }
            }
        }
    }

    out
}
