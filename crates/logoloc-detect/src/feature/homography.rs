// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template-plane to image-plane homography: normalized DLT plus RANSAC.

use nalgebra::{DMatrix, Matrix3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use logoloc_core::config::RansacConfig;

/// Minimal sample size for a homography.
const SAMPLE_SIZE: usize = 4;
/// Attempts at drawing a non-degenerate minimal sample per iteration.
const MAX_SAMPLE_ATTEMPTS: usize = 300;
/// Twice the triangle area below which three points count as collinear.
const COLLINEAR_EPS: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomographyError {
    #[error("too few points: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    #[error("insufficient inliers: need {needed}, found {found}")]
    InsufficientInliers { needed: usize, found: usize },
}

/// Fitted model with its inlier mask over the input correspondences.
#[derive(Debug, Clone)]
pub struct RansacFit {
    pub h: Matrix3<f64>,
    pub inlier_mask: Vec<bool>,
    pub n_inliers: usize,
}

// -- Projection ---------------------------------------------------------------

/// Project a point through `h`: `H * [x, y, 1]^T -> [u, v]`.
///
/// Points mapped to infinity come back as NaN.
pub fn project(h: &Matrix3<f64>, x: f64, y: f64) -> [f64; 2] {
    let p = h * Vector3::new(x, y, 1.0);
    if p[2].abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    [p[0] / p[2], p[1] / p[2]]
}

pub fn reprojection_error(h: &Matrix3<f64>, src: &[f64; 2], dst: &[f64; 2]) -> f64 {
    let p = project(h, src[0], src[1]);
    let dx = p[0] - dst[0];
    let dy = p[1] - dst[1];
    (dx * dx + dy * dy).sqrt()
}

// -- Hartley normalization ----------------------------------------------------

/// Translate the centroid to the origin and scale the mean distance to sqrt(2).
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();

    (t, normalized)
}

// -- DLT ----------------------------------------------------------------------

/// Least-squares homography from at least four correspondences.
///
/// Returns `H` with `dst ~ project(H, src)`, scaled so `H[2][2] = 1` when
/// that entry is non-zero.
pub fn estimate_homography_dlt(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<Matrix3<f64>, HomographyError> {
    let n = src.len();
    if n < SAMPLE_SIZE || dst.len() < SAMPLE_SIZE {
        return Err(HomographyError::TooFewPoints {
            needed: SAMPLE_SIZE,
            got: n.min(dst.len()),
        });
    }
    if n != dst.len() {
        return Err(HomographyError::NumericalFailure(
            "src and dst must have the same length".into(),
        ));
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    // 2n x 9 system A h = 0
    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // h is the eigenvector of A^T A with the smallest eigenvalue.
    let ata = a.transpose() * &a;
    let eig = nalgebra::SymmetricEigen::new(ata);
    let min_idx = (0..9)
        .min_by(|&i, &j| {
            eig.eigenvalues[i]
                .abs()
                .total_cmp(&eig.eigenvalues[j].abs())
        })
        .unwrap_or(0);
    let v = |j: usize| eig.eigenvectors[(j, min_idx)];
    let h_norm = Matrix3::new(v(0), v(1), v(2), v(3), v(4), v(5), v(6), v(7), v(8));

    // H = T_dst^-1 * H_norm * T_src
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| HomographyError::NumericalFailure("T_dst not invertible".into()))?;
    let h = t_dst_inv * h_norm * t_src;

    let scale = h[(2, 2)];
    let h = if scale.abs() < 1e-15 { h } else { h / scale };
    ensure_usable(&h)?;
    Ok(h)
}

fn ensure_usable(h: &Matrix3<f64>) -> Result<(), HomographyError> {
    if !h.iter().all(|v| v.is_finite()) {
        return Err(HomographyError::NumericalFailure(
            "homography has non-finite entries".into(),
        ));
    }
    if h.determinant().abs() < 1e-12 {
        return Err(HomographyError::NumericalFailure(
            "homography is singular".into(),
        ));
    }
    Ok(())
}

// -- RANSAC -------------------------------------------------------------------

/// Robust homography fit.
///
/// Minimal samples whose points are collinear in either plane are redrawn.
/// The iteration budget shrinks adaptively once a model with inlier ratio
/// `w` is found: `log(1 - confidence) / log(1 - w^4)`, capped at `max_iters`.
/// The best model is refit on its inliers; the refit is kept only when it
/// does not lose inliers. Correspondences with error `<= reproj_threshold`
/// count as inliers.
pub fn fit_homography_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    config: &RansacConfig,
) -> Result<RansacFit, HomographyError> {
    let n = src.len().min(dst.len());
    if n < SAMPLE_SIZE {
        return Err(HomographyError::TooFewPoints {
            needed: SAMPLE_SIZE,
            got: n,
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let threshold = config.reproj_threshold;

    let mut best: Option<RansacFit> = None;
    let mut budget = config.max_iters;
    let mut iter = 0;

    while iter < budget {
        iter += 1;

        let Some(indices) = draw_sample(&mut rng, src, dst, n) else {
            break;
        };
        let s4: Vec<[f64; 2]> = indices.iter().map(|&i| src[i]).collect();
        let d4: Vec<[f64; 2]> = indices.iter().map(|&i| dst[i]).collect();
        let Ok(h) = estimate_homography_dlt(&s4, &d4) else {
            continue;
        };

        let (mask, count) = inlier_mask(&h, src, dst, threshold);
        if best.as_ref().is_none_or(|b| count > b.n_inliers) {
            budget = budget.min(adaptive_iterations(
                count as f64 / n as f64,
                config.confidence,
                config.max_iters,
            ));
            best = Some(RansacFit {
                h,
                inlier_mask: mask,
                n_inliers: count,
            });
        }
    }

    let best = best.ok_or_else(|| {
        HomographyError::NumericalFailure("no non-degenerate minimal sample".into())
    })?;
    if best.n_inliers < SAMPLE_SIZE {
        return Err(HomographyError::InsufficientInliers {
            needed: SAMPLE_SIZE,
            found: best.n_inliers,
        });
    }

    let (inlier_src, inlier_dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = (0..n)
        .filter(|&i| best.inlier_mask[i])
        .map(|i| (src[i], dst[i]))
        .unzip();

    let fit = match estimate_homography_dlt(&inlier_src, &inlier_dst) {
        Ok(h_refit) => {
            let (mask, count) = inlier_mask(&h_refit, src, dst, threshold);
            if count >= best.n_inliers {
                RansacFit {
                    h: h_refit,
                    inlier_mask: mask,
                    n_inliers: count,
                }
            } else {
                best
            }
        }
        Err(_) => best,
    };

    debug!(
        iterations = iter,
        inliers = fit.n_inliers,
        total = n,
        "RANSAC homography fitted"
    );
    Ok(fit)
}

fn inlier_mask(
    h: &Matrix3<f64>,
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    threshold: f64,
) -> (Vec<bool>, usize) {
    let mask: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(s, d)| reprojection_error(h, s, d) <= threshold)
        .collect();
    let count = mask.iter().filter(|&&m| m).count();
    (mask, count)
}

fn adaptive_iterations(inlier_ratio: f64, confidence: f64, max_iters: usize) -> usize {
    let w4 = inlier_ratio.clamp(0.0, 1.0).powi(SAMPLE_SIZE as i32);
    if w4 <= f64::EPSILON {
        return max_iters;
    }
    if w4 >= 1.0 - f64::EPSILON {
        return 1;
    }
    let needed = (1.0 - confidence).ln() / (1.0 - w4).ln();
    if !needed.is_finite() || needed < 0.0 {
        return max_iters;
    }
    (needed.ceil() as usize).clamp(1, max_iters)
}

/// Four distinct indices with no three points collinear in either plane.
fn draw_sample(
    rng: &mut StdRng,
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    n: usize,
) -> Option<[usize; SAMPLE_SIZE]> {
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let mut idx = [0usize; SAMPLE_SIZE];
        let mut filled = 0;
        while filled < SAMPLE_SIZE {
            let candidate = rng.gen_range(0..n);
            if !idx[..filled].contains(&candidate) {
                idx[filled] = candidate;
                filled += 1;
            }
        }

        if !has_collinear_triple(&idx.map(|i| src[i])) && !has_collinear_triple(&idx.map(|i| dst[i]))
        {
            return Some(idx);
        }
    }
    None
}

fn has_collinear_triple(pts: &[[f64; 2]; SAMPLE_SIZE]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let (p, q, r) = (pts[a], pts[b], pts[c]);
        let cross = (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0]);
        cross.abs() <= COLLINEAR_EPS
    })
}

// -- Tests --------------------------------------------------------------------
