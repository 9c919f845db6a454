// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Brute-force Hamming matching with a nearest/second-nearest ratio test.

use rayon::prelude::*;

use super::orb::Descriptor;

/// A query descriptor paired with its nearest train descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub query: usize,
    pub train: usize,
    pub distance: u32,
}

/// Number of differing bits between two descriptors.
pub fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// For every query descriptor, find its two nearest train descriptors and
/// keep the nearest only when `best < ratio * second`.
///
/// Results are in query order. With fewer than two train descriptors no
/// match can pass the test and the result is empty.
pub fn ratio_matches(query: &[Descriptor], train: &[Descriptor], ratio: f32) -> Vec<Match> {
    if train.len() < 2 {
        return Vec::new();
    }

    query
        .par_iter()
        .enumerate()
        .filter_map(|(qi, q)| {
            let (best, second) = two_nearest(q, train);
            let (train_idx, best_dist) = best;
            ((best_dist as f32) < ratio * second as f32).then_some(Match {
                query: qi,
                train: train_idx,
                distance: best_dist,
            })
        })
        .collect()
}

/// `((index, distance), second_distance)`; ties keep the lower index as best.
fn two_nearest(q: &Descriptor, train: &[Descriptor]) -> ((usize, u32), u32) {
    let mut best = (0usize, u32::MAX);
    let mut second = u32::MAX;

    for (ti, t) in train.iter().enumerate() {
        let d = hamming(q, t);
        if d < best.1 {
            second = best.1;
            best = (ti, d);
        } else if d < second {
            second = d;
        }
    }

    (best, second)
}
