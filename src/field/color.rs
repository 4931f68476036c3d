//! Slope-to-color bucketing.
//!
//! All slope keys for a render are clustered before anything is drawn, so
//! similar slopes share a shade and isolated outliers get hues far from
//! the common band. The palette is a pure function of the key multiset:
//! keys are sorted internally and draw order never matters.

use std::fmt;

pub type Rgb = (u8, u8, u8);

/// Common buckets sweep this hue range (degrees), sorted by slope.
const COMMON_HUE_MIN: f64 = 30.0;
const COMMON_HUE_MAX: f64 = 240.0;
/// Outlier buckets live in [300°, 345°), at least 45° of circular hue
/// distance from anything in the common band.
const OUTLIER_HUE_MIN: f64 = 300.0;
const OUTLIER_HUE_SPAN: f64 = 45.0;

const SATURATION: f64 = 0.80;
const VALUE: f64 = 0.95;

/// Tuning for the clustering pass.
#[derive(Debug, Clone, Copy)]
pub struct PaletteOptions {
    /// Absolute gap floor: keys closer than this always share a bucket.
    pub abs_tol: f64,
    /// Gap tolerance as a fraction of the full key range.
    pub rel_tol: f64,
    /// A singleton bucket further than `outlier_factor * tolerance` from
    /// its nearest neighbor is treated as an outlier.
    pub outlier_factor: f64,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            abs_tol: 1e-9,
            rel_tol: 0.05,
            outlier_factor: 4.0,
        }
    }
}

/// One slope bucket: a closed key interval and its assigned color.
#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    pub lo: f64,
    pub hi: f64,
    pub hue: f64,
    pub color: Rgb,
    pub outlier: bool,
}

impl Bucket {
    fn center(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }
}

/// The per-render color assignment, built once from the full slope set.
#[derive(Debug, Clone, Default)]
pub struct SlopePalette {
    buckets: Vec<Bucket>,
}

impl SlopePalette {
    /// Cluster `keys` and assign hues. Degenerate inputs are fine: an
    /// empty set yields an empty palette, identical keys a single bucket.
    pub fn build(keys: &[f64], opts: &PaletteOptions) -> Self {
        let mut sorted: Vec<f64> = keys.iter().copied().filter(|k| k.is_finite()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let range = sorted[sorted.len() - 1] - sorted[0];
        let tol = opts.abs_tol.max(opts.rel_tol * range);

        // Greedy gap clustering over the sorted keys.
        let mut intervals: Vec<(f64, f64, usize)> = Vec::new();
        let mut lo = sorted[0];
        let mut hi = sorted[0];
        let mut count = 1usize;
        for &k in &sorted[1..] {
            if k - hi > tol {
                intervals.push((lo, hi, count));
                lo = k;
                count = 0;
            }
            hi = k;
            count += 1;
        }
        intervals.push((lo, hi, count));

        // A lone key far from every other bucket is an outlier.
        let outlier_dist = opts.outlier_factor * tol;
        let is_outlier: Vec<bool> = intervals
            .iter()
            .enumerate()
            .map(|(i, &(lo, hi, count))| {
                if count != 1 || intervals.len() == 1 {
                    return false;
                }
                let center = (lo + hi) / 2.0;
                let nearest = intervals
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, &(olo, ohi, _))| {
                        let oc = (olo + ohi) / 2.0;
                        (center - oc).abs()
                    })
                    .fold(f64::INFINITY, f64::min);
                nearest > outlier_dist
            })
            .collect();

        let n_common = is_outlier.iter().filter(|o| !**o).count();
        let n_outlier = intervals.len() - n_common;

        let mut buckets = Vec::with_capacity(intervals.len());
        let mut common_idx = 0usize;
        let mut outlier_idx = 0usize;
        for (&(lo, hi, _), &outlier) in intervals.iter().zip(&is_outlier) {
            let hue = if outlier {
                let h =
                    OUTLIER_HUE_MIN + OUTLIER_HUE_SPAN * outlier_idx as f64 / n_outlier as f64;
                outlier_idx += 1;
                h
            } else {
                let h = if n_common <= 1 {
                    COMMON_HUE_MIN
                } else {
                    COMMON_HUE_MIN
                        + (COMMON_HUE_MAX - COMMON_HUE_MIN) * common_idx as f64
                            / (n_common - 1) as f64
                };
                common_idx += 1;
                h
            };
            buckets.push(Bucket {
                lo,
                hi,
                hue,
                color: hsv_to_rgb(hue, SATURATION, VALUE),
                outlier,
            });
        }

        Self { buckets }
    }

    /// Color for a slope key: its containing bucket, or the nearest one.
    pub fn color_for(&self, key: f64) -> Rgb {
        match self.bucket_for(key) {
            Some(b) => b.color,
            None => hsv_to_rgb(COMMON_HUE_MIN, SATURATION, VALUE),
        }
    }

    pub fn bucket_for(&self, key: f64) -> Option<&Bucket> {
        self.buckets
            .iter()
            .find(|b| key >= b.lo && key <= b.hi)
            .or_else(|| {
                self.buckets.iter().min_by(|a, b| {
                    (a.center() - key)
                        .abs()
                        .total_cmp(&(b.center() - key).abs())
                })
            })
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl fmt::Display for SlopePalette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bucket(s)", self.buckets.len())
    }
}

/// Circular distance between two hues, in degrees.
pub fn hue_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(keys: &[f64]) -> SlopePalette {
        SlopePalette::build(keys, &PaletteOptions::default())
    }

    #[test]
    fn test_empty_input() {
        let p = build(&[]);
        assert!(p.is_empty());
    }

    #[test]
    fn test_all_identical_single_bucket() {
        let p = build(&[2.5, 2.5, 2.5, 2.5]);
        assert_eq!(p.len(), 1);
        let c = p.color_for(2.5);
        assert_eq!(p.color_for(2.5), c);
    }

    #[test]
    fn test_similar_slopes_share_color() {
        // Two tight groups far apart: tolerance = 5% of range
        let p = build(&[0.0, 0.01, 0.02, 10.0, 10.01]);
        assert_eq!(p.len(), 2);
        assert_eq!(p.color_for(0.0), p.color_for(0.02));
        assert_eq!(p.color_for(10.0), p.color_for(10.01));
        assert_ne!(p.color_for(0.0), p.color_for(10.0));
    }

    #[test]
    fn test_order_invariance() {
        let a = build(&[3.0, 1.0, 2.0, 1.0, 3.0]);
        let b = build(&[1.0, 1.0, 2.0, 3.0, 3.0]);
        for key in [1.0, 2.0, 3.0] {
            assert_eq!(a.color_for(key), b.color_for(key));
        }
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_outlier_gets_distant_hue() {
        // A dense cluster near zero plus one lone extreme value.
        let mut keys: Vec<f64> = (0..20).map(|i| i as f64 * 0.01).collect();
        keys.push(100.0);
        let p = build(&keys);

        let outliers: Vec<&Bucket> = p.buckets().iter().filter(|b| b.outlier).collect();
        assert_eq!(outliers.len(), 1);
        let outlier_hue = outliers[0].hue;
        for b in p.buckets().iter().filter(|b| !b.outlier) {
            assert!(
                hue_distance(outlier_hue, b.hue) >= 45.0 - 1e-9,
                "outlier hue {} too close to common hue {}",
                outlier_hue,
                b.hue
            );
        }
    }

    #[test]
    fn test_no_outlier_when_everything_is_close() {
        let keys: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let p = build(&keys);
        assert!(p.buckets().iter().all(|b| !b.outlier));
    }

    #[test]
    fn test_non_finite_keys_ignored() {
        let p = build(&[1.0, f64::NAN, 2.0, f64::INFINITY]);
        assert!(p.len() >= 1);
        assert!(p.buckets().iter().all(|b| b.lo.is_finite() && b.hi.is_finite()));
    }

    #[test]
    fn test_hue_distance_wraps() {
        assert!((hue_distance(350.0, 10.0) - 20.0).abs() < 1e-12);
        assert!((hue_distance(0.0, 240.0) - 120.0).abs() < 1e-12);
    }

    #[test]
    fn test_hsv_conversion_endpoints() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (255, 0, 0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), (0, 255, 0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), (0, 0, 255));
    }
}
