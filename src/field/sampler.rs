use crate::field::coords::{CoordMap, CoordSystem};
use crate::lang::eval::CompiledExpr;
use num_complex::Complex64;

/// Grid geometry: an N×N lattice spanning `[-extent, extent]` in each
/// native coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub extent: f64,
    pub steps: usize,
}

impl GridSpec {
    pub fn new(extent: f64, steps: usize) -> Self {
        Self { extent, steps }
    }

    /// The i-th sample coordinate. A single-step grid collapses to zero.
    pub fn coord(&self, i: usize) -> f64 {
        if self.steps <= 1 {
            0.0
        } else {
            -self.extent + 2.0 * self.extent * i as f64 / (self.steps - 1) as f64
        }
    }

    /// Spacing between adjacent samples.
    pub fn step(&self) -> f64 {
        if self.steps <= 1 {
            0.0
        } else {
            2.0 * self.extent / (self.steps - 1) as f64
        }
    }

    pub fn point_count(&self) -> usize {
        self.steps * self.steps
    }
}

/// A slope value at one grid point. Complex only under the Complex system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slope {
    Real(f64),
    Complex(Complex64),
}

impl Slope {
    pub fn real(&self) -> f64 {
        match self {
            Slope::Real(v) => *v,
            Slope::Complex(w) => w.re,
        }
    }

    pub fn complex(&self) -> Complex64 {
        match self {
            Slope::Real(v) => Complex64::new(*v, 0.0),
            Slope::Complex(w) => *w,
        }
    }

    /// Scalar key used for color bucketing: the value itself, or the
    /// modulus for complex slopes (the argument already drives the
    /// segment's orientation).
    pub fn key(&self) -> f64 {
        match self {
            Slope::Real(v) => *v,
            Slope::Complex(w) => w.norm(),
        }
    }
}

/// Sampled slopes in row-major grid order. Points whose evaluation failed
/// are omitted, not zero-filled; `domain_errors` keeps the render's
/// diagnostics honest about how many were dropped.
#[derive(Debug, Clone)]
pub struct FieldSamples {
    pub samples: Vec<((f64, f64), Slope)>,
    pub domain_errors: usize,
}

/// Evaluate the compiled derivative over the native grid. Deterministic:
/// identical configuration always yields the identical sequence.
pub fn sample_field(expr: &CompiledExpr, map: &CoordMap) -> FieldSamples {
    let mut samples = Vec::with_capacity(map.spec.point_count());
    let mut domain_errors = 0usize;

    for point in map.grid() {
        match eval_at(expr, map.system, point) {
            Ok(slope) => samples.push((point, slope)),
            Err(_) => domain_errors += 1,
        }
    }

    FieldSamples {
        samples,
        domain_errors,
    }
}

fn eval_at(
    expr: &CompiledExpr,
    system: CoordSystem,
    (u, v): (f64, f64),
) -> Result<Slope, crate::lang::error::DomainError> {
    if system.is_complex() {
        let z = Complex64::new(u, v);
        let vars = [
            ("z", z),
            ("x", Complex64::new(u, 0.0)),
            ("y", Complex64::new(v, 0.0)),
        ];
        expr.eval_complex(&vars).map(Slope::Complex)
    } else {
        let vars: [(&str, f64); 3] = match system {
            CoordSystem::Polar | CoordSystem::LogPolar => [("r", u), ("theta", v), ("t", v)],
            _ => [("x", u), ("y", v), ("", 0.0)],
        };
        expr.eval_real(&vars).map(Slope::Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(src: &str, system: CoordSystem, extent: f64, steps: usize) -> FieldSamples {
        let expr = CompiledExpr::compile(src, system.variables()).unwrap();
        let map = CoordMap::new(system, GridSpec::new(extent, steps), 0.25);
        sample_field(&expr, &map)
    }

    #[test]
    fn test_full_grid_when_no_domain_errors() {
        let s = sample("x + y", CoordSystem::Cartesian, 5.0, 7);
        assert_eq!(s.samples.len(), 49);
        assert_eq!(s.domain_errors, 0);
    }

    #[test]
    fn test_singular_points_omitted() {
        // 9 steps over [-4, 4] puts a whole column at x = 0
        let s = sample("1/x", CoordSystem::Cartesian, 4.0, 9);
        assert_eq!(s.domain_errors, 9);
        assert_eq!(s.samples.len(), 81 - 9);
        // No NaN/Inf slipped through
        assert!(s.samples.iter().all(|(_, sl)| sl.real().is_finite()));
    }

    #[test]
    fn test_row_major_order_preserved_after_omission() {
        let s = sample("1/x", CoordSystem::Cartesian, 4.0, 9);
        // Surviving points keep ascending row-major ordering: compare by
        // (v, u) lexicographically.
        for pair in s.samples.windows(2) {
            let (a, _) = pair[0];
            let (b, _) = pair[1];
            assert!((a.1, a.0) < (b.1, b.0));
        }
    }

    #[test]
    fn test_determinism() {
        let a = sample("sin(x*y) + cos(x - y)", CoordSystem::Cartesian, 10.0, 12);
        let b = sample("sin(x*y) + cos(x - y)", CoordSystem::Cartesian, 10.0, 12);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.domain_errors, b.domain_errors);
    }

    #[test]
    fn test_polar_binds_r_theta() {
        let s = sample("r * theta", CoordSystem::Polar, 2.0, 3);
        assert_eq!(s.samples.len(), 9);
        // Grid point (u, v) = (2, 2) evaluates r*theta = 4
        let (_, slope) = s
            .samples
            .iter()
            .find(|((u, v), _)| *u == 2.0 && *v == 2.0)
            .unwrap();
        assert!((slope.real() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_complex_system_produces_complex_slopes() {
        let s = sample("z^2", CoordSystem::Complex, 1.0, 3);
        assert_eq!(s.samples.len(), 9);
        let (_, slope) = s
            .samples
            .iter()
            .find(|((u, v), _)| *u == 1.0 && *v == 1.0)
            .unwrap();
        let w = slope.complex();
        assert!(w.re.abs() < 1e-12);
        assert!((w.im - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_step_grid() {
        let s = sample("x", CoordSystem::Cartesian, 10.0, 1);
        assert_eq!(s.samples.len(), 1);
        assert_eq!(s.samples[0].0, (0.0, 0.0));
    }
}
