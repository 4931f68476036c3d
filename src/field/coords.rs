use crate::field::sampler::{GridSpec, Slope};
use std::fmt;

/// The six supported coordinate systems. Chosen once per render; decides
/// both the grid's native variables and the segment-placement transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CoordSystem {
    Cartesian,
    Polar,
    LogPolar,
    LogLog,
    Hexagonal,
    Complex,
}

impl CoordSystem {
    /// Free variables the expression may use under this system.
    pub fn variables(&self) -> &'static [&'static str] {
        match self {
            CoordSystem::Cartesian | CoordSystem::LogLog | CoordSystem::Hexagonal => &["x", "y"],
            CoordSystem::Polar | CoordSystem::LogPolar => &["r", "theta", "t"],
            CoordSystem::Complex => &["z", "x", "y", "i"],
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, CoordSystem::Complex)
    }
}

impl fmt::Display for CoordSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordSystem::Cartesian => "cartesian",
            CoordSystem::Polar => "polar",
            CoordSystem::LogPolar => "log-polar",
            CoordSystem::LogLog => "log-log",
            CoordSystem::Hexagonal => "hexagonal",
            CoordSystem::Complex => "complex",
        };
        write!(f, "{}", name)
    }
}

/// Point outside the domain of the chosen transform. Recovered by
/// omitting the segment, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    NonPositiveRadius,
    NonPositiveCoordinate,
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::NonPositiveRadius => write!(f, "log of non-positive radius"),
            TransformError::NonPositiveCoordinate => {
                write!(f, "log of non-positive coordinate")
            }
        }
    }
}

impl std::error::Error for TransformError {}

/// A short screen-space line segment, centered on a transformed grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: (f64, f64),
    pub end: (f64, f64),
}

/// Pure transform pair for one render: `grid()` yields the native sample
/// points, `place()` maps a `(point, slope)` pair to a screen segment.
#[derive(Debug, Clone, Copy)]
pub struct CoordMap {
    pub system: CoordSystem,
    pub spec: GridSpec,
    /// Base segment length in screen units.
    pub segment_len: f64,
}

impl CoordMap {
    pub fn new(system: CoordSystem, spec: GridSpec, segment_len: f64) -> Self {
        Self {
            system,
            spec,
            segment_len,
        }
    }

    /// Native grid points in row-major order (second coordinate is the row).
    pub fn grid(&self) -> Vec<(f64, f64)> {
        let n = self.spec.steps;
        let mut points = Vec::with_capacity(n * n);
        for j in 0..n {
            let v = self.spec.coord(j);
            for i in 0..n {
                points.push((self.spec.coord(i), v));
            }
        }
        points
    }

    /// Place the segment for one sampled slope. The screen angle encodes
    /// the slope; log scales and lattice re-seating move the center.
    pub fn place(&self, point: (f64, f64), slope: &Slope) -> Result<Segment, TransformError> {
        let half = self.segment_len / 2.0;
        let (u, v) = point;

        match self.system {
            CoordSystem::Cartesian => {
                let angle = slope.real().atan();
                Ok(segment_at((u, v), angle, half))
            }
            CoordSystem::Polar => {
                // The polar basis at (r, θ) is the Cartesian basis rotated
                // by θ, so the slope angle rotates with it.
                let (r, theta) = (u, v);
                let center = (r * theta.cos(), r * theta.sin());
                let angle = slope.real().atan() + theta;
                Ok(segment_at(center, angle, half))
            }
            CoordSystem::LogPolar => {
                let (r, theta) = (u, v);
                if r <= 0.0 {
                    return Err(TransformError::NonPositiveRadius);
                }
                let rho = r.ln();
                let center = (rho * theta.cos(), rho * theta.sin());
                let angle = slope.real().atan() + theta;
                Ok(segment_at(center, angle, half))
            }
            CoordSystem::LogLog => {
                if u <= 0.0 || v <= 0.0 {
                    return Err(TransformError::NonPositiveCoordinate);
                }
                let angle = slope.real().atan();
                Ok(segment_at((u.ln(), v.ln()), angle, half))
            }
            CoordSystem::Hexagonal => {
                let center = self.hex_reseat(u, v);
                let angle = slope.real().atan();
                Ok(segment_at(center, angle, half))
            }
            CoordSystem::Complex => {
                let w = slope.complex();
                let angle = w.arg();
                // Length scales with the modulus, bounded so large slopes
                // cannot overlap their neighbors.
                let modulus = w.norm();
                let scaled = half * (modulus / (1.0 + modulus));
                Ok(segment_at((u, v), angle, scaled))
            }
        }
    }

    /// Re-seat a grid point onto an offset-row hexagonal lattice: odd rows
    /// shift half a column step, rows compress by sqrt(3)/2.
    fn hex_reseat(&self, u: f64, v: f64) -> (f64, f64) {
        let step = self.spec.step();
        let row = if step > 0.0 {
            ((v + self.spec.extent) / step).round() as i64
        } else {
            0
        };
        let offset = if row % 2 != 0 { step / 2.0 } else { 0.0 };
        (u + offset, v * 3f64.sqrt() / 2.0)
    }
}

fn segment_at(center: (f64, f64), angle: f64, half: f64) -> Segment {
    let (dx, dy) = (half * angle.cos(), half * angle.sin());
    Segment {
        start: (center.0 - dx, center.1 - dy),
        end: (center.0 + dx, center.1 + dy),
    }
}
