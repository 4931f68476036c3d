pub mod color;
pub mod coords;
pub mod sampler;

use crate::field::color::{PaletteOptions, Rgb, SlopePalette};
use crate::field::coords::{CoordMap, CoordSystem};
use crate::field::sampler::{sample_field, GridSpec};
use crate::lang::error::{ParseError, ParseResult};
use crate::lang::eval::CompiledExpr;

/// Knobs that shape the emitted segments but not the math.
#[derive(Debug, Clone, Copy)]
pub struct FieldOptions {
    /// Base segment length in screen units.
    pub segment_len: f64,
    pub palette: PaletteOptions,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            segment_len: 0.25,
            palette: PaletteOptions::default(),
        }
    }
}

/// One drawable segment with its bucket color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredSegment {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub color: Rgb,
}

/// Render diagnostics. Omitted points are counted, never silently lost,
/// so an empty render is distinguishable from an all-singular one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldStats {
    pub grid_points: usize,
    pub domain_errors: usize,
    pub transform_errors: usize,
}

impl FieldStats {
    pub fn omitted(&self) -> usize {
        self.domain_errors + self.transform_errors
    }
}

/// A fully computed slope field: the ordered segment sequence handed to
/// the drawing surface, plus the palette and counts behind it.
#[derive(Debug, Clone)]
pub struct Field {
    pub segments: Vec<ColoredSegment>,
    pub palette: SlopePalette,
    pub stats: FieldStats,
}

/// Run the whole pipeline: parse → sample → transform → color.
///
/// Parse failures abort before any sampling. Per-point domain and
/// transform failures drop that point and bump the matching counter, so
/// `segments.len() == grid_points - omitted()` always holds.
pub fn render_field(
    source: &str,
    system: CoordSystem,
    grid: GridSpec,
    opts: &FieldOptions,
) -> ParseResult<Field> {
    let expr = compile_for(source, system)?;
    let map = CoordMap::new(system, grid, opts.segment_len);

    let sampled = sample_field(&expr, &map);

    let mut placed = Vec::with_capacity(sampled.samples.len());
    let mut transform_errors = 0usize;
    for (point, slope) in &sampled.samples {
        match map.place(*point, slope) {
            Ok(segment) => placed.push((segment, slope.key())),
            Err(_) => transform_errors += 1,
        }
    }

    // First pass over every surviving slope, then color assignment; the
    // palette must see the full set before any segment is emitted.
    let keys: Vec<f64> = placed.iter().map(|(_, key)| *key).collect();
    let palette = SlopePalette::build(&keys, &opts.palette);

    let segments = placed
        .into_iter()
        .map(|(segment, key)| ColoredSegment {
            start: segment.start,
            end: segment.end,
            color: palette.color_for(key),
        })
        .collect();

    Ok(Field {
        segments,
        palette,
        stats: FieldStats {
            grid_points: grid.point_count(),
            domain_errors: sampled.domain_errors,
            transform_errors,
        },
    })
}

/// Compile an expression against the variable set of the chosen system.
pub fn compile_for(source: &str, system: CoordSystem) -> ParseResult<CompiledExpr> {
    if source.trim().is_empty() {
        return Err(ParseError::new("empty expression"));
    }
    CompiledExpr::compile(source, system.variables())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(src: &str, system: CoordSystem, extent: f64, steps: usize) -> Field {
        render_field(
            src,
            system,
            GridSpec::new(extent, steps),
            &FieldOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_segment_count_invariant() {
        for system in [
            CoordSystem::Cartesian,
            CoordSystem::Polar,
            CoordSystem::LogPolar,
            CoordSystem::LogLog,
            CoordSystem::Hexagonal,
        ] {
            let src = match system {
                CoordSystem::Polar | CoordSystem::LogPolar => "r + theta",
                _ => "x + y",
            };
            let field = render(src, system, 6.0, 9);
            assert_eq!(
                field.segments.len(),
                field.stats.grid_points - field.stats.omitted(),
                "invariant broken for {}",
                system
            );
        }
    }

    #[test]
    fn test_log_log_drops_non_positive_quadrants() {
        // 9×9 over [-4, 4]: only the strictly positive quadrant survives,
        // 4×4 points (zero row/column excluded).
        let field = render("x*y", CoordSystem::LogLog, 4.0, 9);
        assert_eq!(field.stats.transform_errors, 81 - 16);
        assert_eq!(field.segments.len(), 16);
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let err = render_field(
            "2*(x + ",
            CoordSystem::Cartesian,
            GridSpec::new(1.0, 3),
            &FieldOptions::default(),
        )
        .unwrap_err();
        assert!(err.message.contains("unbalanced") || err.message.contains("expected"));
    }

    #[test]
    fn test_variable_mismatch_is_fatal() {
        // Polar systems take r/theta, not x/y
        let err = render_field(
            "x + y",
            CoordSystem::Polar,
            GridSpec::new(1.0, 3),
            &FieldOptions::default(),
        )
        .unwrap_err();
        assert!(err.message.contains("unknown variable"));
    }

    #[test]
    fn test_cartesian_vs_polar_same_slope_values() {
        // Placement changes, the sampled slope values do not.
        let grid = GridSpec::new(3.0, 5);
        let cart = CompiledExpr::compile("x + y", CoordSystem::Cartesian.variables()).unwrap();
        let polar = CompiledExpr::compile("r + theta", CoordSystem::Polar.variables()).unwrap();

        let cart_map = CoordMap::new(CoordSystem::Cartesian, grid, 0.25);
        let polar_map = CoordMap::new(CoordSystem::Polar, grid, 0.25);
        let a = sample_field(&cart, &cart_map);
        let b = sample_field(&polar, &polar_map);

        assert_eq!(a.samples.len(), b.samples.len());
        for ((pa, sa), (pb, sb)) in a.samples.iter().zip(b.samples.iter()) {
            assert_eq!(pa, pb);
            assert!((sa.real() - sb.real()).abs() < 1e-12);
        }

        // But the placed segments differ away from θ = 0
        let field_a = render("x + y", CoordSystem::Cartesian, 3.0, 5);
        let field_b = render("r + theta", CoordSystem::Polar, 3.0, 5);
        assert_ne!(
            field_a.segments.iter().map(|s| s.start).collect::<Vec<_>>(),
            field_b.segments.iter().map(|s| s.start).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_render_determinism() {
        let a = render("sin(x*y)", CoordSystem::Cartesian, 10.0, 15);
        let b = render("sin(x*y)", CoordSystem::Cartesian, 10.0, 15);
        assert_eq!(a.segments, b.segments);
    }

    #[test]
    fn test_all_singular_render_is_not_empty_render() {
        // ln(x) with the grid confined to x ≤ 0 fails everywhere, which
        // must be visible in the stats.
        let field = render("ln(x - 20)", CoordSystem::Cartesian, 4.0, 5);
        assert!(field.segments.is_empty());
        assert_eq!(field.stats.domain_errors, 25);
        assert!(field.palette.is_empty());
    }

    #[test]
    fn test_complex_render() {
        let field = render("z^2 + 1", CoordSystem::Complex, 2.0, 7);
        assert_eq!(
            field.segments.len(),
            field.stats.grid_points - field.stats.omitted()
        );
        assert!(field.stats.domain_errors == 0);
    }
}
