//! Curve-over-life evaluation: normalized lifetime → scalar or color
//!
//! Control points are sorted once on mutation, never per query. A
//! missing or degenerate curve must never crash a running simulation,
//! so evaluation fails closed to a neutral default (identity scale for
//! size, opaque white for color).

use ember_core::Color;
use serde::{Deserialize, Serialize};

/// One control point of a scalar curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub t: f32,
    pub value: f32,
}

/// One stop of a color curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub t: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Piecewise-linear (optionally smoothstepped) scalar-over-life curve
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarCurve {
    points: Vec<CurvePoint>,
    #[serde(default)]
    smoothstep: bool,
}

impl ScalarCurve {
    /// Build a curve from control points. Non-finite entries are
    /// dropped, `t` values are clamped to [0, 1] and the list is sorted.
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self::with_smoothstep(points, false)
    }

    pub fn with_smoothstep(points: Vec<CurvePoint>, smoothstep: bool) -> Self {
        let mut points: Vec<CurvePoint> = points
            .into_iter()
            .filter(|p| p.t.is_finite() && p.value.is_finite())
            .map(|p| CurvePoint {
                t: p.t.clamp(0.0, 1.0),
                value: p.value,
            })
            .collect();
        points.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { points, smoothstep }
    }

    /// Re-derive the curve from its own stored points (after deserialization)
    pub fn rebuilt(self) -> Self {
        Self::with_smoothstep(self.points, self.smoothstep)
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluate at normalized lifetime `t`, clamped to [0, 1].
    ///
    /// Clamp-to-edge outside the point range; 1.0 for an empty curve.
    pub fn evaluate(&self, t: f32) -> f32 {
        let Some(first) = self.points.first() else {
            return 1.0;
        };
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        if t <= first.t {
            return first.value;
        }
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.t {
                let span = b.t - a.t;
                if span <= 0.0 {
                    return a.value;
                }
                let mut u = (t - a.t) / span;
                if self.smoothstep {
                    u = u * u * (3.0 - 2.0 * u);
                }
                return a.value + (b.value - a.value) * u;
            }
        }
        // Past the last point: clamp, never extrapolate
        self.points[self.points.len() - 1].value
    }
}

/// Color-over-life stop list; channels interpolate independently
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorCurve {
    stops: Vec<ColorStop>,
}

impl ColorCurve {
    /// Build a curve from stops, dropping non-finite entries, clamping
    /// `t` to [0, 1] and sorting.
    pub fn new(stops: Vec<ColorStop>) -> Self {
        let mut stops: Vec<ColorStop> = stops
            .into_iter()
            .filter(|s| {
                s.t.is_finite()
                    && s.r.is_finite()
                    && s.g.is_finite()
                    && s.b.is_finite()
                    && s.a.is_finite()
            })
            .map(|s| ColorStop {
                t: s.t.clamp(0.0, 1.0),
                ..s
            })
            .collect();
        stops.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { stops }
    }

    /// Re-derive the curve from its own stored stops (after deserialization)
    pub fn rebuilt(self) -> Self {
        Self::new(self.stops)
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Evaluate at normalized lifetime `t`, clamped to [0, 1].
    ///
    /// Opaque white for an empty stop list.
    pub fn evaluate(&self, t: f32) -> Color {
        let Some(first) = self.stops.first() else {
            return Color::WHITE;
        };
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        if t <= first.t {
            return Color::new(first.r, first.g, first.b, first.a);
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.t {
                let span = b.t - a.t;
                if span <= 0.0 {
                    return Color::new(a.r, a.g, a.b, a.a);
                }
                let u = (t - a.t) / span;
                return Color::new(
                    a.r + (b.r - a.r) * u,
                    a.g + (b.g - a.g) * u,
                    a.b + (b.b - a.b) * u,
                    a.a + (b.a - a.a) * u,
                );
            }
        }
        let last = self.stops[self.stops.len() - 1];
        Color::new(last.r, last.g, last.b, last.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> ScalarCurve {
        ScalarCurve::new(vec![
            CurvePoint { t: 0.0, value: 0.0 },
            CurvePoint { t: 0.5, value: 2.0 },
            CurvePoint { t: 1.0, value: 1.0 },
        ])
    }

    #[test]
    fn scalar_boundaries_match_endpoints() {
        let curve = ramp();
        assert!((curve.evaluate(0.0) - 0.0).abs() < 1e-6);
        assert!((curve.evaluate(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scalar_interpolates_between_points() {
        let curve = ramp();
        assert!((curve.evaluate(0.25) - 1.0).abs() < 1e-6);
        assert!((curve.evaluate(0.75) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn scalar_interpolation_is_monotonic_per_segment() {
        let curve = ramp();
        let mut prev = curve.evaluate(0.0);
        for i in 1..=50 {
            let v = curve.evaluate(i as f32 * 0.01); // within [0, 0.5]
            assert!(v >= prev - 1e-6);
            prev = v;
        }
    }

    #[test]
    fn scalar_clamps_out_of_range_input() {
        let curve = ramp();
        assert_eq!(curve.evaluate(-5.0), curve.evaluate(0.0));
        assert_eq!(curve.evaluate(5.0), curve.evaluate(1.0));
    }

    #[test]
    fn empty_scalar_curve_is_identity() {
        let curve = ScalarCurve::new(vec![]);
        assert_eq!(curve.evaluate(0.5), 1.0);
    }

    #[test]
    fn unsorted_points_are_sorted_on_construction() {
        let curve = ScalarCurve::new(vec![
            CurvePoint { t: 1.0, value: 10.0 },
            CurvePoint { t: 0.0, value: 0.0 },
        ]);
        assert!((curve.evaluate(0.5) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_matches_endpoints_and_eases_midpoint() {
        let curve = ScalarCurve::with_smoothstep(
            vec![
                CurvePoint { t: 0.0, value: 0.0 },
                CurvePoint { t: 1.0, value: 1.0 },
            ],
            true,
        );
        assert!((curve.evaluate(0.0) - 0.0).abs() < 1e-6);
        assert!((curve.evaluate(1.0) - 1.0).abs() < 1e-6);
        // smoothstep(0.5) == 0.5 but smoothstep(0.25) < 0.25
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!(curve.evaluate(0.25) < 0.25);
    }

    #[test]
    fn empty_color_curve_is_opaque_white() {
        let curve = ColorCurve::new(vec![]);
        assert_eq!(curve.evaluate(0.3), Color::WHITE);
    }

    #[test]
    fn color_channels_interpolate_independently() {
        let curve = ColorCurve::new(vec![
            ColorStop { t: 0.0, r: 1.0, g: 0.0, b: 0.0, a: 1.0 },
            ColorStop { t: 1.0, r: 0.0, g: 1.0, b: 0.0, a: 0.0 },
        ]);
        let mid = curve.evaluate(0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.g - 0.5).abs() < 1e-6);
        assert!((mid.b - 0.0).abs() < 1e-6);
        assert!((mid.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn color_past_last_stop_clamps() {
        let curve = ColorCurve::new(vec![ColorStop {
            t: 0.5,
            r: 0.2,
            g: 0.4,
            b: 0.6,
            a: 0.8,
        }]);
        let c = curve.evaluate(1.0);
        assert!((c.r - 0.2).abs() < 1e-6);
        assert!((c.a - 0.8).abs() < 1e-6);
    }
}
