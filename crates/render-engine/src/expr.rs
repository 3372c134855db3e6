//! ffmpeg expression generation for time-varying overlay parameters.

use reelcut_processing_core::animation::AnimationCurve;
use reelcut_project_model::overlay::DisplayWindow;

/// Build a piecewise-linear ffmpeg expression in `t` through `points`.
///
/// The value holds the first point's value before it and the last point's
/// value after it. Points closer than 0.1ms collapse into the later one.
pub fn build_piecewise_expr(mut points: Vec<(f64, f64)>) -> String {
    if points.is_empty() {
        return "0".to_string();
    }

    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut sanitized: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for (t, v) in points {
        if let Some((last_t, last_v)) = sanitized.last_mut() {
            if (t - *last_t).abs() < 1e-4 {
                *last_t = t;
                *last_v = v;
                continue;
            }
        }
        sanitized.push((t, v));
    }
    let points = sanitized;

    let first = points[0].1;
    if points.iter().all(|(_, v)| (v - first).abs() < 1e-9) {
        return format!("{first:.6}");
    }

    let (_, last_v) = points[points.len() - 1];
    let mut expr = format!("{last_v:.6}");
    for pair in points.windows(2).rev() {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        let interp = format!(
            "{v0:.6}+({delta:.6})*(t-{t0:.6})/{dur:.6}",
            delta = v1 - v0,
            dur = (t1 - t0).max(1e-4)
        );
        expr = format!("if(lt(t,{t1:.6}),{interp},{expr})");
    }

    let (t0, v0) = points[0];
    format!("if(lt(t,{t0:.6}),{v0:.6},{expr})")
}

/// `(x, y)` overlay expressions following `curve`.
pub fn curve_expressions(curve: &AnimationCurve) -> (String, String) {
    let keyframes = curve.keyframes();
    let xs = keyframes.iter().map(|(t, p)| (*t, p.x)).collect();
    let ys = keyframes.iter().map(|(t, p)| (*t, p.y)).collect();
    (build_piecewise_expr(xs), build_piecewise_expr(ys))
}

/// `enable` expression showing an item only during `window`.
pub fn enable_expr(window: &DisplayWindow) -> String {
    format!("between(t,{:.3},{:.3})", window.start, window.end)
}

/// Evaluate an expression from [`build_piecewise_expr`] at `t`.
///
/// Mirrors the generated expression so tests can check it against the
/// curve without running ffmpeg.
#[cfg(test)]
fn eval_piecewise(points: &[(f64, f64)], t: f64) -> f64 {
    let mut points = points.to_vec();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    if t < points[0].0 {
        return points[0].1;
    }
    for pair in points.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t < t1 {
            return v0 + (v1 - v0) * (t - t0) / (t1 - t0).max(1e-4);
        }
    }
    points[points.len() - 1].1
}
