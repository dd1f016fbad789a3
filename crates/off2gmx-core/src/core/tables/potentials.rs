#[inline]
pub fn exp_decay(r: f64, a: f64, alpha: f64) -> (f64, f64) {
    let potential = a * (-alpha * r).exp();
    (potential, alpha * potential)
}

#[inline]
pub fn screened_dispersion(r: f64, p1: f64, p2: f64, p3: f64) -> (f64, f64) {
    let p2 = p2.abs();
    let denominator = r.powf(p2) + p3.powf(p2);
    let potential = p1 / denominator;
    let force_denominator = r * denominator * denominator;
    let force = if force_denominator != 0.0 {
        p1 * p2 * r.powf(p2) / force_denominator
    } else {
        0.0
    };
    (potential, force)
}

#[inline]
pub fn shifted_truncated(r: f64, p1: f64, p2: f64, p3: f64) -> (f64, f64) {
    let t = r.min(p3);
    let potential = p1 * (t.powf(-p2) - 1.0 / p3.powf(p2) + p2 * (t - p3) / p3.powf(p2 + 1.0));
    let force = -p1 * p2 * (-1.0 / t.powf(p2 + 1.0) + 1.0 / p3.powf(p2 + 1.0));
    (potential, force)
}

#[inline]
pub fn power_law(r: f64, p1: f64, p2: f64) -> (f64, f64) {
    (p1 * r.powf(p2), -p1 * p2 * r.powf(p2 - 1.0))
}

#[inline]
pub fn quartic_bond(r: f64, r0: f64, k2: f64, k3: f64, k4: f64) -> (f64, f64) {
    let dr = r - r0;
    let potential = k2 / 2.0 * dr.powi(2) + k3 / 3.0 * dr.powi(3) + k4 / 4.0 * dr.powi(4);
    let force = -(k2 * dr + k3 * dr.powi(2) + k4 * dr.powi(3));
    (potential, force)
}
