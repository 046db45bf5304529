use std::f64::consts::PI;

/// Cauchy (Lorentzian) peak used as the work-vs-log-period model:
/// `(1/pi) * width / ((x - location)^2 + width^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CauchyPeak {
    pub location: f64,
    pub width: f64,
}

impl CauchyPeak {
    pub fn new(location: f64, width: f64) -> Self {
        Self { location, width }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let offset = x - self.location;
        (1.0 / PI) * (self.width / (offset * offset + self.width * self.width))
    }

    /// Partial derivatives `(d/d location, d/d width)` at `x`.
    pub fn gradient(&self, x: f64) -> (f64, f64) {
        let offset = x - self.location;
        let denominator = offset * offset + self.width * self.width;
        let denominator_sq = denominator * denominator;

        let d_location = (1.0 / PI) * (2.0 * self.width * offset) / denominator_sq;
        let d_width = (1.0 / PI) * (offset * offset - self.width * self.width) / denominator_sq;
        (d_location, d_width)
    }
}
