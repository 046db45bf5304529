pub mod integration;
pub mod least_squares;
pub mod peak;
pub mod scale;

pub use integration::{IntegrationError, trapezoid_increments};
pub use least_squares::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, PeakFit, PeakFitError, PeakFitInput,
    fit_cauchy_peak,
};
pub use peak::CauchyPeak;
pub use scale::{DEFAULT_LOG_BASE, lin_to_log, log_to_lin};
