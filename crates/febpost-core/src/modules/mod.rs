pub mod derive;
pub mod extract;
pub mod fit;
pub mod hysteresis;

mod traits;

pub use traits::ColumnDerivation;
