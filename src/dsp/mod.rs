pub mod filter;
pub mod peak;
pub mod spectrum;

pub use filter::{FilterConfig, FilterKind};
pub use peak::{extract_peak, Peak, PeakMode};
pub use spectrum::SpectrumAnalyzer;
