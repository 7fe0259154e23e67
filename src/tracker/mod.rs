pub mod one_euro;
pub mod smooth;

pub use one_euro::{LowPassFilter, OneEuroFilter};
pub use smooth::{LandmarkSmoother, SmoothOutput, SmoothedPose};
