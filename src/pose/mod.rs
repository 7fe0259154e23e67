#[cfg(feature = "desktop")]
pub mod detector;
pub mod keypoint;
pub mod latest;
#[cfg(feature = "desktop")]
pub mod preprocess;
pub mod provider;

#[cfg(feature = "desktop")]
pub use detector::{MoveNetProvider, PoseDetector};
pub use keypoint::{Keypoint, KeypointIndex, PoseSnapshot};
pub use latest::LatestPose;
#[cfg(feature = "desktop")]
pub use preprocess::{mirror, preprocess_for_movenet};
pub use provider::PoseProvider;
