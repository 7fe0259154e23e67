use super::keypoint::PoseSnapshot;

/// Black-box pose inference.
///
/// `None` covers every "no usable pose this frame" case: nobody in view,
/// low confidence, inference failure or timeout.
pub trait PoseProvider {
    type Frame;

    fn detect(&mut self, frame: &Self::Frame) -> Option<PoseSnapshot>;
}
