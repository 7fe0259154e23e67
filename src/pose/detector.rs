use anyhow::{Context, Result};
use ndarray::Array4;
use opencv::core::Mat;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

use super::keypoint::{Keypoint, KeypointIndex, PoseSnapshot};
use super::preprocess::{mirror, preprocess_for_movenet};
use super::provider::PoseProvider;

/// MoveNet を使用した姿勢検出器
pub struct PoseDetector {
    session: Session,
}

impl PoseDetector {
    /// ONNXモデルを読み込んで初期化
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())
            .with_context(|| format!("Failed to load ONNX model {}", model_path.as_ref().display()))?;

        Ok(Self { session })
    }

    /// 入力: [1, 192, 192, 3] の f32 テンソル
    pub fn detect(&mut self, input: Array4<f32>) -> Result<[Keypoint; KeypointIndex::COUNT]> {
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["serving_default_input_0" => input_tensor])
            .context("Inference failed")?;

        // [1, 1, 17, 3] (y, x, 信頼度)
        let output: ndarray::ArrayViewD<f32> = outputs["StatefulPartitionedCall_0"]
            .try_extract_array()
            .context("Failed to extract output tensor")?;

        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for (i, kp) in keypoints.iter_mut().enumerate() {
            let y = output[[0, 0, i, 0]];
            let x = output[[0, 0, i, 1]];
            let confidence = output[[0, 0, i, 2]];
            *kp = Keypoint::new(x, y, confidence);
        }

        Ok(keypoints)
    }
}

/// カメラフレーム → 時刻付きスナップショット（信頼度の低い検出は捨てる）
pub struct MoveNetProvider {
    detector: PoseDetector,
    clock: Instant,
    mirror: bool,
    min_confidence: f32,
}

impl MoveNetProvider {
    /// `clock` はゲームループの開始時刻。スナップショットの時刻はこれを基準にする
    pub fn new(detector: PoseDetector, clock: Instant, mirror: bool, min_confidence: f32) -> Self {
        Self {
            detector,
            clock,
            mirror,
            min_confidence,
        }
    }

    fn run(&mut self, frame: &Mat) -> Result<PoseSnapshot> {
        let timestamp = self.clock.elapsed();
        let input = if self.mirror {
            preprocess_for_movenet(&mirror(frame)?)?
        } else {
            preprocess_for_movenet(frame)?
        };
        let keypoints = self.detector.detect(input)?;
        Ok(PoseSnapshot::new(keypoints, timestamp))
    }
}

impl PoseProvider for MoveNetProvider {
    type Frame = Mat;

    fn detect(&mut self, frame: &Mat) -> Option<PoseSnapshot> {
        match self.run(frame) {
            Ok(snapshot) if snapshot.average_confidence() >= self.min_confidence => Some(snapshot),
            Ok(snapshot) => {
                debug!("pose dropped: mean confidence {:.2}", snapshot.average_confidence());
                None
            }
            Err(e) => {
                warn!("pose inference failed: {:#}", e);
                None
            }
        }
    }
}
