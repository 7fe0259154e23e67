use std::time::Duration;

/// MoveNet の 17 キーポイントインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;
}

/// 正規化画像座標のキーポイント（yは下向きに増加）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// 信頼度が閾値以上か
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }

    /// ピクセル座標に変換
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        let px = (self.x * width as f32) as i32;
        let py = (self.y * height as f32) as i32;
        (px, py)
    }
}

/// 1フレーム分の検出結果: 17キーポイントと取得時刻
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSnapshot {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
    /// ゲームループ開始からの単調増加時刻
    pub timestamp: Duration,
}

impl PoseSnapshot {
    pub fn new(keypoints: [Keypoint; KeypointIndex::COUNT], timestamp: Duration) -> Self {
        Self { keypoints, timestamp }
    }

    /// インデックスでキーポイントを取得
    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    /// 左右ペアの縦方向中点（両方が閾値以上のときのみ）
    pub fn mid_y(&self, a: KeypointIndex, b: KeypointIndex, threshold: f32) -> Option<f32> {
        let (ka, kb) = (self.get(a), self.get(b));
        if ka.is_valid(threshold) && kb.is_valid(threshold) {
            Some((ka.y + kb.y) / 2.0)
        } else {
            None
        }
    }

    /// 全キーポイントの平均信頼度
    pub fn average_confidence(&self) -> f32 {
        let sum: f32 = self.keypoints.iter().map(|k| k.confidence).sum();
        sum / KeypointIndex::COUNT as f32
    }
}

impl Default for PoseSnapshot {
    fn default() -> Self {
        Self {
            keypoints: [Keypoint::default(); KeypointIndex::COUNT],
            timestamp: Duration::ZERO,
        }
    }
}
