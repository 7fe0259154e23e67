use crate::pose::KeypointIndex;

/// 骨格の接続定義 (開始キーポイント, 終了キーポイント)
///
/// 脚は描かない。ジャンプ・しゃがみ判定に使う上半身と腰のみ。
pub const SKELETON_CONNECTIONS: [(KeypointIndex, KeypointIndex); 10] = [
    (KeypointIndex::LeftEye, KeypointIndex::Nose),
    (KeypointIndex::Nose, KeypointIndex::RightEye),
    (KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder),
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftElbow),
    (KeypointIndex::LeftElbow, KeypointIndex::LeftWrist),
    (KeypointIndex::RightShoulder, KeypointIndex::RightElbow),
    (KeypointIndex::RightElbow, KeypointIndex::RightWrist),
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftHip),
    (KeypointIndex::RightShoulder, KeypointIndex::RightHip),
    (KeypointIndex::LeftHip, KeypointIndex::RightHip),
];

// 色は 0RGB

pub const BACKGROUND_COLOR: u32 = 0xF7F7F7;
pub const GROUND_COLOR: u32 = 0x535353;
pub const PLAYER_COLOR: u32 = 0x404040;
pub const CACTUS_COLOR: u32 = 0x2E7D32;
pub const PTERODACTYL_COLOR: u32 = 0x8D6E63;
/// キャリブレーション中の上部バー
pub const CALIBRATING_COLOR: u32 = 0xFFC107;
/// キーボード操作に切り替わっているときの上部バー
pub const FAULT_COLOR: u32 = 0xE53935;
/// プレイ中以外はプレイ領域を暗くする
pub const INACTIVE_TINT: u32 = 0xBDBDBD;

pub const INSET_BACKGROUND: u32 = 0x202020;
pub const KEYPOINT_COLOR: u32 = 0x00FF00;
pub const SKELETON_COLOR: u32 = 0xFFFF00;
pub const LOW_CONFIDENCE_COLOR: u32 = 0xFF0000;
