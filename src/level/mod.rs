// 레벨 감지 핵심 모듈
// 스윙 포인트 클러스터링, 강도 산정, 레벨 선택, 분석 오케스트레이션을 제공합니다.

pub mod analyzer;
pub mod cluster;
pub mod config;
pub mod selector;
pub mod strength;

pub use analyzer::{LevelAnalysis, LevelAnalyzer};
pub use cluster::{cluster_swing_points, effective_cluster_threshold};
pub use config::{
    DynamicClusterThresholdConfig, LevelConfig, LevelExhaustionConfig, OrderbookValidationConfig,
    TiebreakPreference, TimeWeightedStrengthConfig,
};
pub use selector::{Selection, asymmetric_max_distance, select_best, select_nearest};
pub use strength::{decay_days_for_interval, score_level};
