use crate::config_loader::{ConfigError, ConfigResult, ConfigValidation};
use serde::{Deserialize, Serialize};

/// 동률 해소 정책
///
/// 지지/저항 점수가 사실상 동률일 때 방향을 결정하는 규칙입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakPreference {
    /// 롱 우선
    Long,
    /// 숏 우선
    Short,
    /// 더 가까운 레벨 우선 (기본값)
    #[default]
    Nearest,
    /// 원시 강도가 더 높은 레벨 우선
    Strongest,
}

/// 변동성 적응 클러스터 임계값 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicClusterThresholdConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// ATR 비율에 곱할 계수
    pub atr_multiplier: f64,
}

impl Default for DynamicClusterThresholdConfig {
    fn default() -> Self {
        DynamicClusterThresholdConfig {
            enabled: false,
            atr_multiplier: 0.5,
        }
    }
}

/// 시간 가중 강도 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWeightedStrengthConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 최근 터치 비율에 적용할 보너스(%)
    pub recent_touch_bonus_percent: f64,
    /// 최근으로 간주할 기간(시간)
    pub recent_period_hours: f64,
}

impl Default for TimeWeightedStrengthConfig {
    fn default() -> Self {
        TimeWeightedStrengthConfig {
            enabled: false,
            recent_touch_bonus_percent: 20.0,
            recent_period_hours: 24.0,
        }
    }
}

/// 레벨 소진 설정
///
/// 가격이 레벨을 반복적으로 종가 돌파한 경우 강도를 감쇄합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelExhaustionConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 돌파 1회당 페널티
    pub penalty_per_breakout: f64,
    /// 페널티 상한
    pub max_penalty: f64,
    /// 돌파로 인정할 종가 이탈 비율(%)
    pub breakout_threshold_percent: f64,
    /// 검사할 최근 캔들 수
    pub lookback_candles: usize,
}

impl Default for LevelExhaustionConfig {
    fn default() -> Self {
        LevelExhaustionConfig {
            enabled: false,
            penalty_per_breakout: 0.15,
            max_penalty: 0.6,
            breakout_threshold_percent: 0.3,
            lookback_candles: 50,
        }
    }
}

/// 오더북 확인 설정
///
/// 레벨과 같은 방향의 대형 잔량 벽을 추가 증거로 반영합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderbookValidationConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 벽으로 인정할 사이드 총 잔량 대비 최소 비율(%)
    pub min_wall_percent: f64,
    /// 확인된 레벨에 더할 강도 부스트
    pub strength_boost: f64,
    /// 레벨과 벽 사이 허용 거리(%)
    pub max_distance_percent: f64,
    /// 확인되지 않은 레벨을 제외할지 여부
    pub require_confirmation: bool,
}

impl Default for OrderbookValidationConfig {
    fn default() -> Self {
        OrderbookValidationConfig {
            enabled: false,
            min_wall_percent: 5.0,
            strength_boost: 0.15,
            max_distance_percent: 0.3,
            require_confirmation: false,
        }
    }
}

/// 레벨 분석기 설정
///
/// 모든 필드는 serde 기본값을 가지므로 부분 설정 파일로도 로드됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// 클러스터 근접 임계값(%)
    pub cluster_threshold_percent: f64,
    /// 유효 레벨로 인정할 최소 터치 수
    pub min_touches_required: usize,
    /// 터치 요인이 포화되는 터치 수
    pub min_touches_for_strong: usize,
    /// 진입 후보로 인정할 최대 거리(%)
    pub max_distance_percent: f64,
    /// 매우 가까운 거리로 간주할 기준(%)
    pub very_close_distance_percent: f64,
    /// 최근성 감쇄 기간(일)
    pub recency_decay_days: f64,
    /// 거래량 요인이 포화되는 평균 대비 배율
    pub volume_boost_threshold: f64,
    /// 신뢰도 기본값
    pub base_confidence: f64,
    /// 신뢰도 상한
    pub max_confidence: f64,
    /// 동률 해소 정책
    pub tiebreak_preference: TiebreakPreference,
    /// 변동성 적응 클러스터 임계값
    pub dynamic_cluster_threshold: DynamicClusterThresholdConfig,
    /// 시간 가중 강도
    pub time_weighted_strength: TimeWeightedStrengthConfig,
    /// 레벨 유효 수명(캔들 수, 0이면 수명 필터 비활성)
    pub max_level_age_candles: usize,
    /// 캔들 간격(분)
    pub candle_interval_minutes: u32,
    /// 추세 정렬 레벨의 거리 허용 배수
    pub trend_aligned_distance_multiplier: f64,
    /// 레벨 소진
    pub level_exhaustion: LevelExhaustionConfig,
    /// 오더북 확인
    pub orderbook_validation: OrderbookValidationConfig,
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            cluster_threshold_percent: 0.5,
            min_touches_required: 2,
            min_touches_for_strong: 5,
            max_distance_percent: 3.0,
            very_close_distance_percent: 0.5,
            recency_decay_days: 7.0,
            volume_boost_threshold: 1.5,
            base_confidence: 50.0,
            max_confidence: 90.0,
            tiebreak_preference: TiebreakPreference::Nearest,
            dynamic_cluster_threshold: DynamicClusterThresholdConfig::default(),
            time_weighted_strength: TimeWeightedStrengthConfig::default(),
            max_level_age_candles: 0,
            candle_interval_minutes: 15,
            trend_aligned_distance_multiplier: 1.5,
            level_exhaustion: LevelExhaustionConfig::default(),
            orderbook_validation: OrderbookValidationConfig::default(),
        }
    }
}

impl LevelConfig {
    /// 클러스터 임계값을 비율로 반환 (0.5% -> 0.005)
    pub fn cluster_threshold_ratio(&self) -> f64 {
        self.cluster_threshold_percent / 100.0
    }
}

impl ConfigValidation for LevelConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.cluster_threshold_percent <= 0.0 {
            return Err(ConfigError::ValidationError(
                "cluster_threshold_percent는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.min_touches_for_strong == 0 {
            return Err(ConfigError::ValidationError(
                "min_touches_for_strong은 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.max_distance_percent <= 0.0 {
            return Err(ConfigError::ValidationError(
                "max_distance_percent는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.very_close_distance_percent < 0.0
            || self.very_close_distance_percent > self.max_distance_percent
        {
            return Err(ConfigError::ValidationError(
                "very_close_distance_percent는 [0, max_distance_percent] 범위여야 합니다"
                    .to_string(),
            ));
        }
        if self.recency_decay_days <= 0.0 {
            return Err(ConfigError::ValidationError(
                "recency_decay_days는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.volume_boost_threshold <= 0.0 {
            return Err(ConfigError::ValidationError(
                "volume_boost_threshold는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.base_confidence < 0.0 || self.base_confidence > self.max_confidence {
            return Err(ConfigError::ValidationError(
                "base_confidence는 [0, max_confidence] 범위여야 합니다".to_string(),
            ));
        }
        if self.max_confidence > 100.0 {
            return Err(ConfigError::ValidationError(
                "max_confidence는 100 이하여야 합니다".to_string(),
            ));
        }
        if self.trend_aligned_distance_multiplier < 1.0 {
            return Err(ConfigError::ValidationError(
                "trend_aligned_distance_multiplier는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.dynamic_cluster_threshold.atr_multiplier < 0.0 {
            return Err(ConfigError::ValidationError(
                "dynamic_cluster_threshold.atr_multiplier는 0 이상이어야 합니다".to_string(),
            ));
        }
        if self.time_weighted_strength.recent_touch_bonus_percent < 0.0
            || self.time_weighted_strength.recent_period_hours <= 0.0
        {
            return Err(ConfigError::ValidationError(
                "time_weighted_strength 설정이 유효 범위를 벗어났습니다".to_string(),
            ));
        }
        let exhaustion = &self.level_exhaustion;
        if !(0.0..=1.0).contains(&exhaustion.penalty_per_breakout)
            || !(0.0..=1.0).contains(&exhaustion.max_penalty)
            || exhaustion.breakout_threshold_percent < 0.0
        {
            return Err(ConfigError::ValidationError(
                "level_exhaustion 설정이 유효 범위를 벗어났습니다".to_string(),
            ));
        }
        let orderbook = &self.orderbook_validation;
        if orderbook.min_wall_percent < 0.0
            || orderbook.min_wall_percent > 100.0
            || !(0.0..=1.0).contains(&orderbook.strength_boost)
            || orderbook.max_distance_percent < 0.0
        {
            return Err(ConfigError::ValidationError(
                "orderbook_validation 설정이 유효 범위를 벗어났습니다".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_default_config_is_valid() {
        assert!(LevelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            cluster_threshold_percent = 0.8
            tiebreak_preference = "strongest"

            [level_exhaustion]
            enabled = true
        "#;
        let config =
            ConfigLoader::load_from_string::<LevelConfig>(toml_str, ConfigFormat::Toml).unwrap();
        assert_eq!(config.cluster_threshold_percent, 0.8);
        assert_eq!(config.tiebreak_preference, TiebreakPreference::Strongest);
        assert!(config.level_exhaustion.enabled);
        // 나머지는 기본값 유지
        assert_eq!(config.level_exhaustion.penalty_per_breakout, 0.15);
        assert_eq!(config.min_touches_required, 2);
    }

    #[test]
    fn test_invalid_confidence_range_rejected() {
        let mut config = LevelConfig::default();
        config.base_confidence = 95.0;
        config.max_confidence = 90.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_exhaustion_penalty_rejected() {
        let mut config = LevelConfig::default();
        config.level_exhaustion.penalty_per_breakout = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_ratio_conversion() {
        let config = LevelConfig::default();
        assert!((config.cluster_threshold_ratio() - 0.005).abs() < 1e-12);
    }
}
