use crate::level::config::LevelConfig;
use chrono::{DateTime, Utc};

/// 터치 요인 가중치
const TOUCH_WEIGHT: f64 = 0.5;
/// 최근성 요인 가중치
const RECENCY_WEIGHT: f64 = 0.3;
/// 거래량 요인 가중치
const VOLUME_WEIGHT: f64 = 0.2;

/// 캔들 간격에 따른 최근성 감쇄 기간(일) 반환
///
/// 짧은 간격일수록 레벨이 빨리 낡습니다: 1분봉 2일, 5분봉 3일,
/// 15분봉 5일, 그 외에는 설정된 기본 감쇄 기간을 사용합니다.
pub fn decay_days_for_interval(interval_minutes: u32, fallback_days: f64) -> f64 {
    match interval_minutes {
        1 => 2.0,
        5 => 3.0,
        15 => 5.0,
        _ => fallback_days,
    }
}

/// 레벨 강도 산정
///
/// 세 가지 독립 요인의 가중 합으로 [0, 1] 강도를 계산하는 순수 함수입니다.
/// 각 요인은 가중치를 곱하기 전에 1.0으로 캡됩니다.
///
/// * 터치 요인: `min(touches / min_touches_for_strong, 1) × 0.5`
/// * 최근성 요인: `max(0, 1 − 경과일 / 감쇄일) × 0.3`
/// * 거래량 요인: `min((터치 평균 거래량 / 전체 평균 거래량) / volume_boost_threshold, 1) × 0.2`
///   - 두 거래량이 모두 주어진 경우에만 기여하며, 없으면 0 (오류 아님)
///
/// 시간 가중이 활성화되면 합계에
/// `1 + 최근 터치 비율 × recent_touch_bonus_percent / 100`을 곱합니다.
/// 이 보너스는 3요인 상한을 넘길 수 있으므로 최종 값은 다시 1.0으로
/// 클램프됩니다.
pub fn score_level(
    touches: usize,
    last_touch: DateTime<Utc>,
    now: DateTime<Utc>,
    avg_volume_at_touch: Option<f64>,
    avg_candle_volume: Option<f64>,
    touch_timestamps: Option<&[DateTime<Utc>]>,
    config: &LevelConfig,
) -> f64 {
    let touch_factor =
        (touches as f64 / config.min_touches_for_strong as f64).min(1.0) * TOUCH_WEIGHT;

    let decay_days =
        decay_days_for_interval(config.candle_interval_minutes, config.recency_decay_days);
    let days_since_touch = ((now - last_touch).num_seconds() as f64 / 86_400.0).max(0.0);
    let recency_factor = (1.0 - days_since_touch / decay_days).max(0.0) * RECENCY_WEIGHT;

    let volume_factor = match (avg_volume_at_touch, avg_candle_volume) {
        (Some(touch_volume), Some(candle_volume)) if candle_volume > 0.0 => {
            ((touch_volume / candle_volume) / config.volume_boost_threshold).min(1.0)
                * VOLUME_WEIGHT
        }
        _ => 0.0,
    };

    let mut strength = touch_factor + recency_factor + volume_factor;

    let time_weighted = &config.time_weighted_strength;
    if time_weighted.enabled {
        if let Some(timestamps) = touch_timestamps.filter(|t| !t.is_empty()) {
            let window = chrono::Duration::seconds((time_weighted.recent_period_hours * 3600.0) as i64);
            let recent = timestamps.iter().filter(|t| now - **t <= window).count();
            let recent_ratio = recent as f64 / timestamps.len() as f64;
            strength *= 1.0 + recent_ratio * time_weighted.recent_touch_bonus_percent / 100.0;
        }
    }

    strength.clamp(0.0, 1.0)
}
