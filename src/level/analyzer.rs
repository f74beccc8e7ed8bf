use crate::candle::Candle;
use crate::config_loader::{ConfigResult, ConfigValidation};
use crate::level::cluster::{cluster_swing_points, effective_cluster_threshold};
use crate::level::config::LevelConfig;
use crate::level::selector::{Selection, asymmetric_max_distance, select_best, select_nearest};
use crate::level::strength::score_level;
use crate::model::{
    AnalyzerSignal, Level, LevelKind, SignalDirection, SwingKind, SwingPoint, TrendContext,
};
use crate::orderbook::{OrderBook, find_wall_near};
use crate::snapshot::MarketSnapshot;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::HashMap;

/// 분석에 필요한 최소 캔들 수
pub const MIN_CANDLES_FOR_ANALYSIS: usize = 5;

/// 소진 페널티 적용 후 강도 하한
///
/// 보정값: 반복 돌파된 레벨도 구조적으로는 의미가 남는다는 가정이며,
/// 수학적으로 유도된 값은 아닙니다.
pub const EXHAUSTION_STRENGTH_FLOOR: f64 = 0.1;

/// 매우 가까운 레벨에 적용하는 신뢰도 배수
const VERY_CLOSE_CONFIDENCE_BOOST: f64 = 1.15;
/// 먼 레벨에 적용하는 신뢰도 배수
const FAR_CONFIDENCE_PENALTY: f64 = 0.85;

/// 레벨 분석 결과
#[derive(Debug, Clone)]
pub struct LevelAnalysis {
    /// 선택된 가장 가까운 레벨
    pub nearest_level: Option<Level>,
    /// 선택된 레벨까지의 거리(%), 없으면 무한대
    pub distance_percent: f64,
    /// 신호 방향
    pub direction: SignalDirection,
    /// 신뢰도 [0, max_confidence]
    pub confidence: f64,
    /// 판정 사유
    pub reason: String,
    /// 터치 수 필터를 통과한 전체 레벨 목록
    pub all_levels: Vec<Level>,
}

impl LevelAnalysis {
    /// 의견 없음 결과 생성
    fn hold(reason: impl Into<String>) -> Self {
        LevelAnalysis {
            nearest_level: None,
            distance_percent: f64::INFINITY,
            direction: SignalDirection::Hold,
            confidence: 0.0,
            reason: reason.into(),
            all_levels: Vec::new(),
        }
    }
}

/// 지지/저항 레벨 분석기
///
/// 스윙 포인트 클러스터링 → 강도 산정 → 레벨 선택 → 신뢰도 계산의
/// 순차 파이프라인을 오케스트레이션합니다. 데이터가 부족하면 항상
/// 관망 결과로 강등되며 오류를 반환하지 않습니다.
#[derive(Debug, Clone)]
pub struct LevelAnalyzer {
    config: LevelConfig,
}

impl LevelAnalyzer {
    /// 검증된 설정으로 분석기 생성
    ///
    /// # Returns
    /// * `ConfigResult<LevelAnalyzer>` - 설정이 유효 범위를 벗어나면 오류
    pub fn new(config: LevelConfig) -> ConfigResult<LevelAnalyzer> {
        config.validate()?;
        Ok(LevelAnalyzer { config })
    }

    /// 기본 설정으로 분석기 생성
    pub fn default_config() -> LevelAnalyzer {
        LevelAnalyzer {
            config: LevelConfig::default(),
        }
    }

    /// 설정 참조 반환
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// 시장 스냅샷 분석
    ///
    /// 스윙 포인트를 종류별로 나눠 클러스터링하고, 최소 터치 수를
    /// 충족한 클러스터를 강도 산정한 뒤, 추세 비대칭 거리 상한으로
    /// 양쪽 최근접 레벨을 뽑아 방향을 선택하고 신뢰도를 계산합니다.
    pub fn analyze<C: Candle>(&self, snapshot: &MarketSnapshot<C>) -> LevelAnalysis {
        if snapshot.swing_points.is_empty() {
            debug!("레벨 분석 생략: 스윙 포인트 없음 ({})", snapshot.market);
            return LevelAnalysis::hold("스윙 포인트가 없어 관망");
        }
        if snapshot.candles.len() < MIN_CANDLES_FOR_ANALYSIS {
            debug!(
                "레벨 분석 생략: 캔들 부족 ({} < {})",
                snapshot.candles.len(),
                MIN_CANDLES_FOR_ANALYSIS
            );
            return LevelAnalysis::hold("캔들 데이터가 부족하여 관망");
        }

        let supports = self.build_levels(snapshot, LevelKind::Support, self.config.min_touches_required);
        let resistances =
            self.build_levels(snapshot, LevelKind::Resistance, self.config.min_touches_required);
        debug!(
            "레벨 클러스터링 완료: 지지 {}개, 저항 {}개 ({})",
            supports.len(),
            resistances.len(),
            snapshot.market
        );

        let nearest_support = select_nearest(
            snapshot.current_price,
            &supports,
            LevelKind::Support,
            asymmetric_max_distance(LevelKind::Support, snapshot.trend, &self.config),
        );
        let nearest_resistance = select_nearest(
            snapshot.current_price,
            &resistances,
            LevelKind::Resistance,
            asymmetric_max_distance(LevelKind::Resistance, snapshot.trend, &self.config),
        );

        let selection = select_best(
            snapshot.current_price,
            nearest_support,
            nearest_resistance,
            self.config.tiebreak_preference,
        );

        let mut all_levels = supports;
        all_levels.extend(resistances);

        self.finish_analysis(selection, all_levels)
    }

    /// 선택 결과를 분석 결과로 마무리
    fn finish_analysis(&self, selection: Selection, all_levels: Vec<Level>) -> LevelAnalysis {
        match selection.level {
            Some(level) => {
                let confidence = self.compute_confidence(&level, selection.distance_percent);
                let reason = format!(
                    "{} {:.4} 근처 (거리 {:.2}%, 강도 {:.2}, 터치 {}회)",
                    match level.kind {
                        LevelKind::Support => "지지선",
                        LevelKind::Resistance => "저항선",
                    },
                    level.price,
                    selection.distance_percent,
                    level.strength,
                    level.touches
                );

                LevelAnalysis {
                    nearest_level: Some(level),
                    distance_percent: selection.distance_percent,
                    direction: selection.direction,
                    confidence,
                    reason,
                    all_levels,
                }
            }
            None => LevelAnalysis {
                all_levels,
                ..LevelAnalysis::hold("거리 상한 내 실행 가능한 레벨 없음")
            },
        }
    }

    /// 신뢰도 계산
    ///
    /// `base + 강도×20`에서 시작해 거리 구간 배수를 적용하고,
    /// 초과 터치 보너스 `min((터치 − 최소 터치)×2, 10)`을 더한 뒤
    /// `[0, max_confidence]`로 클램프하고 반올림합니다.
    fn compute_confidence(&self, level: &Level, distance_percent: f64) -> f64 {
        let mut confidence = self.config.base_confidence + level.strength * 20.0;

        if distance_percent <= self.config.very_close_distance_percent {
            confidence *= VERY_CLOSE_CONFIDENCE_BOOST;
        } else if distance_percent > 0.7 * self.config.max_distance_percent {
            confidence *= FAR_CONFIDENCE_PENALTY;
        }

        let extra_touches = level.touches.saturating_sub(self.config.min_touches_required);
        confidence += (extra_touches as f64 * 2.0).min(10.0);

        confidence.clamp(0.0, self.config.max_confidence).round()
    }

    /// 터치 수와 무관하게 모든 클러스터 레벨 반환
    ///
    /// 익절 정렬 검사처럼 전체 구조가 필요한 소비자를 위한 뷰이며,
    /// 세 가지 독립적으로 토글되는 보강을 적용합니다:
    /// 수명 필터, 소진 페널티, 오더북 확인.
    pub fn get_all_levels<C: Candle>(&self, snapshot: &MarketSnapshot<C>) -> Vec<Level> {
        if snapshot.swing_points.is_empty() || snapshot.candles.len() < MIN_CANDLES_FOR_ANALYSIS {
            return Vec::new();
        }

        let mut levels = self.build_levels(snapshot, LevelKind::Support, 1);
        levels.extend(self.build_levels(snapshot, LevelKind::Resistance, 1));

        if self.config.max_level_age_candles > 0 {
            let before = levels.len();
            levels = self.filter_expired(levels, snapshot.now);
            if levels.len() < before {
                debug!("수명 필터로 레벨 {}개 제거", before - levels.len());
            }
        }

        if self.config.level_exhaustion.enabled {
            for level in levels.iter_mut() {
                self.apply_exhaustion(level, snapshot);
            }
        }

        if self.config.orderbook_validation.enabled {
            if let Some(orderbook) = &snapshot.orderbook {
                for level in levels.iter_mut() {
                    self.apply_orderbook_confirmation(level, orderbook);
                }
            }
            if self.config.orderbook_validation.require_confirmation {
                levels.retain(|level| level.orderbook_confirmed);
            }
        }

        levels
    }

    /// 분석 결과를 분석기 신호로 변환
    ///
    /// 관망 결과는 "의견 없음"이므로 신호를 생성하지 않습니다.
    pub fn generate_signal<C: Candle>(
        &self,
        snapshot: &MarketSnapshot<C>,
    ) -> Option<AnalyzerSignal> {
        let analysis = self.analyze(snapshot);
        match analysis.direction {
            SignalDirection::Hold => None,
            direction => Some(AnalyzerSignal::new("level", direction, analysis.confidence)),
        }
    }

    /// 추세 비대칭 최대 거리 조회
    ///
    /// 외부 익절/사이징 서브시스템이 동일한 거리 정책을 공유할 수 있도록
    /// 분석기 수준에서 재노출합니다.
    pub fn get_asymmetric_max_distance(&self, kind: LevelKind, trend: TrendContext) -> f64 {
        asymmetric_max_distance(kind, trend, &self.config)
    }

    /// 한쪽 스윙 포인트를 클러스터링하고 강도를 산정한 레벨 목록 생성
    fn build_levels<C: Candle>(
        &self,
        snapshot: &MarketSnapshot<C>,
        kind: LevelKind,
        min_touches: usize,
    ) -> Vec<Level> {
        let swing_kind = match kind {
            LevelKind::Support => SwingKind::Low,
            LevelKind::Resistance => SwingKind::High,
        };
        let points: Vec<SwingPoint> = snapshot
            .swing_points
            .iter()
            .filter(|p| p.kind == swing_kind)
            .copied()
            .collect();

        let threshold = effective_cluster_threshold(
            self.config.cluster_threshold_ratio(),
            snapshot.atr_percent,
            &self.config.dynamic_cluster_threshold,
        );

        let volume_by_time: HashMap<DateTime<Utc>, f64> = snapshot
            .candles
            .iter()
            .map(|c| (c.datetime(), c.volume()))
            .collect();
        let avg_candle_volume = snapshot.average_candle_volume();

        cluster_swing_points(&points, kind, threshold)
            .into_iter()
            .filter(|level| level.touches >= min_touches)
            .map(|mut level| {
                level.avg_volume_at_touch =
                    average_touch_volume(&level.touch_timestamps, &volume_by_time);
                let strength = score_level(
                    level.touches,
                    level.last_touch,
                    snapshot.now,
                    level.avg_volume_at_touch,
                    avg_candle_volume,
                    Some(&level.touch_timestamps),
                    &self.config,
                );
                level.with_strength(strength)
            })
            .collect()
    }

    /// 마지막 터치가 유효 수명을 넘긴 레벨 제거
    ///
    /// 만료된 구조는 약한 레벨이 아니라 노이즈로 취급합니다.
    fn filter_expired(&self, levels: Vec<Level>, now: DateTime<Utc>) -> Vec<Level> {
        let max_age = Duration::minutes(
            self.config.max_level_age_candles as i64 * self.config.candle_interval_minutes as i64,
        );
        levels
            .into_iter()
            .filter(|level| now - level.last_touch <= max_age)
            .collect()
    }

    /// 소진 페널티 적용
    ///
    /// 최근 lookback 구간의 종가 중 레벨을 임계 비율 이상 돌파한
    /// (지지선 아래 / 저항선 위) 종가를 세어, 돌파당 페널티를 상한까지
    /// 누적해 강도에서 차감합니다. 강도는 하한 아래로 내려가지 않습니다.
    fn apply_exhaustion<C: Candle>(&self, level: &mut Level, snapshot: &MarketSnapshot<C>) {
        let exhaustion = &self.config.level_exhaustion;
        let threshold_ratio = exhaustion.breakout_threshold_percent / 100.0;

        let breakouts = snapshot
            .recent_candles(exhaustion.lookback_candles)
            .iter()
            .filter(|candle| {
                let close = candle.close_price();
                match level.kind {
                    LevelKind::Support => close < level.price * (1.0 - threshold_ratio),
                    LevelKind::Resistance => close > level.price * (1.0 + threshold_ratio),
                }
            })
            .count() as u32;

        if breakouts == 0 {
            return;
        }

        let penalty =
            (breakouts as f64 * exhaustion.penalty_per_breakout).min(exhaustion.max_penalty);
        level.breakouts = breakouts;
        level.exhaustion_penalty = penalty;
        level.strength = (level.strength - penalty).max(EXHAUSTION_STRENGTH_FLOOR);
        debug!(
            "레벨 소진: {:.4} 돌파 {}회, 페널티 {:.2}, 강도 {:.2}",
            level.price, breakouts, penalty, level.strength
        );
    }

    /// 오더북 확인 적용
    ///
    /// 같은 방향의 잔량 벽 (지지선=매수, 저항선=매도)이 허용 거리 내에
    /// 있고 사이드 총량 대비 최소 비율을 넘으면 강도를 부스트하고
    /// 확인 플래그를 세웁니다. 필수 확인이 아닌 한 추가 증거일 뿐입니다.
    fn apply_orderbook_confirmation(&self, level: &mut Level, orderbook: &OrderBook) {
        let validation = &self.config.orderbook_validation;
        if let Some(wall) = find_wall_near(
            orderbook,
            level.price,
            level.kind,
            validation.max_distance_percent,
            validation.min_wall_percent,
        ) {
            level.orderbook_confirmed = true;
            level.orderbook_wall = Some(wall.quantity);
            level.strength = (level.strength + validation.strength_boost).min(1.0);
            debug!(
                "오더북 확인: 레벨 {:.4}, 벽 {:.4} ({:.1}%), 강도 {:.2}",
                level.price, wall.price, wall.side_percent, level.strength
            );
        }
    }
}

/// 터치 시각과 일치하는 캔들들의 평균 거래량
///
/// 일치하는 캔들이 하나도 없으면 None (거래량 요인이 0으로 기여).
fn average_touch_volume(
    touch_timestamps: &[DateTime<Utc>],
    volume_by_time: &HashMap<DateTime<Utc>, f64>,
) -> Option<f64> {
    let volumes: Vec<f64> = touch_timestamps
        .iter()
        .filter_map(|t| volume_by_time.get(t).copied())
        .collect();

    if volumes.is_empty() {
        None
    } else {
        Some(volumes.iter().sum::<f64>() / volumes.len() as f64)
    }
}
