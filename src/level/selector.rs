use crate::level::config::{LevelConfig, TiebreakPreference};
use crate::model::{Level, LevelKind, SignalDirection, TrendContext};

/// 점수 동률로 간주할 상대 오차
///
/// 보정값: 원 시스템에서 경험적으로 쓰이는 임계값이며 수학적 근거는 없습니다.
pub const SCORE_TIE_RATIO: f64 = 0.01;

/// 방향 선택 결과
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// 선택된 레벨 (없으면 관망)
    pub level: Option<Level>,
    /// 선택된 방향
    pub direction: SignalDirection,
    /// 선택된 레벨까지의 거리(%), 레벨이 없으면 무한대
    pub distance_percent: f64,
}

impl Selection {
    /// 실행 가능한 레벨이 없는 관망 결과
    ///
    /// 오류가 아니라 "의견 없음"이라는 정상적인 트레이딩 결과입니다.
    pub fn hold() -> Self {
        Selection {
            level: None,
            direction: SignalDirection::Hold,
            distance_percent: f64::INFINITY,
        }
    }
}

/// 가격이 레벨의 올바른 쪽에 있는지 확인
///
/// 지지선은 가격 아래에, 저항선은 가격 위에 있어야 실행 가능합니다.
fn is_correct_side(current_price: f64, level: &Level) -> bool {
    match level.kind {
        LevelKind::Support => current_price >= level.price,
        LevelKind::Resistance => current_price <= level.price,
    }
}

/// 가장 가까운 실행 가능 레벨 탐색
///
/// 가격이 올바른 쪽에 있고 거리 비율이 `max_distance_percent` 이내인
/// 레벨 중 가장 가까운 것을 반환합니다.
///
/// # Arguments
/// * `current_price` - 현재 가격
/// * `levels` - 후보 레벨 목록
/// * `kind` - 탐색할 레벨 종류
/// * `max_distance_percent` - 허용 최대 거리(%)
pub fn select_nearest(
    current_price: f64,
    levels: &[Level],
    kind: LevelKind,
    max_distance_percent: f64,
) -> Option<Level> {
    levels
        .iter()
        .filter(|level| level.kind == kind)
        .filter(|level| is_correct_side(current_price, level))
        .filter(|level| level.distance_percent(current_price) <= max_distance_percent)
        .min_by(|a, b| {
            a.distance_percent(current_price)
                .partial_cmp(&b.distance_percent(current_price))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned()
}

/// 추세 맥락을 반영한 비대칭 최대 거리 계산
///
/// 레벨 종류가 추세와 정렬된 경우 (상승 추세의 지지선, 하락 추세의
/// 저항선) 허용 거리가 `trend_aligned_distance_multiplier`배로
/// 넓어집니다. 추세 정렬 진입은 가격에서 더 멀리 기다릴 수 있고,
/// 역추세 진입은 더 타이트해야 한다는 비대칭입니다.
pub fn asymmetric_max_distance(kind: LevelKind, trend: TrendContext, config: &LevelConfig) -> f64 {
    let aligned = matches!(
        (kind, trend),
        (LevelKind::Support, TrendContext::Uptrend)
            | (LevelKind::Resistance, TrendContext::Downtrend)
    );

    if aligned {
        config.max_distance_percent * config.trend_aligned_distance_multiplier
    } else {
        config.max_distance_percent
    }
}

/// 레벨 점수: 강하고 가까울수록 높음
fn level_score(level: &Level, current_price: f64) -> f64 {
    level.strength / (1.0 + level.distance_percent(current_price) / 100.0)
}

/// 지지/저항 후보 중 방향 선택
///
/// 각 후보의 점수는 `strength / (1 + 거리% / 100)`이며, 점수가 확실히
/// 높은 쪽이 이깁니다 (지지선→롱, 저항선→숏). 두 점수의 차이가
/// `SCORE_TIE_RATIO` 이내면 동률로 보고 `tiebreak` 정책으로 해소합니다.
/// 한쪽만 실행 가능하면 그쪽이 무조건 이기고, 둘 다 없으면 관망입니다.
pub fn select_best(
    current_price: f64,
    nearest_support: Option<Level>,
    nearest_resistance: Option<Level>,
    tiebreak: TiebreakPreference,
) -> Selection {
    let (support, resistance) = match (nearest_support, nearest_resistance) {
        (None, None) => return Selection::hold(),
        (Some(support), None) => return selection_of(support, current_price),
        (None, Some(resistance)) => return selection_of(resistance, current_price),
        (Some(support), Some(resistance)) => (support, resistance),
    };

    let support_score = level_score(&support, current_price);
    let resistance_score = level_score(&resistance, current_price);
    let larger = support_score.max(resistance_score);
    let is_tie = (support_score - resistance_score).abs() <= SCORE_TIE_RATIO * larger;

    if !is_tie {
        return if support_score > resistance_score {
            selection_of(support, current_price)
        } else {
            selection_of(resistance, current_price)
        };
    }

    let pick_support = match tiebreak {
        TiebreakPreference::Long => true,
        TiebreakPreference::Short => false,
        TiebreakPreference::Nearest => {
            support.distance_percent(current_price) <= resistance.distance_percent(current_price)
        }
        TiebreakPreference::Strongest => support.strength >= resistance.strength,
    };

    if pick_support {
        selection_of(support, current_price)
    } else {
        selection_of(resistance, current_price)
    }
}

/// 단일 레벨로부터 선택 결과 구성
fn selection_of(level: Level, current_price: f64) -> Selection {
    let direction = match level.kind {
        LevelKind::Support => SignalDirection::Long,
        LevelKind::Resistance => SignalDirection::Short,
    };
    let distance_percent = level.distance_percent(current_price);

    Selection {
        level: Some(level),
        direction,
        distance_percent,
    }
}
