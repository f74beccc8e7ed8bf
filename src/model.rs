use chrono::{DateTime, Utc};
use serde::Serialize;

/// 스윙 포인트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwingKind {
    /// 국소 고점
    High,
    /// 국소 저점
    Low,
}

/// 스윙 포인트 (국소 가격 극값)
///
/// 외부 스윙 감지기가 생성하며 읽기 전용으로 소비됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingPoint {
    /// 극값 가격
    pub price: f64,
    /// 발생 시각
    pub timestamp: DateTime<Utc>,
    /// 고점/저점 구분
    pub kind: SwingKind,
}

impl SwingPoint {
    /// 새 스윙 포인트 생성
    pub fn new(price: f64, timestamp: DateTime<Utc>, kind: SwingKind) -> Self {
        SwingPoint {
            price,
            timestamp,
            kind,
        }
    }
}

/// 레벨 종류 (지지/저항)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LevelKind {
    /// 지지선 (가격 하단)
    Support,
    /// 저항선 (가격 상단)
    Resistance,
}

/// 레벨 산출 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LevelSource {
    /// 스윙 포인트 클러스터링
    Swing,
    /// 볼륨 프로파일
    VolumeProfile,
    /// 복합 출처
    Combined,
}

/// 클러스터링된 가격 레벨
///
/// 매 분석 호출마다 현재 스윙 포인트 집합에서 새로 생성되며,
/// 동일 분석 패스 내의 페널티/부스트 조정으로만 변경됩니다.
/// 생성 시점에 `touches == touch_timestamps.len()`이 성립하고,
/// `strength`는 조정 이후에도 항상 [0, 1] 범위로 클램프됩니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Level {
    /// 레벨 가격 (클러스터 평균)
    pub price: f64,
    /// 지지/저항 구분
    pub kind: LevelKind,
    /// 강도 점수 [0, 1]
    pub strength: f64,
    /// 터치 횟수 (클러스터 크기)
    pub touches: usize,
    /// 마지막 터치 시각
    pub last_touch: DateTime<Utc>,
    /// 개별 터치 시각 목록
    pub touch_timestamps: Vec<DateTime<Utc>>,
    /// 터치 시점 평균 거래량
    pub avg_volume_at_touch: Option<f64>,
    /// 레벨 출처
    pub source: LevelSource,
    /// 관측된 돌파 종가 수
    pub breakouts: u32,
    /// 적용된 소진 페널티
    pub exhaustion_penalty: f64,
    /// 오더북 벽으로 확인되었는지 여부
    pub orderbook_confirmed: bool,
    /// 확인된 오더북 벽의 수량
    pub orderbook_wall: Option<f64>,
}

impl Level {
    /// 클러스터로부터 새 레벨 생성
    ///
    /// # Arguments
    /// * `price` - 클러스터 평균 가격
    /// * `kind` - 지지/저항 구분
    /// * `touch_timestamps` - 클러스터에 속한 터치 시각들
    ///
    /// # Panics
    /// * `touch_timestamps`가 비어 있으면 패닉 발생 (빈 클러스터는 생성 불가)
    pub fn from_cluster(price: f64, kind: LevelKind, touch_timestamps: Vec<DateTime<Utc>>) -> Self {
        assert!(
            !touch_timestamps.is_empty(),
            "빈 클러스터로는 레벨을 생성할 수 없습니다"
        );
        let last_touch = touch_timestamps.iter().max().copied().unwrap_or_default();

        Level {
            price,
            kind,
            strength: 0.0,
            touches: touch_timestamps.len(),
            last_touch,
            touch_timestamps,
            avg_volume_at_touch: None,
            source: LevelSource::Swing,
            breakouts: 0,
            exhaustion_penalty: 0.0,
            orderbook_confirmed: false,
            orderbook_wall: None,
        }
    }

    /// 강도 설정 ([0, 1] 클램프)
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    /// 레벨 출처 설정
    pub fn with_source(mut self, source: LevelSource) -> Self {
        self.source = source;
        self
    }

    /// 현재 가격과의 거리 비율(%) 계산
    pub fn distance_percent(&self, current_price: f64) -> f64 {
        if self.price <= 0.0 {
            return f64::INFINITY;
        }
        (current_price - self.price).abs() / self.price * 100.0
    }
}

/// 추세 맥락
///
/// 외부 추세 분류기가 공급하며, 추세 방향과 정렬된 레벨에
/// 더 넓은 거리 허용 범위를 부여하는 데 사용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TrendContext {
    /// 상승 추세
    Uptrend,
    /// 하락 추세
    Downtrend,
    /// 중립 (기본값)
    #[default]
    Neutral,
}

/// 신호 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalDirection {
    /// 롱 진입 의견
    Long,
    /// 숏 진입 의견
    Short,
    /// 의견 없음 (관망)
    Hold,
}

/// 개별 분석기의 판정 결과
///
/// 평가마다 새로 생성되며 반환 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerSignal {
    /// 분석기 이름
    pub source: String,
    /// 신호 방향
    pub direction: SignalDirection,
    /// 신뢰도 [0, 100]
    pub confidence: f64,
    /// 상대 가중치
    pub weight: f64,
    /// 우선순위 (동률 해소/정렬 힌트)
    pub priority: u32,
}

impl AnalyzerSignal {
    /// 새 신호 생성 (신뢰도는 [0, 100] 클램프)
    pub fn new(source: impl Into<String>, direction: SignalDirection, confidence: f64) -> Self {
        AnalyzerSignal {
            source: source.into(),
            direction,
            confidence: confidence.clamp(0.0, 100.0),
            weight: 1.0,
            priority: 0,
        }
    }

    /// 가중치 설정
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// 우선순위 설정
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}
