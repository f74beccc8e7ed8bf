use crate::candle::Candle;
use crate::candle_store::CandleStore;
use crate::model::{SwingPoint, TrendContext};
use crate::orderbook::OrderBook;
use chrono::{DateTime, Utc};

/// 평가 라운드마다 공유되는 불변 시장 스냅샷
///
/// 모든 분석기는 동일한 스냅샷을 읽기 전용으로 소비합니다.
/// 라운드 중에 변경되는 공유 상태가 없으므로 분석기들은
/// 순서 보장 없이 동시에 실행될 수 있습니다.
#[derive(Debug, Clone)]
pub struct MarketSnapshot<C: Candle> {
    /// 시장 식별자
    pub market: String,
    /// 현재 가격
    pub current_price: f64,
    /// 평가 기준 시각
    pub now: DateTime<Utc>,
    /// 캔들 목록 (시간 오름차순)
    pub candles: Vec<C>,
    /// 스윙 포인트 목록
    pub swing_points: Vec<SwingPoint>,
    /// 현재 ATR 비율(%) - 변동성 적응 클러스터링에 사용
    pub atr_percent: Option<f64>,
    /// 오더북 스냅샷
    pub orderbook: Option<OrderBook>,
    /// 추세 맥락
    pub trend: TrendContext,
}

impl<C: Candle> MarketSnapshot<C> {
    /// 새 스냅샷 생성
    pub fn new(
        market: String,
        current_price: f64,
        now: DateTime<Utc>,
        candles: Vec<C>,
        swing_points: Vec<SwingPoint>,
    ) -> Self {
        MarketSnapshot {
            market,
            current_price,
            now,
            candles,
            swing_points,
            atr_percent: None,
            orderbook: None,
            trend: TrendContext::Neutral,
        }
    }

    /// 캔들 저장소로부터 스냅샷 생성
    ///
    /// 저장소의 캔들을 시간 오름차순으로 복제하여 담습니다.
    pub fn from_store(
        market: String,
        current_price: f64,
        now: DateTime<Utc>,
        storage: &CandleStore<C>,
        swing_points: Vec<SwingPoint>,
    ) -> Self {
        Self::new(
            market,
            current_price,
            now,
            storage.get_time_ordered_items(),
            swing_points,
        )
    }

    /// ATR 비율 설정
    pub fn with_atr_percent(mut self, atr_percent: f64) -> Self {
        self.atr_percent = Some(atr_percent);
        self
    }

    /// 오더북 설정
    pub fn with_orderbook(mut self, orderbook: OrderBook) -> Self {
        self.orderbook = Some(orderbook);
        self
    }

    /// 추세 맥락 설정
    pub fn with_trend(mut self, trend: TrendContext) -> Self {
        self.trend = trend;
        self
    }

    /// 전체 캔들 평균 거래량
    pub fn average_candle_volume(&self) -> Option<f64> {
        if self.candles.is_empty() {
            return None;
        }
        let sum: f64 = self.candles.iter().map(|c| c.volume()).sum();
        Some(sum / self.candles.len() as f64)
    }

    /// 최근 n개 캔들 슬라이스 반환 (시간 오름차순 유지)
    pub fn recent_candles(&self, n: usize) -> &[C] {
        let len = self.candles.len();
        &self.candles[len.saturating_sub(n)..]
    }
}
