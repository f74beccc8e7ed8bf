use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// 캔들 간격
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    /// 1분봉
    Minute1,
    /// 3분봉
    Minute3,
    /// 5분봉
    Minute5,
    /// 15분봉
    Minute15,
    /// 30분봉
    Minute30,
    /// 1시간봉
    Hour1,
    /// 4시간봉
    Hour4,
    /// 일봉
    Day1,
}

impl CandleInterval {
    /// 간격을 분 단위로 반환
    pub fn minutes(&self) -> u32 {
        match self {
            CandleInterval::Minute1 => 1,
            CandleInterval::Minute3 => 3,
            CandleInterval::Minute5 => 5,
            CandleInterval::Minute15 => 15,
            CandleInterval::Minute30 => 30,
            CandleInterval::Hour1 => 60,
            CandleInterval::Hour4 => 240,
            CandleInterval::Day1 => 1440,
        }
    }
}

impl Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

/// 캔들 데이터 접근 트레이트
///
/// 분석기가 소비하는 OHLCV 캔들의 최소 표면을 정의합니다.
/// 거래소별 캔들 타입은 이 트레이트를 구현하여 엔진에 공급됩니다.
pub trait Candle: Clone + PartialEq + Debug + Display + Send + Sync + 'static {
    /// 시가
    fn open_price(&self) -> f64;
    /// 고가
    fn high_price(&self) -> f64;
    /// 저가
    fn low_price(&self) -> f64;
    /// 종가
    fn close_price(&self) -> f64;
    /// 거래량
    fn volume(&self) -> f64;
    /// 시장 식별자
    fn market(&self) -> &str;
    /// 캔들 시각
    fn datetime(&self) -> DateTime<Utc>;
    /// 캔들 간격
    fn interval(&self) -> &CandleInterval;
}

/// 기본 OHLCV 캔들 구현
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvCandle {
    pub market: String,
    pub datetime: DateTime<Utc>,
    pub interval: CandleInterval,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvCandle {
    pub fn new(
        market: String,
        datetime: DateTime<Utc>,
        interval: CandleInterval,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        OhlcvCandle {
            market,
            datetime,
            interval,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl Display for OhlcvCandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OhlcvCandle({} {} o={} h={} l={} c={} v={})",
            self.market, self.datetime, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl Candle for OhlcvCandle {
    fn open_price(&self) -> f64 {
        self.open
    }

    fn high_price(&self) -> f64 {
        self.high
    }

    fn low_price(&self) -> f64 {
        self.low
    }

    fn close_price(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn market(&self) -> &str {
        &self.market
    }

    fn datetime(&self) -> DateTime<Utc> {
        self.datetime
    }

    fn interval(&self) -> &CandleInterval {
        &self.interval
    }
}
