// 분석기 레지스트리 모듈
// 독립 분석기들을 병렬로 실행하고 판정을 수집하는 프레임워크를 제공합니다.

pub mod level_source;

pub use level_source::LevelSignalSource;

use crate::candle::Candle;
use crate::model::AnalyzerSignal;
use crate::snapshot::MarketSnapshot;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::join_all;
use log::{debug, error, info};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// 신호 소스 인터페이스
///
/// 모든 분석기는 이 트레이트를 구현해야 합니다. `evaluate`는 공유
/// 스냅샷의 순수 함수여야 하며 다른 분석기와 공유 가변 상태나 실행
/// 순서 의존성을 가져서는 안 됩니다 (동시 실행에 순서 보장이 없음).
///
/// # Returns
/// * `Ok(Some(signal))` - 판정 생성
/// * `Ok(None)` - 의견 없음 (오류 아님)
/// * `Err(String)` - 평가 실패 (라운드에서 격리됨)
#[async_trait]
pub trait SignalSource<C: Candle>: Send + Sync {
    /// 시장 스냅샷 평가
    async fn evaluate(
        &self,
        snapshot: &MarketSnapshot<C>,
    ) -> Result<Option<AnalyzerSignal>, String>;
}

/// 레지스트리 등록 항목 정의
pub struct AnalyzerDefinition<C: Candle> {
    /// 분석기 이름 (레지스트리 키)
    pub name: String,
    /// 상대 가중치
    pub weight: f64,
    /// 우선순위
    pub priority: u32,
    /// 신호 소스 구현
    pub source: Arc<dyn SignalSource<C>>,
}

impl<C: Candle> AnalyzerDefinition<C> {
    /// 새 정의 생성
    pub fn new(
        name: impl Into<String>,
        weight: f64,
        priority: u32,
        source: Arc<dyn SignalSource<C>>,
    ) -> Self {
        AnalyzerDefinition {
            name: name.into(),
            weight,
            priority,
            source,
        }
    }
}

/// 등록 항목 (정의 + 가변 활성화 상태)
struct AnalyzerEntry<C: Candle> {
    name: String,
    weight: f64,
    priority: u32,
    enabled: bool,
    source: Arc<dyn SignalSource<C>>,
}

/// 분석기 상태 요약
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerStatus {
    pub name: String,
    pub weight: f64,
    pub priority: u32,
    pub enabled: bool,
}

/// 한 라운드의 수집 결과
///
/// 신호를 내지 못한 분석기는 원인별로 분리 보고됩니다:
/// `no_signal`은 의견 없음, `errored`는 평가 실패입니다.
#[derive(Debug, Clone, Default)]
pub struct SignalRound {
    /// 생성된 신호 목록 (완료 순서, 등록 순서 보장 없음)
    pub signals: Vec<AnalyzerSignal>,
    /// 의견 없음으로 제외된 분석기 이름
    pub no_signal: Vec<String>,
    /// 평가 실패로 제외된 분석기 이름
    pub errored: Vec<String>,
}

/// 단일 평가의 결말
enum Outcome {
    Signal(AnalyzerSignal),
    NoSignal(String),
    Errored(String),
}

/// 분석기 레지스트리
///
/// 이름으로 식별되는 독립 분석기 정의들을 보유하고, 활성화된 전부를
/// 공유 스냅샷에 대해 동시에 실행합니다. 한 분석기의 실패가 다른
/// 분석기의 신호 수집을 중단시키지 않습니다.
///
/// 등록/가중치/활성화 변경은 단일 관리 태스크에서 호출되어야 하며,
/// 진행 중인 수집과 동시에 호출하는 것은 계약 밖입니다.
pub struct AnalyzerRegistry<C: Candle> {
    /// 등록 순서가 유지되는 이름 목록
    keys: Vec<String>,
    /// 이름-항목 맵
    entries: HashMap<String, AnalyzerEntry<C>>,
}

impl<C: Candle> Default for AnalyzerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Candle> AnalyzerRegistry<C> {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        AnalyzerRegistry {
            keys: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// 분석기 등록
    ///
    /// 같은 이름이 이미 있으면 교체합니다 (마지막 등록이 이김).
    /// 교체 시 등록 순서상의 위치는 유지됩니다.
    pub fn register(&mut self, definition: AnalyzerDefinition<C>) {
        let entry = AnalyzerEntry {
            name: definition.name.clone(),
            weight: definition.weight,
            priority: definition.priority,
            enabled: true,
            source: definition.source,
        };

        if self.entries.insert(definition.name.clone(), entry).is_none() {
            self.keys.push(definition.name.clone());
            debug!("분석기 등록: {}", definition.name);
        } else {
            debug!("분석기 교체: {}", definition.name);
        }
    }

    /// 여러 분석기 일괄 등록
    pub fn register_batch(&mut self, definitions: Vec<AnalyzerDefinition<C>>) {
        for definition in definitions {
            self.register(definition);
        }
    }

    /// 분석기 가중치 변경
    ///
    /// # Returns
    /// * `bool` - 해당 이름의 분석기가 존재했는지 여부
    pub fn set_weight(&mut self, name: &str, weight: f64) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.weight = weight;
                true
            }
            None => false,
        }
    }

    /// 분석기 활성화/비활성화
    ///
    /// # Returns
    /// * `bool` - 해당 이름의 분석기가 존재했는지 여부
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// 모든 분석기 제거
    pub fn clear(&mut self) {
        self.keys.clear();
        self.entries.clear();
    }

    /// 등록된 분석기 수
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// 레지스트리가 비어 있는지 확인
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 등록 순서의 분석기 이름 목록
    pub fn names(&self) -> Vec<String> {
        self.keys.clone()
    }

    /// 분석기 활성화 여부 조회
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(|entry| entry.enabled)
    }

    /// 전체 분석기 상태 요약
    pub fn status(&self) -> Vec<AnalyzerStatus> {
        self.keys
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| AnalyzerStatus {
                name: entry.name.clone(),
                weight: entry.weight,
                priority: entry.priority,
                enabled: entry.enabled,
            })
            .collect()
    }

    /// 활성화된 모든 분석기를 동시에 실행하고 신호만 반환
    pub async fn collect_signals(&self, snapshot: &MarketSnapshot<C>) -> Vec<AnalyzerSignal> {
        self.run_round(snapshot).await.signals
    }

    /// 활성화된 모든 분석기를 동시에 실행하고 진단 포함 결과 반환
    ///
    /// 각 평가는 독립적으로 감싸여 있어 `Err` 반환이나 패닉이
    /// 라운드를 중단시키지 않습니다. 라운드는 모든 평가가 결말에
    /// 도달하면 끝나므로 총 지연은 가장 느린 분석기에 묶입니다.
    /// 재시도는 없습니다 - 실패한 분석기는 이번 라운드에 없을 뿐입니다.
    pub async fn run_round(&self, snapshot: &MarketSnapshot<C>) -> SignalRound {
        let evaluations = self
            .keys
            .iter()
            .filter_map(|name| self.entries.get(name))
            .filter(|entry| entry.enabled)
            .map(|entry| self.evaluate_isolated(entry, snapshot));

        let outcomes = join_all(evaluations).await;

        let mut round = SignalRound::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Signal(signal) => round.signals.push(signal),
                Outcome::NoSignal(name) => round.no_signal.push(name),
                Outcome::Errored(name) => round.errored.push(name),
            }
        }

        info!(
            "신호 수집 라운드 완료: 신호 {}개, 무신호 {}개, 실패 {}개",
            round.signals.len(),
            round.no_signal.len(),
            round.errored.len()
        );
        round
    }

    /// 단일 항목 평가 (실패 격리 래퍼)
    async fn evaluate_isolated(
        &self,
        entry: &AnalyzerEntry<C>,
        snapshot: &MarketSnapshot<C>,
    ) -> Outcome {
        let result = AssertUnwindSafe(entry.source.evaluate(snapshot))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(Some(signal))) => Outcome::Signal(
                AnalyzerSignal::new(entry.name.clone(), signal.direction, signal.confidence)
                    .with_weight(entry.weight)
                    .with_priority(entry.priority),
            ),
            Ok(Ok(None)) => {
                debug!("분석기 {} 의견 없음", entry.name);
                Outcome::NoSignal(entry.name.clone())
            }
            Ok(Err(err)) => {
                error!("분석기 {} 평가 실패: {}", entry.name, err);
                Outcome::Errored(entry.name.clone())
            }
            Err(_) => {
                error!("분석기 {} 평가 중 패닉 발생", entry.name);
                Outcome::Errored(entry.name.clone())
            }
        }
    }
}
