use common_test_utils::*;

use async_trait::async_trait;
use signal_engine::level::{LevelAnalyzer, LevelConfig};
use signal_engine::model::{AnalyzerSignal, SignalDirection};
use signal_engine::registry::{
    AnalyzerDefinition, AnalyzerRegistry, LevelSignalSource, SignalSource,
};
use signal_engine::snapshot::MarketSnapshot;
use std::sync::Arc;

/// 테스트용 신호 소스 동작
enum Behavior {
    Signal(SignalDirection, f64),
    NoSignal,
    Error,
    Panic,
}

struct TestSource {
    behavior: Behavior,
}

impl TestSource {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(TestSource { behavior })
    }
}

#[async_trait]
impl SignalSource<TestCandle> for TestSource {
    async fn evaluate(
        &self,
        _snapshot: &MarketSnapshot<TestCandle>,
    ) -> Result<Option<AnalyzerSignal>, String> {
        match &self.behavior {
            Behavior::Signal(direction, confidence) => {
                Ok(Some(AnalyzerSignal::new("test", *direction, *confidence)))
            }
            Behavior::NoSignal => Ok(None),
            Behavior::Error => Err("평가 실패 시뮬레이션".to_string()),
            Behavior::Panic => panic!("패닉 시뮬레이션"),
        }
    }
}

fn empty_snapshot() -> MarketSnapshot<TestCandle> {
    MarketSnapshot::new("test".to_string(), 100.0, ts(10), Vec::new(), Vec::new())
}

fn definition(name: &str, behavior: Behavior) -> AnalyzerDefinition<TestCandle> {
    AnalyzerDefinition::new(name, 1.0, 0, TestSource::new(behavior))
}

#[tokio::test]
async fn test_one_failure_does_not_abort_collection() {
    // 신호 1개 + 의견 없음 1개 + 오류 1개 -> 신호 딱 1개
    let mut registry = AnalyzerRegistry::new();
    registry.register(definition("healthy", Behavior::Signal(SignalDirection::Long, 70.0)));
    registry.register(definition("silent", Behavior::NoSignal));
    registry.register(definition("broken", Behavior::Error));

    let signals = registry.collect_signals(&empty_snapshot()).await;

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].source, "healthy");
    assert_eq!(signals[0].direction, SignalDirection::Long);
}

#[tokio::test]
async fn test_round_reports_no_signal_and_errors_separately() {
    let mut registry = AnalyzerRegistry::new();
    registry.register(definition("healthy", Behavior::Signal(SignalDirection::Short, 55.0)));
    registry.register(definition("silent", Behavior::NoSignal));
    registry.register(definition("broken", Behavior::Error));

    let round = registry.run_round(&empty_snapshot()).await;

    assert_eq!(round.signals.len(), 1);
    assert_eq!(round.no_signal, vec!["silent".to_string()]);
    assert_eq!(round.errored, vec!["broken".to_string()]);
}

#[tokio::test]
async fn test_panicking_source_is_isolated() {
    let mut registry = AnalyzerRegistry::new();
    registry.register(definition("wild", Behavior::Panic));
    registry.register(definition("healthy", Behavior::Signal(SignalDirection::Long, 60.0)));

    let round = registry.run_round(&empty_snapshot()).await;

    assert_eq!(round.signals.len(), 1);
    assert_eq!(round.signals[0].source, "healthy");
    assert_eq!(round.errored, vec!["wild".to_string()]);
}

#[tokio::test]
async fn test_registry_stamps_name_weight_priority() {
    let mut registry = AnalyzerRegistry::new();
    registry.register(AnalyzerDefinition::new(
        "momentum",
        2.5,
        7,
        TestSource::new(Behavior::Signal(SignalDirection::Long, 65.0)),
    ));

    let signals = registry.collect_signals(&empty_snapshot()).await;

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].source, "momentum");
    assert_eq!(signals[0].weight, 2.5);
    assert_eq!(signals[0].priority, 7);
    assert_eq!(signals[0].confidence, 65.0);
}

#[tokio::test]
async fn test_set_weight_is_authoritative() {
    let mut registry = AnalyzerRegistry::new();
    registry.register(definition("a", Behavior::Signal(SignalDirection::Long, 50.0)));

    assert!(registry.set_weight("a", 3.0));
    assert!(!registry.set_weight("missing", 3.0));

    let signals = registry.collect_signals(&empty_snapshot()).await;
    assert_eq!(signals[0].weight, 3.0);
}

#[tokio::test]
async fn test_disabled_analyzer_is_skipped() {
    let mut registry = AnalyzerRegistry::new();
    registry.register(definition("a", Behavior::Signal(SignalDirection::Long, 50.0)));
    registry.register(definition("b", Behavior::Signal(SignalDirection::Short, 50.0)));

    assert!(registry.set_enabled("a", false));
    assert_eq!(registry.is_enabled("a"), Some(false));

    let signals = registry.collect_signals(&empty_snapshot()).await;
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].source, "b");
}

#[tokio::test]
async fn test_register_replaces_by_name() {
    let mut registry = AnalyzerRegistry::new();
    registry.register(definition("a", Behavior::NoSignal));
    registry.register(definition("a", Behavior::Signal(SignalDirection::Long, 50.0)));

    assert_eq!(registry.len(), 1);

    // 마지막 등록이 이김
    let signals = registry.collect_signals(&empty_snapshot()).await;
    assert_eq!(signals.len(), 1);
}

#[tokio::test]
async fn test_register_batch_and_status() {
    let mut registry = AnalyzerRegistry::new();
    registry.register_batch(vec![
        AnalyzerDefinition::new("a", 1.0, 1, TestSource::new(Behavior::NoSignal)),
        AnalyzerDefinition::new("b", 2.0, 2, TestSource::new(Behavior::NoSignal)),
    ]);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);

    let status = registry.status();
    assert_eq!(status.len(), 2);
    assert_eq!(status[0].name, "a");
    assert!(status[0].enabled);
    assert_eq!(status[1].weight, 2.0);
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let mut registry = AnalyzerRegistry::new();
    registry.register(definition("a", Behavior::NoSignal));
    registry.clear();

    assert!(registry.is_empty());
    let signals = registry.collect_signals(&empty_snapshot()).await;
    assert!(signals.is_empty());
}

#[tokio::test]
async fn test_level_source_in_registry() {
    // 레벨 분석기를 실제 레지스트리 항목으로 실행하는 종단 테스트
    let mut registry = AnalyzerRegistry::new();
    let config = LevelConfig {
        min_touches_required: 3,
        max_distance_percent: 1.0,
        ..LevelConfig::default()
    };
    registry.register(LevelSignalSource::definition(config).unwrap());
    registry.register(definition("broken", Behavior::Error));

    let swings = vec![
        swing_low(100.0, ts(0)),
        swing_low(100.1, ts(1)),
        swing_low(100.2, ts(2)),
    ];
    let snapshot = MarketSnapshot::new(
        "test".to_string(),
        100.5,
        ts(10),
        create_flat_candles(10, 100.5, 1000.0),
        swings,
    );

    let round = registry.run_round(&snapshot).await;

    assert_eq!(round.signals.len(), 1);
    assert_eq!(round.signals[0].source, "level");
    assert_eq!(round.signals[0].direction, SignalDirection::Long);
    assert_eq!(round.errored, vec!["broken".to_string()]);
}

#[tokio::test]
async fn test_level_source_reports_no_signal_on_hold() {
    // 관망 분석은 오류가 아니라 의견 없음으로 보고됨
    let mut registry = AnalyzerRegistry::new();
    let analyzer = LevelAnalyzer::default_config();
    registry.register(AnalyzerDefinition::new(
        "level",
        1.2,
        10,
        Arc::new(LevelSignalSource::new(analyzer)),
    ));

    let round = registry.run_round(&empty_snapshot()).await;

    assert!(round.signals.is_empty());
    assert_eq!(round.no_signal, vec!["level".to_string()]);
    assert!(round.errored.is_empty());
}
