use crate::candle::Candle;
use crate::config_loader::ConfigResult;
use crate::level::analyzer::LevelAnalyzer;
use crate::level::config::LevelConfig;
use crate::model::AnalyzerSignal;
use crate::registry::{AnalyzerDefinition, SignalSource};
use crate::snapshot::MarketSnapshot;
use async_trait::async_trait;
use std::sync::Arc;

/// 레벨 분석기의 레지스트리 기본 이름
pub const LEVEL_SOURCE_NAME: &str = "level";
/// 레벨 분석기의 기본 가중치
pub const LEVEL_SOURCE_WEIGHT: f64 = 1.2;
/// 레벨 분석기의 기본 우선순위
pub const LEVEL_SOURCE_PRIORITY: u32 = 10;

/// 레벨 분석기를 신호 소스로 감싸는 어댑터
///
/// 레지스트리에 등록되는 여러 분석기 중 하나이며, 관망 분석 결과는
/// "의견 없음"으로 변환됩니다.
pub struct LevelSignalSource {
    analyzer: LevelAnalyzer,
}

impl LevelSignalSource {
    /// 분석기로부터 소스 생성
    pub fn new(analyzer: LevelAnalyzer) -> Self {
        LevelSignalSource { analyzer }
    }

    /// 검증된 설정으로 소스 생성
    pub fn with_config(config: LevelConfig) -> ConfigResult<Self> {
        Ok(LevelSignalSource {
            analyzer: LevelAnalyzer::new(config)?,
        })
    }

    /// 기본 이름/가중치/우선순위의 레지스트리 정의 생성
    pub fn definition<C: Candle>(config: LevelConfig) -> ConfigResult<AnalyzerDefinition<C>> {
        let source = Self::with_config(config)?;
        Ok(AnalyzerDefinition::new(
            LEVEL_SOURCE_NAME,
            LEVEL_SOURCE_WEIGHT,
            LEVEL_SOURCE_PRIORITY,
            Arc::new(source),
        ))
    }

    /// 내부 분석기 참조 반환
    pub fn analyzer(&self) -> &LevelAnalyzer {
        &self.analyzer
    }
}

#[async_trait]
impl<C: Candle> SignalSource<C> for LevelSignalSource {
    async fn evaluate(
        &self,
        snapshot: &MarketSnapshot<C>,
    ) -> Result<Option<AnalyzerSignal>, String> {
        Ok(self.analyzer.generate_signal(snapshot))
    }
}
