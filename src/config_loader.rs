use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// 설정 로드 오류
#[derive(Debug)]
pub enum ConfigError {
    /// 파일 오류
    FileError(String),
    /// 파싱 오류
    ParseError(String),
    /// 유효성 검사 오류
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileError(msg) => write!(f, "설정 파일 오류: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "설정 파싱 오류: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "설정 유효성 검사 오류: {}", msg),
        }
    }
}

/// String으로 ConfigError 변환
impl From<ConfigError> for String {
    fn from(err: ConfigError) -> Self {
        err.to_string()
    }
}

/// 설정 로드 결과
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 설정 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON 형식
    Json,
    /// TOML 형식
    Toml,
    /// 자동 감지 (파일 확장자로부터)
    Auto,
}

/// 설정 유효성 검사 트레이트
///
/// 설정 값이 유효 범위를 벗어나면 `ConfigError::ValidationError`를
/// 반환해야 합니다. 유효성 오류는 복구하지 않고 호출자에게 그대로
/// 전파됩니다 (설정 실수는 런타임 데이터 공백이 아니기 때문).
pub trait ConfigValidation {
    /// 설정 유효성 검사
    fn validate(&self) -> ConfigResult<()>;
}

/// 설정 파일 로더
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// 파일에서 설정 로드
    ///
    /// # Arguments
    /// * `path` - 설정 파일 경로
    /// * `format` - 설정 파일 형식 (Auto면 확장자로 감지)
    ///
    /// # Returns
    /// * `ConfigResult<T>` - 검증을 통과한 설정 객체 또는 오류
    pub fn load_from_file<T>(path: &Path, format: ConfigFormat) -> ConfigResult<T>
    where
        T: DeserializeOwned + ConfigValidation,
    {
        debug!("설정 파일 로드 시작: {}", path.display());

        let format = match format {
            ConfigFormat::Auto => Self::detect_format(path)?,
            other => other,
        };

        let content = fs::read_to_string(path).map_err(|e| {
            error!("설정 파일 읽기 실패: {} - {}", path.display(), e);
            ConfigError::FileError(format!("파일 읽기 실패: {}", e))
        })?;

        let config = Self::load_from_string(&content, format)?;
        info!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 문자열에서 설정 로드
    ///
    /// # Arguments
    /// * `content` - 설정 문자열
    /// * `format` - 설정 형식 (Auto면 JSON 먼저 시도 후 TOML 시도)
    ///
    /// # Returns
    /// * `ConfigResult<T>` - 검증을 통과한 설정 객체 또는 오류
    pub fn load_from_string<T>(content: &str, format: ConfigFormat) -> ConfigResult<T>
    where
        T: DeserializeOwned + ConfigValidation,
    {
        let config: T = match format {
            ConfigFormat::Json => Self::parse_json(content)?,
            ConfigFormat::Toml => Self::parse_toml(content)?,
            ConfigFormat::Auto => match Self::parse_json::<T>(content) {
                Ok(config) => config,
                Err(_) => Self::parse_toml(content)?,
            },
        };

        config.validate().inspect_err(|e| {
            error!("설정 유효성 검사 실패: {}", e);
        })?;

        Ok(config)
    }

    /// JSON 파싱
    fn parse_json<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
        serde_json::from_str(content).map_err(|e| {
            warn!("JSON 파싱 실패: {}", e);
            ConfigError::ParseError(format!("JSON 파싱 실패: {}", e))
        })
    }

    /// TOML 파싱
    fn parse_toml<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
        toml::from_str(content).map_err(|e| {
            warn!("TOML 파싱 실패: {}", e);
            ConfigError::ParseError(format!("TOML 파싱 실패: {}", e))
        })
    }

    /// 파일 확장자로부터 형식 감지
    fn detect_format(path: &Path) -> ConfigResult<ConfigFormat> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => {
                warn!("지원되지 않는 파일 형식: {}", path.display());
                Err(ConfigError::FileError(format!(
                    "파일 형식을 감지할 수 없음: {}",
                    path.display()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        pub name: String,
        pub threshold: f64,
        pub enabled: bool,
    }

    impl ConfigValidation for TestConfig {
        fn validate(&self) -> ConfigResult<()> {
            if self.threshold < 0.0 {
                return Err(ConfigError::ValidationError(
                    "threshold는 0 이상이어야 합니다".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[test]
    fn test_load_from_json_string() {
        let json = r#"{"name":"levels","threshold":0.5,"enabled":true}"#;
        let config =
            ConfigLoader::load_from_string::<TestConfig>(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.name, "levels");
        assert_eq!(config.threshold, 0.5);
        assert!(config.enabled);
    }

    #[test]
    fn test_load_from_toml_string() {
        let toml_str = r#"
            name = "levels"
            threshold = 0.5
            enabled = false
        "#;
        let config =
            ConfigLoader::load_from_string::<TestConfig>(toml_str, ConfigFormat::Toml).unwrap();
        assert_eq!(config.name, "levels");
        assert!(!config.enabled);
    }

    #[test]
    fn test_auto_format_falls_back_to_toml() {
        let toml_str = "name = \"levels\"\nthreshold = 1.0\nenabled = true\n";
        let config =
            ConfigLoader::load_from_string::<TestConfig>(toml_str, ConfigFormat::Auto).unwrap();
        assert_eq!(config.threshold, 1.0);
    }

    #[test]
    fn test_validation_error() {
        let json = r#"{"name":"levels","threshold":-0.1,"enabled":true}"#;
        let result = ConfigLoader::load_from_string::<TestConfig>(json, ConfigFormat::Json);
        match result {
            Err(ConfigError::ValidationError(_)) => (),
            _ => panic!("유효성 검사 오류가 발생해야 함"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("levels.toml");
        std::fs::write(&path, "name = \"levels\"\nthreshold = 0.3\nenabled = true\n").unwrap();

        let config = ConfigLoader::load_from_file::<TestConfig>(&path, ConfigFormat::Auto).unwrap();
        assert_eq!(config.name, "levels");
        assert_eq!(config.threshold, 0.3);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("levels.yaml");
        std::fs::write(&path, "name: levels\n").unwrap();

        let result = ConfigLoader::load_from_file::<TestConfig>(&path, ConfigFormat::Auto);
        match result {
            Err(ConfigError::FileError(_)) => (),
            _ => panic!("파일 형식 감지 오류가 발생해야 함"),
        }
    }
}
