//! 설정 로드.
//!
//! 우선순위 (뒤가 앞을 덮어쓴다):
//! 1. 내장 기본값 (`AppConfig::default_config`)
//! 2. `--config` 파일 (TOML/JSON, 확장자로 판별)
//! 3. `VIGIL__` 접두사 환경 변수 (`VIGIL__MATCHING__THRESHOLD=0.9`)
//! 4. CLI 플래그 (main에서 적용)

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use tracing::debug;
use vigil_core::config::AppConfig;

/// 환경 변수 접두사
pub const ENV_PREFIX: &str = "VIGIL";
/// 접두사/섹션 구분자
pub const ENV_SEPARATOR: &str = "__";

/// 계층 설정 로드 + 검증
///
/// `env`가 `Some`이면 프로세스 환경 대신 주어진 맵을 읽는다.
pub fn load(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<AppConfig> {
    let defaults = Config::try_from(&AppConfig::default_config()).context("기본 설정 직렬화 실패")?;

    let mut builder = Config::builder().add_source(defaults);

    if let Some(path) = path {
        debug!(path = %path.display(), "설정 파일 로드");
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env),
    );

    let config: AppConfig = builder
        .build()
        .context("설정 병합 실패")?
        .try_deserialize()
        .context("설정 역직렬화 실패")?;

    config.validate().context("설정 검증 실패")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn defaults_without_sources() {
        let config = load(None, no_env()).unwrap();
        assert_eq!(config.matching.threshold, 0.8);
        assert_eq!(config.matching.max_results, 10);
        assert_eq!(config.recognizer.language, "eng");
        assert_eq!(config.recognizer.psm, 6);
        assert_eq!(config.templates.cache_capacity, 32);
        assert_eq!(config.sweep.interval_ms, 1_000);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.toml");
        std::fs::write(
            &path,
            r#"
[matching]
threshold = 0.92
overlap = 0.5

[recognizer]
language = "kor"

[recognizer.extra_vars]
tessedit_char_whitelist = "0123456789"

[templates]
directory = "assets/templates"
"#,
        )
        .unwrap();

        let config = load(Some(&path), no_env()).unwrap();
        assert_eq!(config.matching.threshold, 0.92);
        assert_eq!(config.matching.overlap, 0.5);
        assert_eq!(config.matching.max_results, 10, "미지정 필드는 기본값 유지");
        assert_eq!(config.recognizer.language, "kor");
        assert_eq!(
            config.recognizer.extra_vars.get("tessedit_char_whitelist").map(String::as_str),
            Some("0123456789")
        );
        assert_eq!(config.templates.directory, Path::new("assets/templates"));
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.json");
        std::fs::write(&path, r#"{ "matching": { "threshold": 0.7 } }"#).unwrap();

        let env = HashMap::from([
            ("VIGIL__MATCHING__THRESHOLD".to_string(), "0.95".to_string()),
            ("VIGIL__SWEEP__CYCLES".to_string(), "3".to_string()),
        ]);
        let config = load(Some(&path), Some(env)).unwrap();
        assert_eq!(config.matching.threshold, 0.95);
        assert_eq!(config.sweep.cycles, 3);
    }

    #[test]
    fn invalid_values_rejected() {
        let env = HashMap::from([("VIGIL__MATCHING__THRESHOLD".to_string(), "1.5".to_string())]);
        let err = load(None, Some(env)).unwrap_err();
        assert!(format!("{err:#}").contains("matching.threshold"));
    }

    #[test]
    fn missing_file_is_error() {
        assert!(load(Some(Path::new("/nonexistent/vigil.toml")), no_env()).is_err());
    }
}
