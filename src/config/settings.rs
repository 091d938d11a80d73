//! JSON 설정 파일
//!
//! 임의의 키를 가진 JSON 객체 하나를 고정 경로에 보관합니다. 시작 시 한 번 읽고
//! (`load`, 파일이 없으면 빈 설정), 값은 메모리에서 읽고 쓰며, 디스크 반영은 `save()`를
//! 호출할 때만 일어납니다.
//!
//! | 타입 | 파일 | 용도 |
//! |------|------|------|
//! | `AppConfig` | `config.json` | 사용자별 애플리케이션 설정 |
//! | `GlobalConfig` | `global.json` | 설치 단위 공용 설정 |

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use log::{debug, info};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use crate::config::PathConfig;
use crate::core::errors::{AppError, AppResult};
use crate::core::provider::ServiceProvider;
use crate::core::registry::{Construct, Lifetime};

/// 디스크에 저장되는 키-값 설정
#[derive(Debug)]
pub struct SettingsFile {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl SettingsFile {
    /// 파일을 읽습니다. 파일이 없으면 빈 설정으로 시작합니다.
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| AppError::SettingsError(format!("{}: {}", path.display(), e)))?;
            if raw.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str::<Map<String, Value>>(&raw)
                    .map_err(|e| AppError::SettingsError(format!("{}: {}", path.display(), e)))?
            }
        } else {
            debug!("Settings file {} not found, starting empty", path.display());
            Map::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 키가 없으면 `Ok(None)`, 값의 형식이 맞지 않으면 `SettingsError`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let values = self.values.read();
        match values.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| AppError::SettingsError(format!("{}: {}", key, e))),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> AppResult<()> {
        let value = serde_json::to_value(value).map_err(|e| AppError::SettingsError(format!("{}: {}", key, e)))?;
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> bool {
        self.values.write().remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// 현재 값을 파일에 기록합니다. 상위 디렉터리가 없으면 만듭니다.
    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::SettingsError(format!("{}: {}", parent.display(), e)))?;
        }

        let json = serde_json::to_string_pretty(&*self.values.read())
            .map_err(|e| AppError::SettingsError(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| AppError::SettingsError(format!("{}: {}", self.path.display(), e)))?;

        info!("💾 Settings saved to {}", self.path.display());
        Ok(())
    }
}

/// 애플리케이션 설정 (`config.json`)
#[derive(Debug)]
pub struct AppConfig(SettingsFile);

impl AppConfig {
    pub const FILE_NAME: &'static str = "config.json";

    pub fn load_from(dir: &Path) -> AppResult<Self> {
        SettingsFile::load(dir.join(Self::FILE_NAME)).map(Self)
    }
}

impl Deref for AppConfig {
    type Target = SettingsFile;

    fn deref(&self) -> &SettingsFile {
        &self.0
    }
}

impl Construct for AppConfig {
    const LIFETIME: Lifetime = Lifetime::Singleton;

    fn construct(_: &ServiceProvider) -> AppResult<Self> {
        Self::load_from(&PathConfig::config_dir())
    }
}

/// 공용 설정 (`global.json`)
#[derive(Debug)]
pub struct GlobalConfig(SettingsFile);

impl GlobalConfig {
    pub const FILE_NAME: &'static str = "global.json";

    pub fn load_from(dir: &Path) -> AppResult<Self> {
        SettingsFile::load(dir.join(Self::FILE_NAME)).map(Self)
    }
}

impl Deref for GlobalConfig {
    type Target = SettingsFile;

    fn deref(&self) -> &SettingsFile {
        &self.0
    }
}

impl Construct for GlobalConfig {
    const LIFETIME: Lifetime = Lifetime::Singleton;

    fn construct(_: &ServiceProvider) -> AppResult<Self> {
        Self::load_from(&PathConfig::config_dir())
    }
}

crate::register_service!(AppConfig, GlobalConfig);

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct WindowPlacement {
        width: u32,
        height: u32,
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(dir.path()).unwrap();

        assert!(config.keys().is_empty());
        assert_eq!(config.get::<String>("theme").unwrap(), None);
        assert_eq!(config.path(), dir.path().join("config.json"));
    }

    #[test]
    fn test_set_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let config = GlobalConfig::load_from(dir.path()).unwrap();
        config.set("theme", "dark").unwrap();
        config
            .set("placement", WindowPlacement { width: 800, height: 450 })
            .unwrap();
        config.save().unwrap();

        let reloaded = GlobalConfig::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.get::<String>("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(
            reloaded.get::<WindowPlacement>("placement").unwrap(),
            Some(WindowPlacement { width: 800, height: 450 })
        );
    }

    #[test]
    fn test_wrong_type_is_settings_error() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(dir.path()).unwrap();
        config.set("volume", "loud").unwrap();

        assert!(matches!(config.get::<u8>("volume"), Err(AppError::SettingsError(_))));
        assert!(config.remove("volume"));
        assert!(!config.remove("volume"));
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(AppConfig::FILE_NAME), "[1, 2, 3]").unwrap();

        assert!(matches!(AppConfig::load_from(dir.path()), Err(AppError::SettingsError(_))));
    }
}
