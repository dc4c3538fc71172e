use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// メディア読み込み設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// リモートURL取得のタイムアウト（秒）
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// `autoplay` に値が無い場合の再生開始遅延（秒）
    #[serde(default = "default_autoplay_delay")]
    pub default_autoplay_delay_secs: u64,
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_autoplay_delay() -> u64 {
    1
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
            default_autoplay_delay_secs: default_autoplay_delay(),
        }
    }
}

/// スライドショー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideShowSettings {
    /// 自動送りの最小間隔（秒）
    #[serde(default = "default_min_autoplay_delay")]
    pub min_autoplay_delay_secs: u64,
}

fn default_min_autoplay_delay() -> u64 {
    3
}

impl Default for SlideShowSettings {
    fn default() -> Self {
        Self {
            min_autoplay_delay_secs: default_min_autoplay_delay(),
        }
    }
}

/// ポップアップ設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopupSettings {
    /// 受信した更新イベントをJSONでstderrに出力する
    #[serde(default)]
    pub echo_events: bool,
}

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// ログレベル（`RUST_LOG` が未設定の場合に使用）
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub slideshow: SlideShowSettings,
    #[serde(default)]
    pub popup: PopupSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            media: MediaConfig::default(),
            slideshow: SlideShowSettings::default(),
            popup: PopupSettings::default(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み（存在しない場合はデフォルトを作成して保存）
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// 指定パスから読み込み
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
            Ok(config)
        } else {
            // 初回起動時はデフォルト設定をファイルに保存
            let config = Self::default();
            if let Err(e) = config.save_to(config_path) {
                tracing::warn!("Failed to save default config: {}", e);
            }
            Ok(config)
        }
    }

    /// 設定ファイルパスを取得
    pub fn config_path() -> Result<PathBuf> {
        // ~/.config/notification-agent/config.toml を使用
        let base_dirs = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))?;
        Ok(base_dirs.home_dir().join(".config/notification-agent/config.toml"))
    }

    /// 現在の設定をファイルに保存
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }
}
