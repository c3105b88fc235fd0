//! 配置加载
//!
//! 加载顺序：配置文件 -> 环境变量覆盖 -> 验证。

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::PanelConfig;
use crate::keyboard::KeyBindings;
use crate::utils::{app_error, AppResult};

/// 工作目录下的配置文件名
pub const LOCAL_CONFIG_FILE: &str = "termplex.toml";
/// 用户配置目录下的子目录名
pub const CONFIG_DIR_NAME: &str = "termplex";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_DEFAULT_SHELL: &str = "TERMPLEX_DEFAULT_SHELL";
pub const ENV_PORTS_REFRESH_MS: &str = "TERMPLEX_PORTS_REFRESH_MS";
pub const ENV_WORKER_QUEUE: &str = "TERMPLEX_WORKER_QUEUE";

impl PanelConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        debug!("从文件加载配置: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;

        info!("配置加载成功: {:?}", path);
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("序列化配置失败")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建配置目录失败: {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        info!("配置保存成功: {:?}", path);
        Ok(())
    }

    /// 从环境变量覆盖配置
    pub fn override_from_env(&mut self) -> AppResult<()> {
        self.override_with(|name| std::env::var(name).ok())
    }

    /// 使用给定的变量查询函数覆盖配置
    pub fn override_with<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_DEFAULT_SHELL) {
            self.terminal.default_shell = val
                .parse()
                .map_err(app_error)
                .with_context(|| format!("{} 无效", ENV_DEFAULT_SHELL))?;
            debug!("从环境变量设置 terminal.default_shell = {}", val);
        }

        if let Some(val) = lookup(ENV_PORTS_REFRESH_MS) {
            self.ports.refresh_interval_ms = val
                .trim()
                .parse()
                .with_context(|| format!("{} 无效: {}", ENV_PORTS_REFRESH_MS, val))?;
            debug!("从环境变量设置 ports.refresh_interval_ms = {}", val);
        }

        if let Some(val) = lookup(ENV_WORKER_QUEUE) {
            self.worker.queue_capacity = val
                .trim()
                .parse()
                .with_context(|| format!("{} 无效: {}", ENV_WORKER_QUEUE, val))?;
            debug!("从环境变量设置 worker.queue_capacity = {}", val);
        }

        Ok(())
    }

    /// 验证配置的有效性
    ///
    /// 快捷键配置单独处理：无效时回退到默认绑定而不是拒绝整个配置。
    pub fn validate(&self) -> AppResult<()> {
        if self.ports.refresh_interval_ms == 0 {
            bail!("ports.refresh_interval_ms 不能为0");
        }
        if self.ports.min_refresh_interval_ms > self.ports.refresh_interval_ms {
            bail!("ports.min_refresh_interval_ms 不能大于 ports.refresh_interval_ms");
        }
        if self.worker.queue_capacity == 0 {
            bail!("worker.queue_capacity 不能为0");
        }

        debug!("配置验证通过");
        Ok(())
    }

    /// 解析快捷键绑定，配置无效时使用默认值
    pub fn key_bindings(&self) -> KeyBindings {
        KeyBindings::resolve(&self.keybindings)
    }
}

/// 按优先级查找配置文件：显式路径 -> 工作目录 -> 用户配置目录
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

/// 加载配置：文件 -> 环境变量 -> 验证
///
/// 显式指定的文件必须存在；没有找到配置文件时使用默认值。
pub fn load_config(explicit: Option<&Path>) -> AppResult<PanelConfig> {
    let mut config = match find_config_file(explicit) {
        Some(path) => PanelConfig::from_file(&path)?,
        None => {
            debug!("未找到配置文件，使用默认配置");
            PanelConfig::default()
        }
    };

    config.override_from_env()?;
    config.validate().context("配置验证失败")?;
    Ok(config)
}
