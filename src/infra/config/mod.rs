//! 配置管理系统模块
//!
//! 本模块负责加载和管理系统配置。
//!
//! # 配置文件示例
//! ```toml
//! [ai]
//! default_provider = "openai"
//!
//! [ai.providers.openai]
//! api_key = "${OPENAI_API_KEY}"
//! model = "text-davinci-003"
//!
//! [session]
//! character_desc = "你是一个乐于助人的助手。"
//! conversation_max_tokens = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{env, fs};

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// AI 配置
    #[serde(default)]
    pub ai: AiConfig,
    /// 会话配置
    #[serde(default)]
    pub session: SessionSettings,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// AI 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AiConfig {
    /// 默认 Provider
    pub default_provider: Option<String>,
    /// Provider 配置
    #[serde(default)]
    pub providers: std::collections::HashMap<String, ProviderConfig>,
}

/// AI Provider 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// API Key
    pub api_key: Option<String>,
    /// Base URL
    pub base_url: Option<String>,
    /// HTTP 代理地址
    pub proxy: Option<String>,
    /// 模型名称
    pub model: Option<String>,
    /// 温度参数
    pub temperature: Option<f32>,
    /// 最大 Token 数
    pub max_tokens: Option<u32>,
    /// 生成图片的尺寸（如 "256x256"）
    pub image_size: Option<String>,
}

/// 会话配置
///
/// 控制对话记忆的保留和提示词拼装。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionSettings {
    /// 角色描述（提示词前导，可为空）
    pub character_desc: Option<String>,
    /// 历史记忆的最大累计字符数
    pub conversation_max_tokens: Option<usize>,
    /// 淘汰策略（"legacy" 或 "trim"）
    pub eviction: Option<String>,
    /// 轮次分隔标记
    pub sentinel: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingSettings {
    /// 日志级别
    pub level: Option<String>,
    /// 日志文件路径
    pub file_path: Option<PathBuf>,
}

/// 配置加载器
#[derive(Debug, Clone)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// 创建新的配置加载器
    pub fn new() -> Self {
        Self
    }

    /// 加载配置
    ///
    /// 文件不存在时回退到默认配置。
    pub async fn load(&self, path: &str) -> Result<Config, super::error::Error> {
        tracing::info!(path = path, "加载配置文件");

        if !PathBuf::from(path).exists() {
            tracing::warn!(path = path, "配置文件不存在，使用默认配置");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| super::error::Error::Config(format!("读取配置文件失败: {}", e)))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| super::error::Error::Config(format!("解析配置文件失败: {}", e)))?;

        // 环境变量替换
        self.substitute_env_vars(&mut config);

        tracing::info!("配置加载成功");
        Ok(config)
    }

    /// 替换环境变量
    ///
    /// 将 `${VAR_NAME}` 格式的字符串替换为对应的环境变量值
    fn substitute_env_vars(&self, config: &mut Config) {
        for (_, provider) in &mut config.ai.providers {
            if let Some(api_key) = &provider.api_key {
                provider.api_key = Some(self.replace_env_vars(api_key));
            }
            if let Some(base_url) = &provider.base_url {
                provider.base_url = Some(self.replace_env_vars(base_url));
            }
            if let Some(proxy) = &provider.proxy {
                provider.proxy = Some(self.replace_env_vars(proxy));
            }
        }
    }

    /// 替换字符串中的环境变量
    fn replace_env_vars(&self, input: &str) -> String {
        let pattern = r"\$\{([^}]+)\}";

        let re = regex::Regex::new(pattern).unwrap();
        let result = re.replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
        });

        result.to_string()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
