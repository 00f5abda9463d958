//! AI Provider 接口模块
//!
//! 定义 AI Provider 的统一接口。

// 子模块
pub mod openai;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::constants::{
    COMPLETION_STOP, DEFAULT_FREQUENCY_PENALTY, DEFAULT_MAX_TOKENS, DEFAULT_PRESENCE_PENALTY,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
use crate::infra::error::Result;

/// 补全请求
///
/// 单次文本补全调用的全部参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// 模型名称
    pub model: String,
    /// 拼装好的提示词
    pub prompt: String,
    /// 温度参数
    pub temperature: f32,
    /// 回复最大 Token 数
    pub max_tokens: u32,
    /// top_p
    pub top_p: f32,
    /// frequency_penalty
    pub frequency_penalty: f32,
    /// presence_penalty
    pub presence_penalty: f32,
    /// 停止序列
    pub stop: Vec<String>,
}

impl CompletionRequest {
    /// 以默认参数创建补全请求
    ///
    /// # 参数说明
    /// * `model` - 模型名称
    /// * `prompt` - 提示词
    pub fn new(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
            stop: vec![COMPLETION_STOP.to_string()],
        }
    }
}

/// 补全响应
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// 响应 ID
    pub id: String,
    /// 补全文本（已剔除结束标记并去除首尾空白）
    pub text: String,
    /// Token 使用统计
    pub usage: TokenUsage,
}

/// Token 使用统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// 提示词 Token 数
    pub prompt_tokens: u32,
    /// 完成 Token 数
    pub completion_tokens: u32,
    /// 总 Token 数
    pub total_tokens: u32,
}

/// AI Provider Trait
///
/// 定义 AI Provider 的统一接口
///
/// # 实现要求
/// - 必须实现 `Send + Sync`
/// - 速率限制错误必须映射为 `Error::RateLimited`，供上层决定重试
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// 获取 Provider 名称
    fn name(&self) -> &str;

    /// 发送补全请求
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// 生成图片，返回图片 URL
    async fn create_image(&self, prompt: &str) -> Result<String>;
}

/// AI Provider 注册表
///
/// 管理所有注册的 Provider
#[derive(Clone)]
pub struct ProviderRegistry {
    /// Provider 映射
    providers: Arc<dashmap::DashMap<String, Arc<dyn AiProvider>>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers_count", &self.providers.len())
            .finish()
    }
}

impl ProviderRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self {
            providers: Arc::new(dashmap::DashMap::new()),
        }
    }

    /// 注册 Provider
    pub fn register<P: AiProvider + 'static>(&self, provider: P) {
        let name = provider.name().to_string();
        self.providers.insert(name.clone(), Arc::new(provider));
        tracing::info!(provider = name, "Provider 注册成功");
    }

    /// 获取 Provider
    pub fn get(&self, name: &str) -> Option<Arc<dyn AiProvider>> {
        self.providers.get(name).map(|p| p.clone())
    }

    /// 检查 Provider 是否存在
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// 列出所有 Provider
    pub fn list(&self) -> Vec<String> {
        self.providers.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
