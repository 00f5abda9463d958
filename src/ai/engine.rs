//! AI 引擎模块
//!
//! 负责协调 AI Provider、会话记忆和回复生成。
//!
//! # 处理流程
//! ```text
//! 1. 接收用户请求
//! 2. 控制命令直接操作会话存储
//! 3. 其余请求：读取会话历史，拼装提示词
//! 4. 调用 Provider 补全（速率限制时重试一次）
//! 5. 成功后保存新一轮问答并执行淘汰
//! ```

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::constants::{
    CMD_CLEAR_ALL, CMD_CLEAR_MEMORY, DEFAULT_PROVIDER, OPENAI_DEFAULT_MODEL, PROVIDER_OPENAI,
    RATE_LIMIT_MAX_RETRIES, RATE_LIMIT_RETRY_DELAY, REPLY_ALL_CLEARED, REPLY_IMAGE_FAILED,
    REPLY_MEMORY_CLEARED, REPLY_RATE_LIMITED, REPLY_RETRY_LATER,
};
use super::provider::openai::{OpenAiConfig, OpenAiProvider};
use super::provider::{AiProvider, CompletionRequest, ProviderRegistry};
use crate::core::message::types::{Context, ContextKind, Reply};
use crate::core::session::{PromptBuilder, SessionConfig, SessionStore};
use crate::infra::config::{AiConfig, Config};
use crate::infra::error::{Error, Result};

/// AI 引擎
///
/// 协调 Provider 调用与会话记忆
///
/// # 字段说明
/// * `registry` - Provider 注册表
/// * `store` - 会话存储
/// * `prompt_builder` - 提示词拼装器
/// * `default_provider` - 默认 Provider 名称
#[derive(Clone)]
pub struct CompletionEngine {
    /// Provider 注册表
    registry: Arc<ProviderRegistry>,
    /// 会话存储
    store: SessionStore,
    /// 提示词拼装器
    prompt_builder: PromptBuilder,
    /// 默认 Provider 名称
    default_provider: Option<String>,
    /// 补全模型名称
    model: String,
    /// 温度参数覆盖
    temperature: Option<f32>,
    /// 最大 Token 数覆盖
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for CompletionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionEngine")
            .field("registry", &self.registry)
            .field("default_provider", &self.default_provider)
            .field("model", &self.model)
            .finish()
    }
}

impl CompletionEngine {
    /// 从主配置创建 AI 引擎
    ///
    /// # 参数说明
    /// * `config` - 主配置
    pub fn new(config: &Config) -> Self {
        let registry = Arc::new(ProviderRegistry::new());
        Self::register_providers(&registry, &config.ai);

        let session_config = SessionConfig::from_settings(&config.session);
        let prompt_builder = PromptBuilder::from_config(&session_config);
        let store = SessionStore::new(session_config);

        // 解析默认 Provider 的模型与参数
        let provider_name = config
            .ai
            .default_provider
            .clone()
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let provider_config = config.ai.providers.get(&provider_name);

        Self {
            registry,
            store,
            prompt_builder,
            default_provider: Some(provider_name.clone()),
            model: provider_config
                .and_then(|p| p.model.clone())
                .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            temperature: provider_config.and_then(|p| p.temperature),
            max_tokens: provider_config.and_then(|p| p.max_tokens),
        }
    }

    /// 从 Provider 注册表创建 AI 引擎
    ///
    /// 用于测试或手动注册 Provider 的场景
    ///
    /// # 参数说明
    /// * `registry` - 已配置的 Provider 注册表
    /// * `session_config` - 会话配置
    pub fn with_registry(registry: Arc<ProviderRegistry>, session_config: SessionConfig) -> Self {
        let prompt_builder = PromptBuilder::from_config(&session_config);
        let store = SessionStore::new(session_config);

        Self {
            registry,
            store,
            prompt_builder,
            default_provider: None,
            model: OPENAI_DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// 注册所有配置的 Provider
    fn register_providers(registry: &ProviderRegistry, ai_config: &AiConfig) {
        for (name, provider_config) in &ai_config.providers {
            debug!(provider = %name, "注册 Provider");

            match name.as_str() {
                PROVIDER_OPENAI => {
                    let config = OpenAiConfig {
                        api_key: provider_config.api_key.clone().unwrap_or_default(),
                        base_url: provider_config.base_url.clone(),
                        proxy: provider_config.proxy.clone(),
                        model: provider_config.model.clone(),
                        image_size: provider_config.image_size.clone(),
                    };
                    registry.register(OpenAiProvider::new(config));
                }
                _ => {
                    warn!(provider = %name, "未支持的 Provider 类型");
                }
            }
        }
    }

    /// 获取 Provider
    ///
    /// 按名称、默认配置、首个可用的顺序解析
    pub fn get_provider(&self, name: Option<&str>) -> Option<Arc<dyn AiProvider>> {
        let provider_name = name.or(self.default_provider.as_deref());

        if let Some(name) = provider_name {
            self.registry.get(name)
        } else {
            self.registry
                .list()
                .first()
                .and_then(|name| self.registry.get(name))
        }
    }

    /// 获取会话存储
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// 处理一次用户请求并生成回复
    ///
    /// # 参数说明
    /// * `query` - 用户输入文本
    /// * `context` - 入站上下文
    ///
    /// # 返回值
    /// 带类型标记的回复
    #[instrument(skip(self, query), fields(session_id = %context.session_id))]
    pub async fn reply(&self, query: &str, context: &Context) -> Result<Reply> {
        match context.kind {
            ContextKind::Text => self.reply_text(query, &context.session_id).await,
            ContextKind::ImageCreate => self.reply_image(query).await,
        }
    }

    /// 处理文本对话请求
    async fn reply_text(&self, query: &str, session_id: &str) -> Result<Reply> {
        info!(session_id = session_id, "收到文本请求");

        // 控制命令不经过模型
        if query == CMD_CLEAR_MEMORY {
            self.store.clear(session_id);
            return Ok(Reply::info(REPLY_MEMORY_CLEARED));
        }
        if query == CMD_CLEAR_ALL {
            self.store.clear_all();
            return Ok(Reply::info(REPLY_ALL_CLEARED));
        }

        let provider = self
            .get_provider(None)
            .ok_or_else(|| Error::Ai("没有可用的 Provider".to_string()))?;

        let session = self.store.get(session_id);
        let prompt = self.prompt_builder.build(query, session.as_ref());
        debug!(
            session_id = session_id,
            prompt_chars = prompt.chars().count(),
            "拼装会话提示词"
        );

        let content = self
            .complete_with_retry(provider.as_ref(), &prompt, session_id)
            .await;

        // 补全与提问都非空才计入历史
        if !content.is_empty() && !query.is_empty() {
            self.store.save(query, &content, session_id);
        }

        Ok(Reply::text(&content))
    }

    /// 调用补全接口，速率限制时重试一次
    ///
    /// 重试仍失败返回速率限制致歉语；其他失败清空该用户会话后
    /// 返回通用致歉语。致歉语作为普通回复文本返回，不向上传播错误。
    async fn complete_with_retry(
        &self,
        provider: &dyn AiProvider,
        prompt: &str,
        session_id: &str,
    ) -> String {
        let mut request = CompletionRequest::new(&self.model, prompt);
        if let Some(temperature) = self.temperature {
            request.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            request.max_tokens = max_tokens;
        }

        let mut retry_count = 0;
        loop {
            match provider.complete(&request).await {
                Ok(response) => {
                    info!(session_id = session_id, "补全成功");
                    return response.text;
                }
                Err(Error::RateLimited(msg)) => {
                    warn!(error = %msg, "触发速率限制");
                    if retry_count < RATE_LIMIT_MAX_RETRIES {
                        retry_count += 1;
                        tokio::time::sleep(RATE_LIMIT_RETRY_DELAY).await;
                        warn!(retry = retry_count, "速率限制超额，重试");
                        continue;
                    }
                    return REPLY_RATE_LIMITED.to_string();
                }
                Err(e) => {
                    // 上下文视为已损坏，整体丢弃
                    error!(error = %e, session_id = session_id, "补全调用失败，清空会话");
                    self.store.clear(session_id);
                    return REPLY_RETRY_LATER.to_string();
                }
            }
        }
    }

    /// 处理图片生成请求
    async fn reply_image(&self, query: &str) -> Result<Reply> {
        info!("收到图片生成请求");

        let provider = self
            .get_provider(None)
            .ok_or_else(|| Error::Ai("没有可用的 Provider".to_string()))?;

        let mut retry_count = 0;
        loop {
            match provider.create_image(query).await {
                Ok(url) => return Ok(Reply::image_url(&url)),
                Err(Error::RateLimited(msg)) => {
                    warn!(error = %msg, "图片生成触发速率限制");
                    if retry_count < RATE_LIMIT_MAX_RETRIES {
                        retry_count += 1;
                        tokio::time::sleep(RATE_LIMIT_RETRY_DELAY).await;
                        continue;
                    }
                    return Ok(Reply::error(REPLY_RATE_LIMITED));
                }
                Err(e) => {
                    error!(error = %e, "图片生成失败");
                    return Ok(Reply::error(REPLY_IMAGE_FAILED));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::types::ReplyKind;

    fn empty_engine() -> CompletionEngine {
        CompletionEngine::with_registry(
            Arc::new(ProviderRegistry::new()),
            SessionConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_clear_memory_command_skips_provider() {
        // 控制命令在解析 Provider 之前处理，空注册表也能执行
        let engine = empty_engine();
        engine.store().save("q", "a", "u");

        let reply = engine
            .reply(CMD_CLEAR_MEMORY, &Context::text("u"))
            .await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::Info);
        assert_eq!(reply.content, REPLY_MEMORY_CLEARED);
        assert!(engine.store().get("u").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_command() {
        let engine = empty_engine();
        engine.store().save("q1", "a1", "alice");
        engine.store().save("q2", "a2", "bob");

        let reply = engine
            .reply(CMD_CLEAR_ALL, &Context::text("alice"))
            .await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::Info);
        assert_eq!(reply.content, REPLY_ALL_CLEARED);
        assert!(engine.store().get("alice").is_none());
        assert!(engine.store().get("bob").is_none());
    }

    #[tokio::test]
    async fn test_text_without_provider_is_an_error() {
        let engine = empty_engine();

        let result = engine.reply("你好", &Context::text("u")).await;
        assert!(result.is_err());
    }
}
