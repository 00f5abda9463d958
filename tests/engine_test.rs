//! 引擎回复流程集成测试
//!
//! 用可编程的 Provider 桩驱动完整回复流程，
//! 覆盖重试、致歉与会话清空策略。

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use qabot::ai::constants::{
    CMD_CLEAR_MEMORY, REPLY_IMAGE_FAILED, REPLY_MEMORY_CLEARED, REPLY_RATE_LIMITED,
    REPLY_RETRY_LATER,
};
use qabot::ai::provider::{
    AiProvider, CompletionRequest, CompletionResponse, ProviderRegistry, TokenUsage,
};
use qabot::ai::CompletionEngine;
use qabot::core::message::types::{Context, ReplyKind};
use qabot::core::session::SessionConfig;
use qabot::infra::error::{Error, Result};

/// 可编程的 Provider 桩
struct MockProvider {
    /// 先返回这么多次速率限制错误
    rate_limit_failures: AtomicU32,
    /// 是否总是返回非速率限制错误
    fail_other: bool,
    /// 成功时返回的补全文本
    completion_text: String,
    /// 成功时返回的图片 URL（None 表示图片生成失败）
    image_url: Option<String>,
    /// 补全调用次数
    calls: AtomicU32,
    /// 最近一次收到的提示词
    last_prompt: Mutex<Option<String>>,
}

impl MockProvider {
    fn ok(text: &str) -> Self {
        Self {
            rate_limit_failures: AtomicU32::new(0),
            fail_other: false,
            completion_text: text.to_string(),
            image_url: Some("https://example.com/cat.png".to_string()),
            calls: AtomicU32::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    fn rate_limited(times: u32, then_text: &str) -> Self {
        Self {
            rate_limit_failures: AtomicU32::new(times),
            ..Self::ok(then_text)
        }
    }

    fn failing() -> Self {
        Self {
            fail_other: true,
            ..Self::ok("")
        }
    }
}

#[async_trait::async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());

        if self.rate_limit_failures.load(Ordering::SeqCst) > 0 {
            self.rate_limit_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::RateLimited("too many requests".to_string()));
        }
        if self.fail_other {
            return Err(Error::Ai("上游接口异常".to_string()));
        }

        Ok(CompletionResponse {
            id: "cmpl_test".to_string(),
            text: self.completion_text.clone(),
            usage: TokenUsage::default(),
        })
    }

    async fn create_image(&self, _prompt: &str) -> Result<String> {
        match &self.image_url {
            Some(url) => Ok(url.clone()),
            None => Err(Error::Ai("上游接口异常".to_string())),
        }
    }
}

/// 用单个 Provider 桩组装引擎
fn engine_with(provider: Arc<MockProvider>) -> CompletionEngine {
    let registry = Arc::new(ProviderRegistry::new());
    registry.register(ArcProvider(provider));
    CompletionEngine::with_registry(registry, SessionConfig::default())
}

/// 共享同一个桩实例的包装，便于测试中断言调用情况
struct ArcProvider(Arc<MockProvider>);

#[async_trait::async_trait]
impl AiProvider for ArcProvider {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.0.complete(request).await
    }

    async fn create_image(&self, prompt: &str) -> Result<String> {
        self.0.create_image(prompt).await
    }
}

#[tokio::test]
async fn test_text_reply_saves_turn() {
    let provider = Arc::new(MockProvider::ok("你好呀"));
    let engine = engine_with(provider.clone());

    let reply = engine.reply("你好", &Context::text("u")).await.unwrap();

    assert_eq!(reply.kind, ReplyKind::Text);
    assert_eq!(reply.content, "你好呀");

    let session = engine.store().get("u").unwrap();
    assert_eq!(session.len(), 1);
    let turn = session.iter().next().unwrap();
    assert_eq!(turn.question, "你好");
    assert_eq!(turn.answer, "你好呀");
}

#[tokio::test]
async fn test_second_turn_prompt_includes_history() {
    let provider = Arc::new(MockProvider::ok("a1"));
    let engine = engine_with(provider.clone());

    engine.reply("q1", &Context::text("u")).await.unwrap();
    engine.reply("q2", &Context::text("u")).await.unwrap();

    let prompt = provider.last_prompt.lock().unwrap().clone().unwrap();
    assert_eq!(prompt, "Q: q1\n\n\nA: a1<|endoftext|>\nQ: q2\nA: ");
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_once_retries_then_succeeds() {
    let provider = Arc::new(MockProvider::rate_limited(1, "重试后的回答"));
    let engine = engine_with(provider.clone());

    let reply = engine.reply("你好", &Context::text("u")).await.unwrap();

    assert_eq!(reply.content, "重试后的回答");
    // 恰好两次调用：首次失败 + 一次重试
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_twice_returns_apology() {
    let provider = Arc::new(MockProvider::rate_limited(2, "不会用到"));
    let engine = engine_with(provider.clone());

    let reply = engine.reply("你好", &Context::text("u")).await.unwrap();

    assert_eq!(reply.kind, ReplyKind::Text);
    assert_eq!(reply.content, REPLY_RATE_LIMITED);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    // 保存环节不区分致歉语和模型文本，致歉语计入历史
    let session = engine.store().get("u").unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(session.iter().next().unwrap().answer, REPLY_RATE_LIMITED);
}

#[tokio::test]
async fn test_other_failure_clears_session_then_records_apology() {
    let provider = Arc::new(MockProvider::failing());
    let engine = engine_with(provider.clone());

    // 预置历史，验证失败路径会丢弃它
    engine.store().save("旧提问", "旧回答", "u");

    let reply = engine.reply("新提问", &Context::text("u")).await.unwrap();

    assert_eq!(reply.kind, ReplyKind::Text);
    assert_eq!(reply.content, REPLY_RETRY_LATER);

    // 会话被清空后，仅剩保存环节补写的 {新提问, 致歉语} 一轮
    let session = engine.store().get("u").unwrap();
    assert_eq!(session.len(), 1);
    let turn = session.iter().next().unwrap();
    assert_eq!(turn.question, "新提问");
    assert_eq!(turn.answer, REPLY_RETRY_LATER);
}

#[tokio::test]
async fn test_empty_query_not_saved() {
    let provider = Arc::new(MockProvider::ok("回答"));
    let engine = engine_with(provider.clone());

    let reply = engine.reply("", &Context::text("u")).await.unwrap();

    assert_eq!(reply.content, "回答");
    assert!(engine.store().get("u").is_none());
}

#[tokio::test]
async fn test_empty_completion_not_saved() {
    let provider = Arc::new(MockProvider::ok(""));
    let engine = engine_with(provider.clone());

    let reply = engine.reply("你好", &Context::text("u")).await.unwrap();

    assert_eq!(reply.content, "");
    assert!(engine.store().get("u").is_none());
}

#[tokio::test]
async fn test_clear_memory_command_returns_info_reply() {
    let provider = Arc::new(MockProvider::ok("回答"));
    let engine = engine_with(provider.clone());

    engine.reply("q1", &Context::text("u")).await.unwrap();

    let reply = engine
        .reply(CMD_CLEAR_MEMORY, &Context::text("u"))
        .await
        .unwrap();

    assert_eq!(reply.kind, ReplyKind::Info);
    assert_eq!(reply.content, REPLY_MEMORY_CLEARED);
    assert!(engine.store().get("u").unwrap().is_empty());
    // 命令不触发补全调用
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_image_create_returns_image_url_reply() {
    let provider = Arc::new(MockProvider::ok("不会用到"));
    let engine = engine_with(provider.clone());

    let reply = engine
        .reply("一只橘猫", &Context::image_create("u"))
        .await
        .unwrap();

    assert_eq!(reply.kind, ReplyKind::ImageUrl);
    assert_eq!(reply.content, "https://example.com/cat.png");
    // 图片请求不写入会话历史
    assert!(engine.store().get("u").is_none());
}

#[tokio::test]
async fn test_image_create_failure_returns_error_reply() {
    let mut mock = MockProvider::ok("不会用到");
    mock.image_url = None;
    let engine = engine_with(Arc::new(mock));

    let reply = engine
        .reply("一只橘猫", &Context::image_create("u"))
        .await
        .unwrap();

    assert_eq!(reply.kind, ReplyKind::Error);
    assert_eq!(reply.content, REPLY_IMAGE_FAILED);
}
