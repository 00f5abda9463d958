//! OpenAI AI Provider 实现
//!
//! 本模块实现 OpenAI 文本补全接口（单发提示词风格，非对话消息接口）。
//!
//! # 功能
//! - 文本补全
//! - 图片生成
//!
//! # 配置文件示例
//! ```toml
//! [ai.providers.openai]
//! api_key = "${OPENAI_API_KEY}"
//! model = "text-davinci-003"
//! base_url = "https://api.openai.com/v1"
//! proxy = "http://127.0.0.1:7890"
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{AiProvider, CompletionRequest, CompletionResponse, TokenUsage};
use crate::ai::constants::{
    DEFAULT_IMAGE_SIZE, DEFAULT_TIMEOUT, END_OF_TEXT, OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL,
    POOL_IDLE_TIMEOUT, POOL_MAX_IDLE_PER_HOST, PROVIDER_OPENAI,
};
use crate::infra::error::{Error, Result};

/// OpenAI Provider 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API Key
    pub api_key: String,
    /// API Base URL
    pub base_url: Option<String>,
    /// HTTP 代理地址（可选）
    pub proxy: Option<String>,
    /// 模型名称
    pub model: Option<String>,
    /// 生成图片尺寸
    pub image_size: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            proxy: None,
            model: Some(OPENAI_DEFAULT_MODEL.to_string()),
            image_size: Some(DEFAULT_IMAGE_SIZE.to_string()),
        }
    }
}

/// OpenAI 补全请求体
#[derive(Debug, Serialize)]
struct OpenAiCompletionRequest {
    /// 模型名称
    model: String,
    /// 提示词
    prompt: String,
    /// 温度参数
    temperature: f32,
    /// 回复最大 Token 数
    max_tokens: u32,
    /// top_p
    top_p: f32,
    /// frequency_penalty
    frequency_penalty: f32,
    /// presence_penalty
    presence_penalty: f32,
    /// 停止序列
    stop: Vec<String>,
}

/// OpenAI 补全响应体
#[derive(Debug, Deserialize)]
struct OpenAiCompletionResponse {
    /// 响应 ID
    id: String,
    /// 选择（补全内容）
    choices: Vec<OpenAiChoice>,
    /// 使用统计
    #[serde(default)]
    usage: OpenAiUsage,
}

/// OpenAI 选择
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    /// 补全文本
    text: String,
    /// 停止原因
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

/// OpenAI 使用统计
#[derive(Debug, Default, Deserialize)]
struct OpenAiUsage {
    /// 提示 Token 数
    #[serde(default)]
    prompt_tokens: u32,
    /// 完成 Token 数
    #[serde(default)]
    completion_tokens: u32,
    /// 总 Token 数
    #[serde(default)]
    total_tokens: u32,
}

/// OpenAI 图片生成请求体
#[derive(Debug, Serialize)]
struct OpenAiImageRequest {
    /// 图片描述
    prompt: String,
    /// 生成数量
    n: u32,
    /// 图片尺寸
    size: String,
}

/// OpenAI 图片生成响应体
#[derive(Debug, Deserialize)]
struct OpenAiImageResponse {
    /// 图片列表
    data: Vec<OpenAiImageData>,
}

/// 单张生成的图片
#[derive(Debug, Deserialize)]
struct OpenAiImageData {
    /// 图片 URL
    url: String,
}

/// OpenAI Provider
///
/// 实现 OpenAI 文本补全与图片生成的 AI Provider
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    /// 配置
    config: OpenAiConfig,
    /// HTTP 客户端
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    /// 创建新的 OpenAI Provider
    ///
    /// # 参数说明
    /// * `config` - Provider 配置
    pub fn new(config: OpenAiConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy).expect("解析代理地址失败"));
        }

        let http_client = builder.build().expect("创建 HTTP 客户端失败");

        Self {
            config,
            http_client,
        }
    }

    /// 获取 API Base URL
    fn get_base_url(&self) -> String {
        self.config
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string())
    }

    /// 检查响应状态
    ///
    /// 429 映射为速率限制错误，其余非成功状态映射为 AI 错误
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::RateLimited(error_text));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = ?status, error = %error_text, "OpenAI API 错误");
            return Err(Error::Ai(format!("OpenAI API 错误: {}", error_text)));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl AiProvider for OpenAiProvider {
    /// 获取 Provider 名称
    fn name(&self) -> &str {
        PROVIDER_OPENAI
    }

    /// 发送补全请求
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let base_url = self.get_base_url();

        debug!(model = %request.model, prompt_chars = request.prompt.chars().count(), "发送 OpenAI 补全请求");

        let completion_request = OpenAiCompletionRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            stop: request.stop.clone(),
        };

        let response = self
            .http_client
            .post(format!("{}/completions", base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&completion_request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("OpenAI API 请求失败: {}", e)))?;

        let response = Self::check_status(response).await?;

        let response_body: OpenAiCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("解析 OpenAI 响应失败: {}", e)))?;

        // 取首个补全，去除首尾空白并剔除结束标记
        let text = response_body
            .choices
            .first()
            .map(|choice| choice.text.trim().replace(END_OF_TEXT, ""))
            .unwrap_or_default();

        let usage = TokenUsage {
            prompt_tokens: response_body.usage.prompt_tokens,
            completion_tokens: response_body.usage.completion_tokens,
            total_tokens: response_body.usage.total_tokens,
        };

        info!(
            model = %request.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "OpenAI 补全响应"
        );

        Ok(CompletionResponse {
            id: response_body.id,
            text,
            usage,
        })
    }

    /// 生成图片
    async fn create_image(&self, prompt: &str) -> Result<String> {
        let base_url = self.get_base_url();
        let size = self
            .config
            .image_size
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string());

        debug!(size = %size, "发送 OpenAI 图片生成请求");

        let image_request = OpenAiImageRequest {
            prompt: prompt.to_string(),
            n: 1,
            size,
        };

        let response = self
            .http_client
            .post(format!("{}/images/generations", base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&image_request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("OpenAI 图片请求失败: {}", e)))?;

        let response = Self::check_status(response).await?;

        let response_body: OpenAiImageResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("解析 OpenAI 图片响应失败: {}", e)))?;

        let url = response_body
            .data
            .first()
            .map(|d| d.url.clone())
            .ok_or_else(|| Error::Ai("OpenAI 图片响应为空".to_string()))?;

        info!(url = %url, "OpenAI 图片生成成功");

        Ok(url)
    }
}
