//! AI 模块常量定义
//!
//! 集中管理 AI 模块中的所有硬编码常量，避免多处重复定义
//!
//! # 常量分类
//! - Provider 名称
//! - 默认模型与补全参数
//! - API 基础 URL
//! - 重试配置
//! - 控制命令与固定回复

use std::time::Duration;

/// ==================== Provider 名称 ====================

/// OpenAI Provider 名称
pub const PROVIDER_OPENAI: &str = "openai";

/// 默认 Provider 名称（当配置未指定时使用）
pub const DEFAULT_PROVIDER: &str = PROVIDER_OPENAI;

/// ==================== 默认模型与补全参数 ====================

/// OpenAI 补全默认模型
pub const OPENAI_DEFAULT_MODEL: &str = "text-davinci-003";

/// 默认温度参数，值越大回复越不确定
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

/// 回复最大 Token 数
pub const DEFAULT_MAX_TOKENS: u32 = 1200;

/// 默认 top_p
pub const DEFAULT_TOP_P: f32 = 1.0;

/// 默认 frequency_penalty，[-2,2] 之间，越大越倾向产生不同内容
pub const DEFAULT_FREQUENCY_PENALTY: f32 = 0.0;

/// 默认 presence_penalty，[-2,2] 之间，越大越倾向产生不同内容
pub const DEFAULT_PRESENCE_PENALTY: f32 = 0.0;

/// 补全停止序列
pub const COMPLETION_STOP: &str = "\n\n\n";

/// 模型输出中需要剔除的结束标记
pub const END_OF_TEXT: &str = "<|endoftext|>";

/// 默认生成图片尺寸
pub const DEFAULT_IMAGE_SIZE: &str = "256x256";

/// ==================== API 基础 URL ====================

/// OpenAI API 基础 URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// ==================== HTTP 客户端 ====================

/// 默认超时时间（60秒）
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// 连接池空闲超时（30秒）
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// 连接池最大空闲连接数
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// ==================== 重试配置 ====================

/// 速率限制后最多重试次数
pub const RATE_LIMIT_MAX_RETRIES: u32 = 1;

/// 速率限制后的重试间隔（5秒）
pub const RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// ==================== 控制命令 ====================

/// 清除本人记忆命令
pub const CMD_CLEAR_MEMORY: &str = "#清除记忆";

/// 清除所有人记忆命令
pub const CMD_CLEAR_ALL: &str = "#清除所有";

/// ==================== 固定回复 ====================

/// 清除本人记忆的确认回复
pub const REPLY_MEMORY_CLEARED: &str = "记忆已清除";

/// 清除所有人记忆的确认回复
pub const REPLY_ALL_CLEARED: &str = "所有人记忆已清除";

/// 连续触发速率限制后的致歉回复
pub const REPLY_RATE_LIMITED: &str = "提问太快啦，请休息一下再问我吧";

/// 其他失败后的致歉回复
pub const REPLY_RETRY_LATER: &str = "请再问我一次吧";

/// 图片生成失败的回复
pub const REPLY_IMAGE_FAILED: &str = "图片创建失败";
