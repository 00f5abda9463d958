//! 消息类型定义模块
//!
//! 定义所有与消息相关的类型结构体，包括：
//! - 入站上下文（用户请求及其类型）
//! - 出站回复（带类型标记的回复内容）
//!
//! # 使用示例
//! ```rust
//! use qabot::core::message::types::{Context, Reply};
//!
//! let ctx = Context::text("user_123");
//! let reply = Reply::text("你好");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 上下文类型
///
/// 标识用户请求希望触发的处理路径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextKind {
    /// 文本对话
    Text,
    /// 图片生成
    ImageCreate,
}

/// 入站上下文
///
/// 一次用户请求的元信息
///
/// # 字段说明
/// * `id` - 消息唯一 ID
/// * `kind` - 上下文类型
/// * `session_id` - 会话标识（即用户标识）
/// * `timestamp` - 消息时间戳
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// 消息唯一 ID
    pub id: String,
    /// 上下文类型
    pub kind: ContextKind,
    /// 会话标识（即用户标识）
    pub session_id: String,
    /// 消息时间戳
    pub timestamp: DateTime<Utc>,
}

impl Context {
    /// 创建指定类型的上下文
    ///
    /// # 参数说明
    /// * `kind` - 上下文类型
    /// * `session_id` - 会话标识
    pub fn new(kind: ContextKind, session_id: &str) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4().to_string().replace('-', "")),
            kind,
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// 创建文本对话上下文
    pub fn text(session_id: &str) -> Self {
        Self::new(ContextKind::Text, session_id)
    }

    /// 创建图片生成上下文
    pub fn image_create(session_id: &str) -> Self {
        Self::new(ContextKind::ImageCreate, session_id)
    }
}

/// 回复类型
///
/// 标识回复内容应如何被渠道呈现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyKind {
    /// 提示信息（如命令执行结果）
    Info,
    /// 普通文本回复
    Text,
    /// 错误信息
    Error,
    /// 图片 URL
    ImageUrl,
}

impl std::fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyKind::Info => write!(f, "INFO"),
            ReplyKind::Text => write!(f, "TEXT"),
            ReplyKind::Error => write!(f, "ERROR"),
            ReplyKind::ImageUrl => write!(f, "IMAGE_URL"),
        }
    }
}

/// 出站回复
///
/// 机器人对一次请求的答复
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// 回复类型
    pub kind: ReplyKind,
    /// 回复内容（文本或 URL）
    pub content: String,
}

impl Reply {
    /// 创建提示信息回复
    pub fn info(content: &str) -> Self {
        Self {
            kind: ReplyKind::Info,
            content: content.to_string(),
        }
    }

    /// 创建文本回复
    pub fn text(content: &str) -> Self {
        Self {
            kind: ReplyKind::Text,
            content: content.to_string(),
        }
    }

    /// 创建错误回复
    pub fn error(content: &str) -> Self {
        Self {
            kind: ReplyKind::Error,
            content: content.to_string(),
        }
    }

    /// 创建图片 URL 回复
    pub fn image_url(url: &str) -> Self {
        Self {
            kind: ReplyKind::ImageUrl,
            content: url.to_string(),
        }
    }
}
