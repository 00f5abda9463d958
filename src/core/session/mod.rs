//! 会话管理模块
//!
//! 本模块负责管理按用户隔离的对话记忆，提供历史保存、长度预算淘汰
//! 和提示词拼装功能。
//!
//! # 模块结构
//! - `types` - 会话类型定义
//! - `store` - 会话存储实现
//! - `prompt` - 提示词拼装器

pub mod prompt;
pub mod store;
pub mod types;

pub use prompt::PromptBuilder;
pub use store::SessionStore;
pub use types::{EvictionMode, Session, SessionConfig, Turn};
