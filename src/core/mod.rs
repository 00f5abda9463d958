//! 核心运行时模块
//!
//! 机器人的"大脑"，负责消息载体定义和会话记忆管理
//!
//! # 模块结构
//! - `message/` - 消息载体（入站上下文、出站回复）
//! - `session/` - 会话管理（对话历史、淘汰策略、提示词拼装）

pub mod message;
pub mod session;
