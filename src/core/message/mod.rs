//! 消息处理模块
//!
//! 本模块定义机器人与宿主渠道之间交换的消息载体：
//! 入站上下文（用户发来什么）和出站回复（机器人答复什么）。

pub mod types;

// 重新导出常用类型
pub use types::{Context, ContextKind, Reply, ReplyKind};
