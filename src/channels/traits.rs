//! 渠道 Trait 定义模块
//!
//! 定义渠道适配器的统一接口。宿主消息框架（微信、飞书等）
//! 属于外部协作方，本仓库只内置终端渠道。
//!
//! # 设计原则
//! 1. 使用 `async-trait` 支持异步方法
//! 2. 所有方法返回 `Result` 类型

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::CompletionEngine;
use crate::infra::error::Result;

/// 渠道类型枚举
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum ChannelType {
    /// 终端（交互式命令行）
    Terminal,
    /// 自定义渠道
    Custom(String),
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Terminal => write!(f, "terminal"),
            ChannelType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// 渠道 Trait
///
/// 定义渠道的统一接口：从渠道读入用户消息，交给引擎生成回复，
/// 再写回渠道，直至渠道关闭或收到退出信号。
#[async_trait::async_trait]
pub trait Channel: Send + Sync {
    /// 获取渠道类型
    fn channel_type(&self) -> ChannelType;

    /// 运行渠道主循环
    ///
    /// # 参数说明
    /// * `engine` - AI 引擎
    async fn run(&self, engine: Arc<CompletionEngine>) -> Result<()>;
}
