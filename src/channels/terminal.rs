//! 终端渠道实现
//!
//! 交互式命令行渠道：逐行读取标准输入作为用户消息，
//! 回复打印到标准输出。以 `画` 开头的消息走图片生成路径。

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use super::traits::{Channel, ChannelType};
use crate::ai::CompletionEngine;
use crate::core::message::types::{Context, Reply, ReplyKind};
use crate::infra::error::Result;

/// 图片生成命令前缀
pub const IMAGE_COMMAND_PREFIX: &str = "画";

/// 终端渠道
///
/// # 字段说明
/// * `user_id` - 本终端对应的会话标识
#[derive(Debug, Clone)]
pub struct TerminalChannel {
    /// 本终端对应的会话标识
    user_id: String,
}

impl TerminalChannel {
    /// 创建新的终端渠道
    ///
    /// # 参数说明
    /// * `user_id` - 会话标识
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
        }
    }

    /// 解析一行输入
    ///
    /// 以 `画` 开头时剥离前缀并构造图片生成上下文，
    /// 其余输入构造文本对话上下文
    fn parse_line(&self, line: &str) -> (String, Context) {
        match line.strip_prefix(IMAGE_COMMAND_PREFIX) {
            Some(rest) => (rest.trim().to_string(), Context::image_create(&self.user_id)),
            None => (line.to_string(), Context::text(&self.user_id)),
        }
    }

    /// 按回复类型打印
    fn print_reply(reply: &Reply) {
        match reply.kind {
            ReplyKind::Info => println!("[提示] {}", reply.content),
            ReplyKind::Text => println!("{}", reply.content),
            ReplyKind::Error => println!("[错误] {}", reply.content),
            ReplyKind::ImageUrl => println!("[图片] {}", reply.content),
        }
    }
}

#[async_trait::async_trait]
impl Channel for TerminalChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Terminal
    }

    async fn run(&self, engine: Arc<CompletionEngine>) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        info!(user_id = %self.user_id, "终端渠道已启动，输入消息开始对话");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    warn!("收到 Ctrl+C 信号，终端渠道退出");
                    break;
                }
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            info!("输入结束，终端渠道退出");
                            break;
                        }
                        Err(e) => return Err(e.into()),
                    };

                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let (query, context) = self.parse_line(line);
                    match engine.reply(&query, &context).await {
                        Ok(reply) => Self::print_reply(&reply),
                        Err(e) => {
                            error!(error = %e, "生成回复失败");
                            Self::print_reply(&Reply::error(&e.to_string()));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
