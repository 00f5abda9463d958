//! 提示词拼装器
//!
//! 将角色描述、会话历史和新提问拼成单条补全提示词。
//! 纯函数式：输出只取决于输入，不读写任何状态。

use crate::core::session::types::{Session, SessionConfig};

/// 提示词拼装器
///
/// # 拼装格式
/// ```text
/// <角色描述><分隔标记>Q: <历史提问>
///
///
/// A: <历史回答><分隔标记>Q: <新提问>
/// A:
/// ```
/// 角色描述为空时省略前导；末尾的 `A: ` 之后留给模型续写。
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    /// 角色描述（可为空）
    character_desc: String,
    /// 轮次分隔标记
    sentinel: String,
}

impl PromptBuilder {
    /// 创建新的提示词拼装器
    ///
    /// # 参数说明
    /// * `character_desc` - 角色描述
    /// * `sentinel` - 轮次分隔标记
    pub fn new(character_desc: &str, sentinel: &str) -> Self {
        Self {
            character_desc: character_desc.to_string(),
            sentinel: sentinel.to_string(),
        }
    }

    /// 从会话配置构建
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.character_desc, &config.sentinel)
    }

    /// 拼装补全提示词
    ///
    /// # 参数说明
    /// * `query` - 新提问
    /// * `session` - 用户会话历史（无历史时传 `None`）
    ///
    /// # 返回值
    /// 拼装好的提示词
    pub fn build(&self, query: &str, session: Option<&Session>) -> String {
        let mut prompt = self.character_desc.clone();
        if !prompt.is_empty() {
            prompt.push_str(&self.sentinel);
        }

        if let Some(session) = session {
            for turn in session.iter() {
                prompt.push_str("Q: ");
                prompt.push_str(&turn.question);
                prompt.push_str("\n\n\nA: ");
                prompt.push_str(&turn.answer);
                prompt.push_str(&self.sentinel);
            }
        }

        prompt.push_str("Q: ");
        prompt.push_str(query);
        prompt.push_str("\nA: ");
        prompt
    }
}
