//! 会话类型定义
//!
//! 定义会话相关的核心数据结构。

use serde::{Deserialize, Serialize};

use crate::infra::config::SessionSettings;

/// 一轮问答
///
/// 创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// 用户提问
    pub question: String,
    /// 模型回答
    pub answer: String,
}

impl Turn {
    /// 创建新的一轮问答
    pub fn new(question: &str, answer: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    /// 问答的字符数（提问 + 回答）
    ///
    /// 按 Unicode 字符计数，作为 Token 数的近似
    pub fn char_len(&self) -> usize {
        self.question.chars().count() + self.answer.chars().count()
    }
}

/// 单个用户的会话
///
/// 按时间顺序保存的问答历史，最旧的在最前
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// 问答历史
    turns: Vec<Turn>,
}

impl Session {
    /// 创建空会话
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一轮问答
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// 历史轮数
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// 历史的累计字符数
    pub fn char_len(&self) -> usize {
        self.turns.iter().map(Turn::char_len).sum()
    }

    /// 按时间顺序遍历历史（最旧的在前）
    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    /// 可变访问历史（淘汰策略使用）
    pub(crate) fn turns_mut(&mut self) -> &mut Vec<Turn> {
        &mut self.turns
    }
}

/// 淘汰策略
///
/// 保存新一轮后如何收缩超出预算的历史
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvictionMode {
    /// 沿用原版行为：自新向旧累计字符数，
    /// 每有一个累计值超出预算就从最前端弹出一轮
    #[default]
    Legacy,
    /// 修正后的单遍形式：累计总量降到预算内即停止
    Trim,
}

impl EvictionMode {
    /// 从配置字符串解析淘汰策略
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "legacy" => Some(Self::Legacy),
            "trim" => Some(Self::Trim),
            _ => None,
        }
    }
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 历史记忆的最大累计字符数
    pub max_budget: usize,
    /// 淘汰策略
    pub eviction: EvictionMode,
    /// 角色描述（提示词前导，可为空）
    pub character_desc: String,
    /// 轮次分隔标记
    pub sentinel: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_budget: 1000,                      // 默认预算 1000 字符
            eviction: EvictionMode::Legacy,        // 默认沿用原版淘汰行为
            character_desc: String::new(),         // 默认无角色描述
            sentinel: "<|endoftext|>\n".to_string(), // 轮次分隔标记
        }
    }
}

impl SessionConfig {
    /// 从配置文件的 `[session]` 节构建
    ///
    /// 未填写的字段使用默认值；无法识别的淘汰策略名回退到默认并告警
    pub fn from_settings(settings: &SessionSettings) -> Self {
        let defaults = Self::default();

        let eviction = match settings.eviction.as_deref() {
            Some(name) => EvictionMode::from_name(name).unwrap_or_else(|| {
                tracing::warn!(name = name, "未识别的淘汰策略，使用默认策略");
                defaults.eviction
            }),
            None => defaults.eviction,
        };

        Self {
            max_budget: settings
                .conversation_max_tokens
                .unwrap_or(defaults.max_budget),
            eviction,
            character_desc: settings
                .character_desc
                .clone()
                .unwrap_or(defaults.character_desc),
            sentinel: settings.sentinel.clone().unwrap_or(defaults.sentinel),
        }
    }
}
