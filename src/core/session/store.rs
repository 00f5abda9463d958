//! 会话存储模块
//!
//! 进程级的用户会话存储。键为用户标识，值为该用户的问答历史；
//! 不持久化，进程退出即清空。
//!
//! # 特点
//! * 线程安全 - 使用 DashMap 支持并发访问
//! * 保存即淘汰 - 每次保存后按预算收缩历史，追加与淘汰在同一把
//!   分片锁内完成，单个用户的保存是原子的

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::core::session::types::{EvictionMode, Session, SessionConfig, Turn};

/// 会话存储
///
/// # 字段说明
/// * `sessions` - 会话存储（用户标识 -> Session）
/// * `config` - 会话配置
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// 会话存储（用户标识 -> Session）
    sessions: Arc<DashMap<String, Session>>,
    /// 会话配置
    config: Arc<SessionConfig>,
}

impl SessionStore {
    /// 创建新的会话存储
    ///
    /// # 参数说明
    /// * `config` - 会话配置
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    /// 获取会话配置
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// 读取用户的会话历史
    ///
    /// 无副作用；用户不存在时返回 `None`
    pub fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.get(user_id).map(|s| s.value().clone())
    }

    /// 保存新的一轮问答
    ///
    /// 追加到用户会话末尾（不存在则创建），随后按预算执行淘汰。
    ///
    /// # 参数说明
    /// * `question` - 用户提问
    /// * `answer` - 模型回答
    /// * `user_id` - 用户标识
    pub fn save(&self, question: &str, answer: &str, user_id: &str) {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        session.push(Turn::new(question, answer));

        Self::evict(session.turns_mut(), self.config.max_budget, self.config.eviction);

        debug!(
            user_id = user_id,
            turns = session.len(),
            chars = session.char_len(),
            "会话已保存"
        );
    }

    /// 清空单个用户的会话
    ///
    /// 用户不存在时也会写入一个空会话
    pub fn clear(&self, user_id: &str) {
        self.sessions.insert(user_id.to_string(), Session::new());
        debug!(user_id = user_id, "会话已清空");
    }

    /// 清空所有用户的会话
    pub fn clear_all(&self) {
        self.sessions.clear();
        debug!("全部会话已清空");
    }

    /// 按预算收缩历史
    fn evict(turns: &mut Vec<Turn>, budget: usize, mode: EvictionMode) {
        match mode {
            EvictionMode::Legacy => Self::evict_legacy(turns, budget),
            EvictionMode::Trim => Self::evict_trim(turns, budget),
        }
    }

    /// 原版淘汰行为
    ///
    /// 自最新一轮向旧累计字符数，得到每个位置"含它到最新"的累计值；
    /// 每有一个累计值超出预算，就从最前端弹出一轮。
    fn evict_legacy(turns: &mut Vec<Turn>, budget: usize) {
        let mut count = 0usize;
        let mut count_list = Vec::with_capacity(turns.len());
        for turn in turns.iter().rev() {
            count += turn.char_len();
            count_list.push(count);
        }

        for c in count_list {
            if c > budget {
                turns.remove(0);
            }
        }
    }

    /// 单遍淘汰
    ///
    /// 累计总量超出预算时弹出最旧一轮，降到预算内即停止
    fn evict_trim(turns: &mut Vec<Turn>, budget: usize) {
        let mut total: usize = turns.iter().map(Turn::char_len).sum();
        while total > budget && !turns.is_empty() {
            total -= turns.remove(0).char_len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_budget(budget: usize, mode: EvictionMode) -> SessionStore {
        SessionStore::new(SessionConfig {
            max_budget: budget,
            eviction: mode,
            ..Default::default()
        })
    }

    #[test]
    fn test_save_then_get_single_turn() {
        let store = SessionStore::new(SessionConfig::default());

        store.save("q", "a", "u");

        let session = store.get("u").unwrap();
        assert_eq!(session.len(), 1);
        let turn = session.iter().next().unwrap();
        assert_eq!(turn.question, "q");
        assert_eq!(turn.answer, "a");
    }

    #[test]
    fn test_get_absent_user_returns_none() {
        let store = SessionStore::new(SessionConfig::default());
        assert!(store.get("nobody").is_none());
    }

    #[test]
    fn test_turns_kept_in_save_order() {
        let store = SessionStore::new(SessionConfig::default());

        store.save("q1", "a1", "u");
        store.save("q2", "a2", "u");
        store.save("q3", "a3", "u");

        let session = store.get("u").unwrap();
        let questions: Vec<&str> = session.iter().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn test_legacy_eviction_exact_count() {
        // 预算 10，三轮各 6 字符：自新向旧累计 6、12、18，
        // 两个累计值超出预算，应从最前端弹出两轮，只剩最新一轮
        let store = store_with_budget(10, EvictionMode::Legacy);

        store.save("abc", "def", "u"); // 6 字符
        store.save("ghi", "jkl", "u"); // 6 字符
        store.save("mno", "pqr", "u"); // 6 字符

        let session = store.get("u").unwrap();
        assert_eq!(session.len(), 1);
        let turn = session.iter().next().unwrap();
        assert_eq!(turn.question, "mno");
        assert_eq!(turn.answer, "pqr");
    }

    #[test]
    fn test_legacy_eviction_keeps_within_budget() {
        let store = store_with_budget(10, EvictionMode::Legacy);

        store.save("ab", "cd", "u"); // 4 字符
        store.save("ef", "gh", "u"); // 4 字符，累计 8，不淘汰

        let session = store.get("u").unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.char_len(), 8);
    }

    #[test]
    fn test_legacy_eviction_single_oversized_turn_empties_session() {
        // 单轮就超出预算：唯一的累计值超标，弹出后会话为空
        let store = store_with_budget(5, EvictionMode::Legacy);

        store.save("abcdef", "ghijkl", "u"); // 12 字符

        let session = store.get("u").unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_trim_eviction_keeps_maximal_suffix() {
        let store = store_with_budget(10, EvictionMode::Trim);

        store.save("abc", "def", "u"); // 6
        store.save("ghi", "jkl", "u"); // 6
        store.save("mno", "pqr", "u"); // 6

        let session = store.get("u").unwrap();
        assert_eq!(session.len(), 1);
        assert!(session.char_len() <= 10);
        assert_eq!(session.iter().next().unwrap().question, "mno");
    }

    #[test]
    fn test_trim_matches_legacy_on_monotone_counts() {
        // 两种策略在同一输入序列上留下相同的历史
        let inputs = [("aaaa", "bbbb"), ("c", "d"), ("eeeeee", "f"), ("g", "hh")];

        let legacy = store_with_budget(12, EvictionMode::Legacy);
        let trim = store_with_budget(12, EvictionMode::Trim);
        for (q, a) in inputs {
            legacy.save(q, a, "u");
            trim.save(q, a, "u");
        }

        let legacy_turns: Vec<Turn> = legacy.get("u").unwrap().iter().cloned().collect();
        let trim_turns: Vec<Turn> = trim.get("u").unwrap().iter().cloned().collect();
        assert_eq!(legacy_turns, trim_turns);
    }

    #[test]
    fn test_clear_resets_only_target_user() {
        let store = SessionStore::new(SessionConfig::default());

        store.save("q1", "a1", "alice");
        store.save("q2", "a2", "bob");

        store.clear("alice");

        let alice = store.get("alice").unwrap();
        assert!(alice.is_empty());

        let bob = store.get("bob").unwrap();
        assert_eq!(bob.len(), 1);
    }

    #[test]
    fn test_clear_all_empties_every_session() {
        let store = SessionStore::new(SessionConfig::default());

        store.save("q1", "a1", "alice");
        store.save("q2", "a2", "bob");

        store.clear_all();

        assert!(store.get("alice").is_none());
        assert!(store.get("bob").is_none());
    }

    #[test]
    fn test_empty_question_and_answer_accepted() {
        let store = SessionStore::new(SessionConfig::default());

        store.save("", "", "u");

        let session = store.get("u").unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session.char_len(), 0);
    }

    #[test]
    fn test_eviction_counts_unicode_chars() {
        // 预算按字符计，6 个汉字 + 6 个汉字共 12 字符，超出预算 10
        let store = store_with_budget(10, EvictionMode::Legacy);

        store.save("你好你好你好", "世界世界世界", "u"); // 12 字符
        let session = store.get("u").unwrap();
        assert!(session.is_empty());
    }
}
