//! qabot 库入口
//!
//! 本模块导出所有公共 API。
//!
//! # 使用示例
//! ```rust
//! use qabot::infra::config::Config;
//! ```

/// 重新导出核心模块
pub mod ai;
pub mod channels;
pub mod core;
pub mod infra;
