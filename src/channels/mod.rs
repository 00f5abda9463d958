//! 渠道适配器模块
//!
//! 本模块定义了渠道的统一接口，并实现终端渠道。

pub mod terminal;
pub mod traits;

pub use terminal::TerminalChannel;
pub use traits::{Channel, ChannelType};
