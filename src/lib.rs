//! 多显示器区域截图
//!
//! - [`capture`]: 显示器枚举、选区求交、逐屏裁剪与拼接
//! - [`store`]: 截图历史与置顶
//! - [`config`]: TOML 配置与日志初始化

pub mod capture;
pub mod cli;
pub mod config;
pub mod event;
pub mod store;
