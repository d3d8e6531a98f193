//! 核心模块
//!
//! - `error` - 错误类型定义
//! - `logging` - 日志初始化

pub mod error;
pub mod logging;

// 重新导出错误类型
pub use error::{CompileError, CompileResult};
pub use logging::init_logging;
