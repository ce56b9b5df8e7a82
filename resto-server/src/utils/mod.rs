//! 工具模块 - 日志与请求期限

pub mod deadline;
pub mod logger;

pub use deadline::Deadline;
