//! 数据库层 - 嵌入式 redb 存储
//!
//! 每次业务调用打开自己的事务，不存在进程级共享会话。

pub mod storage;

pub use storage::{StorageError, StorageResult, Store};
