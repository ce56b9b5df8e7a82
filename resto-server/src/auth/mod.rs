//! 认证授权模块
//!
//! 身份由上游签发，本服务只解析请求头中的执行者：
//! - [`CurrentActor`] - 必须携带身份的请求
//! - [`MaybeActor`] - 身份可选的请求（如桌台可用性查询）
//! - [`require_role`] - 角色检查

pub mod extractor;

pub use extractor::{CurrentActor, MaybeActor, actor_from_headers, require_role};
