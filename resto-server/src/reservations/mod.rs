//! 预订冲突解析
//!
//! - [`ReservationResolver`] - 可用性检查、预订创建与状态流转
//! - [`ReservationPricing`] - 附加服务（台球 / 泳池 / 活动）的定价规则
pub mod pricing;
pub mod resolver;

pub use pricing::ReservationPricing;
pub use resolver::ReservationResolver;
