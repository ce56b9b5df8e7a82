use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::orders::OrderSettings;
use crate::reservations::ReservationPricing;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/resto | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | REQUEST_TIMEOUT_MS | 5000 | 写事务提交期限(毫秒) |
/// | TAX_RATE | 0 | 税率 (小数，如 0.16) |
/// | DELIVERY_FEE | 0 | 外卖配送费 |
/// | BILLIARDS_HOURLY_RATE | 20.00 | 台球每小时价格 |
/// | POOL_GUEST_RATE | 15.00 | 泳池每人价格 |
/// | EVENT_GUEST_RATE | 35.00 | 活动每人价格 |
/// | BULK_GUEST_THRESHOLD | 10 | 按人计价的批量折扣门槛 |
/// | BULK_HOUR_THRESHOLD | 4 | 按小时计价的批量折扣门槛 |
/// | BULK_DISCOUNT_PERCENT | 10 | 批量折扣百分比 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/resto HTTP_PORT=8080 TAX_RATE=0.16 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存放数据库与日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    /// 写事务提交期限 (毫秒)
    pub request_timeout_ms: u64,
    pub tax_rate: Decimal,
    pub delivery_fee: Decimal,
    pub pricing: ReservationPricing,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        let defaults = ReservationPricing::default();
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/resto".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 5000),
            tax_rate: env_or("TAX_RATE", Decimal::ZERO),
            delivery_fee: env_or("DELIVERY_FEE", Decimal::ZERO),
            pricing: ReservationPricing {
                billiards_hourly_rate: env_or(
                    "BILLIARDS_HOURLY_RATE",
                    defaults.billiards_hourly_rate,
                ),
                pool_guest_rate: env_or("POOL_GUEST_RATE", defaults.pool_guest_rate),
                event_guest_rate: env_or("EVENT_GUEST_RATE", defaults.event_guest_rate),
                bulk_guest_threshold: env_or("BULK_GUEST_THRESHOLD", defaults.bulk_guest_threshold),
                bulk_hour_threshold: env_or("BULK_HOUR_THRESHOLD", defaults.bulk_hour_threshold),
                bulk_discount_percent: env_or(
                    "BULK_DISCOUNT_PERCENT",
                    defaults.bulk_discount_percent,
                ),
            },
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 数据库文件路径: `WORK_DIR/database/resto.redb`
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database").join("resto.redb")
    }

    /// 日志目录: `WORK_DIR/logs`
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn order_settings(&self) -> OrderSettings {
        OrderSettings {
            tax_rate: self.tax_rate,
            delivery_fee: self.delivery_fee,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
