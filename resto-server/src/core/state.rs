use crate::core::{Config, Result};
use crate::db::Store;
use crate::events::EventHub;
use crate::inventory::{InventoryLedger, RecipeIndex};
use crate::menu::MenuCatalog;
use crate::orders::OrderWorkflow;
use crate::reservations::ReservationResolver;
use crate::tables::TableAllocator;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有服务都只持有 [`Store`] (内部 `Arc<Database>`) 与 [`EventHub`] 的克隆，
/// 拷贝成本极低，可直接作为 axum 的 `State`。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | store | redb 嵌入式存储 |
/// | events | 领域事件广播 |
/// | tables | 桌台主数据与占用 |
/// | catalog | 菜单目录 |
/// | ledger | 原料库存流水 |
/// | recipes | 菜品配方 |
/// | orders | 订单履约 |
/// | reservations | 预订冲突解析 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub store: Store,
    pub events: EventHub,
    pub tables: TableAllocator,
    pub catalog: MenuCatalog,
    pub ledger: InventoryLedger,
    pub recipes: RecipeIndex,
    pub orders: OrderWorkflow,
    pub reservations: ReservationResolver,
}

impl ServerState {
    /// 打开 `WORK_DIR/database/resto.redb` 并组装所有服务
    pub fn initialize(config: &Config) -> Result<Self> {
        let path = config.database_path();
        let store = Store::open(&path)?;
        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self::with_store(config.clone(), store))
    }

    /// 使用已有存储组装服务 (测试使用内存存储)
    pub fn with_store(config: Config, store: Store) -> Self {
        let events = EventHub::new();
        let tables = TableAllocator::new(store.clone());
        let catalog = MenuCatalog::new(store.clone());
        let ledger = InventoryLedger::new(store.clone(), events.clone());
        let recipes = RecipeIndex::new(store.clone());
        let orders = OrderWorkflow::new(
            store.clone(),
            catalog.clone(),
            ledger.clone(),
            recipes.clone(),
            tables.clone(),
            events.clone(),
            config.order_settings(),
        );
        let reservations = ReservationResolver::new(
            store.clone(),
            tables.clone(),
            config.pricing.clone(),
            events.clone(),
        );

        Self {
            config,
            store,
            events,
            tables,
            catalog,
            ledger,
            recipes,
            orders,
            reservations,
        }
    }
}
