pub mod collector;
pub mod filter;
pub mod ignore;
pub mod lookup;
pub mod record;

pub use collector::{Collector, RunOptions};
pub use filter::ResultFilter;
pub use record::{Inventory, InventoryRecord};
