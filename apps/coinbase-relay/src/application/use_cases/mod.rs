//! Use Cases

mod relay_order;

pub use relay_order::{ORDERS_PATH, RelayOrderUseCase};
