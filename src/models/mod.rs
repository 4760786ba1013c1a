//! Domain models shared across the Survivor engine.

pub mod instrument;
pub mod order;
pub mod side;
pub mod tick;

pub use instrument::{Instrument, Quote};
pub use order::{OrderDetails, OrderRequest, OrderType, ProductType, TransactionType};
pub use side::{Side, SideState};
pub use tick::{TickData, TickPayload};
