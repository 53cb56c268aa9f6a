pub mod order_store;
pub mod payment;
pub mod signature;
pub mod stats;

pub use order_store::{connect_order_store, Completion, MemoryOrderStore, OrderStore, RedisOrderStore};
pub use payment::PaymentService;
pub use signature::SignatureService;
pub use stats::PaymentStats;
