pub mod http_provider;
pub mod in_memory_payment_repository;
pub mod postgres_payment_repository;
pub mod simulated_provider;

pub use http_provider::HttpProvider;
pub use in_memory_payment_repository::InMemoryPaymentRepository;
pub use postgres_payment_repository::PostgresPaymentRepository;
pub use simulated_provider::SimulatedProvider;
