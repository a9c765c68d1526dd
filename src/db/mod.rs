pub mod gateway;
pub mod helpers;
pub mod memory;
pub mod postgres;
pub mod tournament_queries;

pub use gateway::{Entity, Filter, GatewayError, Order, PersistenceGateway};
pub use memory::MemoryGateway;
pub use postgres::PgGateway;
pub use tournament_queries::TournamentQueries;
