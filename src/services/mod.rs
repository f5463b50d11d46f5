// Service exports
pub mod auth;
pub mod memory;
pub mod postgres;
pub mod store;

pub use auth::{AuthError, AuthenticatedUser, Claims, JwtValidator};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{MatchStore, StoreError, UserStore};
