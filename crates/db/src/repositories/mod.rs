//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod product;
pub mod sale;
pub mod user;

pub use product::ProductRepository;
pub use sale::{CreateSaleInput, ItemChange, SaleError, SaleRepository, SaleWithItems};
pub use user::UserRepository;
