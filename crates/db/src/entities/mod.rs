//! `SeaORM` entity definitions.

pub mod products;
pub mod sale_items;
pub mod sale_logs;
pub mod sales;
pub mod sea_orm_active_enums;
pub mod users;
