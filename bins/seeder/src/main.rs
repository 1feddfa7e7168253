//! Database seeder for Ventra development and testing.
//!
//! Seeds an admin and a cashier user plus a handful of sample products so
//! the sale endpoints can be exercised locally.
//!
//! Usage: cargo run --bin seeder

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use ventra_core::auth::hash_password;
use ventra_db::entities::{
    products,
    sea_orm_active_enums::{UnitKind, UserRole},
    users,
};

/// Admin user ID (consistent for all seeds)
const ADMIN_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Cashier user ID (consistent for all seeds)
const CASHIER_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = ventra_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    seed_user(&db, admin_user_id(), "admin", "admin123", UserRole::Admin).await;
    seed_user(&db, cashier_user_id(), "caja1", "caja123", UserRole::Cashier).await;

    println!("Seeding products...");
    seed_products(&db).await;

    println!("Seeding complete!");
}

fn admin_user_id() -> Uuid {
    Uuid::parse_str(ADMIN_USER_ID).unwrap()
}

fn cashier_user_id() -> Uuid {
    Uuid::parse_str(CASHIER_USER_ID).unwrap()
}

/// Seeds one user if it does not already exist.
async fn seed_user(db: &DatabaseConnection, id: Uuid, username: &str, password: &str, role: UserRole) {
    if users::Entity::find_by_id(id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  User {username} already exists, skipping...");
        return;
    }

    let password_hash = hash_password(password).expect("Failed to hash password");
    let now = chrono::Utc::now().into();

    let user = users::ActiveModel {
        id: Set(id),
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert user {username}: {e}");
    } else {
        println!("  Created user: {username} / {password}");
    }
}

/// Seeds the sample catalog (mixed whole-unit and weight-based products).
async fn seed_products(db: &DatabaseConnection) {
    let samples = [
        ("P001", "Inka Cola 500ml", "2.50", "50", UnitKind::Unit),
        ("P002", "Coca Cola 500ml", "2.50", "40", UnitKind::Unit),
        ("P003", "Papas Lays", "1.50", "30", UnitKind::Unit),
        ("P004", "Arroz a granel", "4.00", "25.000", UnitKind::Weight),
    ];

    for (code, name, price, stock, unit) in samples {
        let existing = products::Entity::find()
            .filter(products::Column::Code.eq(code))
            .one(db)
            .await
            .ok()
            .flatten();
        if existing.is_some() {
            println!("  Product {code} already exists, skipping...");
            continue;
        }

        let now = chrono::Utc::now().into();
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            price: Set(price.parse::<Decimal>().expect("valid price literal")),
            stock: Set(stock.parse::<Decimal>().expect("valid stock literal")),
            unit: Set(unit),
            created_at: Set(now),
            updated_at: Set(now),
        };

        if let Err(e) = product.insert(db).await {
            eprintln!("Failed to insert product {code}: {e}");
        } else {
            println!("  Created product: {code} {name}");
        }
    }
}
