//! Database enum types mapped to PostgreSQL enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User roles.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access, including cancel/restore of sales.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Point-of-sale operator; can create sales.
    #[sea_orm(string_value = "cashier")]
    Cashier,
}

/// Product stock granularity.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "unit_kind")]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Discrete pieces.
    #[sea_orm(string_value = "unit")]
    Unit,
    /// Weighed goods with fractional quantities.
    #[sea_orm(string_value = "weight")]
    Weight,
}

/// Sale status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sale_status")]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Sale has at least one active item.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Every item of the sale is cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Sale line-item status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sale_item_status")]
#[serde(rename_all = "lowercase")]
pub enum SaleItemStatus {
    /// Counted toward the sale total; stock is consumed.
    #[sea_orm(string_value = "active")]
    Active,
    /// Cancelled; stock has been returned.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Audit log action tags.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sale_action")]
pub enum SaleAction {
    /// Whole sale cancelled.
    #[sea_orm(string_value = "CANCEL_SALE")]
    #[serde(rename = "CANCEL_SALE")]
    CancelSale,
    /// Single item cancelled.
    #[sea_orm(string_value = "CANCEL_ITEM")]
    #[serde(rename = "CANCEL_ITEM")]
    CancelItem,
    /// Whole sale restored.
    #[sea_orm(string_value = "RESTORE_SALE")]
    #[serde(rename = "RESTORE_SALE")]
    RestoreSale,
    /// Single item restored.
    #[sea_orm(string_value = "RESTORE_ITEM")]
    #[serde(rename = "RESTORE_ITEM")]
    RestoreItem,
}

impl From<UnitKind> for ventra_shared::types::UnitKind {
    fn from(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Unit => Self::Unit,
            UnitKind::Weight => Self::Weight,
        }
    }
}

impl From<SaleItemStatus> for ventra_core::sale::ItemStatus {
    fn from(status: SaleItemStatus) -> Self {
        match status {
            SaleItemStatus::Active => Self::Active,
            SaleItemStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ventra_core::sale::SaleStatus> for SaleStatus {
    fn from(status: ventra_core::sale::SaleStatus) -> Self {
        match status {
            ventra_core::sale::SaleStatus::Completed => Self::Completed,
            ventra_core::sale::SaleStatus::Cancelled => Self::Cancelled,
        }
    }
}
