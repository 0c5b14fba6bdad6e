//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod auth;
pub mod health;
pub mod part;
pub mod station;
pub mod user;
pub mod warehouse;
pub mod work_order;

pub use auth::{AuthState, login, oauth_callback, oauth_login};
pub use health::{ReadinessState, health_check, readiness_check};
pub use part::{PartState, create_part_request, get_needed_parts, get_products};
pub use station::{StationState, add_station_comment};
pub use user::{UserState, signup};
pub use warehouse::{WarehouseState, dispatch_parts};
pub use work_order::{
    WorkOrderState,
    complete_work_order,
    create_work_order,
    get_work_order,
    list_work_orders,
    update_unit_comment,
    update_unit_status,
};
