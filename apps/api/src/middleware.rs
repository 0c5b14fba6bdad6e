//! # ミドルウェア
//!
//! axum のルートに適用するミドルウェアを定義する。

pub mod auth;

pub use auth::{AuthLayerState, CurrentUser, require_auth};
