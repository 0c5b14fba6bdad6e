//! # ユースケース層
//!
//! ビジネスロジックを実装する。ハンドラはこの層のトレイトにのみ依存し、
//! テストではスタブ実装に差し替える。

pub mod auth;
pub mod supply;
pub mod work_order;

pub use auth::{AuthUseCase, AuthUseCaseImpl, LoginOutput, SignupInput};
pub use supply::{SupplyInput, SupplyUseCase, SupplyUseCaseImpl};
pub use work_order::{
   CreateWorkOrderInput,
   UnitDetail,
   UnitStationDetail,
   WorkOrderDetail,
   WorkOrderUseCase,
   WorkOrderUseCaseImpl,
};
