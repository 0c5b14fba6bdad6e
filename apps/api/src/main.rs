//! # GenbaFlow API サーバー
//!
//! 製造現場のワークオーダー追跡 API。
//!
//! ## 役割
//!
//! - **認証**: サインアップ、パスワードログイン、Google OAuth2。
//!   発行した JWT（Bearer ヘッダまたは `authToken` Cookie）で書き込み系
//!   エンドポイントを保護する
//! - **ワークオーダー**: BOM 展開を伴う作成、ユニット×ステーションの
//!   進捗追跡、全ステーション完了を条件とする完了ゲート
//! - **倉庫**: 部品リクエストとディスパッチの記録、不足部品レポート
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `API_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `API_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `JWT_SECRET_KEY` | **Yes** | JWT 署名シークレット |
//! | `FRONTEND_URL` | No | OAuth 後のリダイレクト先 |
//! | `PUBLIC_BASE_URL` | No | この API の公開 URL（redirect_uri 構築用） |
//! | `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` | No | 未設定なら OAuth は 503 |
//! | `GOOGLE_DISCOVERY_URL` | No | ディスカバリ文書 URL の上書き |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p genbaflow-api
//!
//! # 本番環境
//! API_PORT=13000 DATABASE_URL=postgres://... JWT_SECRET_KEY=... \
//!     cargo run -p genbaflow-api --release
//! ```

mod config;
mod error;
mod handler;
mod middleware;
mod usecase;

use std::{net::SocketAddr, sync::Arc};

use axum::{
   Router,
   middleware::from_fn_with_state,
   routing::{get, post, put},
};
use config::ApiConfig;
use genbaflow_domain::clock::{Clock, SystemClock};
use genbaflow_infra::{
   Argon2PasswordHasher,
   GoogleOAuthProvider,
   Hs256TokenService,
   OAuthProvider,
   PasswordHasher,
   TokenService,
   db,
   repository::{
      PostgresProductRepository,
      PostgresStationStatusRepository,
      PostgresSupplyRepository,
      PostgresUserRepository,
      PostgresWorkOrderRepository,
      ProductRepository,
      StationStatusRepository,
      SupplyRepository,
      UserRepository,
      WorkOrderRepository,
   },
};
use genbaflow_shared::observability::TracingConfig;
use handler::{
   AuthState,
   PartState,
   ReadinessState,
   StationState,
   UserState,
   WarehouseState,
   WorkOrderState,
   add_station_comment,
   complete_work_order,
   create_part_request,
   create_work_order,
   dispatch_parts,
   get_needed_parts,
   get_products,
   get_work_order,
   health_check,
   list_work_orders,
   login,
   oauth_callback,
   oauth_login,
   readiness_check,
   signup,
   update_unit_comment,
   update_unit_status,
};
use middleware::{AuthLayerState, require_auth};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use usecase::{
   AuthUseCase,
   AuthUseCaseImpl,
   SupplyUseCase,
   SupplyUseCaseImpl,
   WorkOrderUseCase,
   WorkOrderUseCaseImpl,
};

/// API サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
   // .env ファイルを読み込む（存在する場合）
   dotenvy::dotenv().ok();

   // トレーシング初期化
   let tracing_config = TracingConfig::from_env("api");
   genbaflow_shared::observability::init_tracing(tracing_config);
   let _tracing_guard = tracing::info_span!("app", service = "api").entered();

   // 設定読み込み
   let config = ApiConfig::from_env().expect("設定の読み込みに失敗しました");

   tracing::info!(
      "API サーバーを起動します: {}:{}",
      config.host,
      config.port
   );

   // データベース接続プールを作成
   let pool = db::create_pool(&config.database_url)
      .await
      .expect("データベース接続に失敗しました");
   tracing::info!("データベースに接続しました");

   // マイグレーション実行
   db::run_migrations(&pool)
      .await
      .expect("マイグレーションの実行に失敗しました");
   tracing::info!("マイグレーションを適用しました");

   // OAuth プロバイダ（クライアント ID とシークレットがある場合のみ）
   let oauth_provider: Option<Arc<dyn OAuthProvider>> = match &config.google {
      Some(google) => {
         let provider = GoogleOAuthProvider::discover(
            &google.client_id,
            &google.client_secret,
            &google.discovery_url,
         )
         .await
         .expect("OAuth ディスカバリ文書の取得に失敗しました");
         tracing::info!("Google OAuth を設定しました");
         Some(Arc::new(provider))
      }
      None => {
         tracing::warn!("Google OAuth は未設定です（OAuth ログインは 503 を返します）");
         None
      }
   };

   // 共有コンポーネント
   let token_service: Arc<dyn TokenService> =
      Arc::new(Hs256TokenService::new(&config.jwt_secret_key));
   let password_hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
   let clock: Arc<dyn Clock> = Arc::new(SystemClock);

   // リポジトリ
   let user_repository: Arc<dyn UserRepository> =
      Arc::new(PostgresUserRepository::new(pool.clone()));
   let product_repository: Arc<dyn ProductRepository> =
      Arc::new(PostgresProductRepository::new(pool.clone()));
   let work_order_repository: Arc<dyn WorkOrderRepository> =
      Arc::new(PostgresWorkOrderRepository::new(pool.clone()));
   let station_status_repository: Arc<dyn StationStatusRepository> =
      Arc::new(PostgresStationStatusRepository::new(pool.clone()));
   let supply_repository: Arc<dyn SupplyRepository> =
      Arc::new(PostgresSupplyRepository::new(pool.clone()));

   // ユースケース
   let auth_usecase: Arc<dyn AuthUseCase> = Arc::new(AuthUseCaseImpl::new(
      user_repository,
      password_hasher,
      token_service.clone(),
      oauth_provider,
      clock,
   ));
   let work_order_usecase: Arc<dyn WorkOrderUseCase> = Arc::new(WorkOrderUseCaseImpl::new(
      work_order_repository.clone(),
      station_status_repository,
   ));
   let supply_usecase: Arc<dyn SupplyUseCase> = Arc::new(SupplyUseCaseImpl::new(
      supply_repository,
      work_order_repository,
   ));

   // ハンドラ状態
   let readiness_state = Arc::new(ReadinessState { pool: pool.clone() });
   let user_state = Arc::new(UserState {
      usecase: auth_usecase.clone(),
   });
   let auth_state = Arc::new(AuthState {
      usecase:      auth_usecase,
      frontend_url: config.frontend_url.clone(),
      redirect_uri: config.oauth_redirect_uri(),
   });
   let work_order_state = Arc::new(WorkOrderState {
      usecase: work_order_usecase.clone(),
   });
   let station_state = Arc::new(StationState {
      usecase: work_order_usecase,
   });
   let part_state = Arc::new(PartState {
      product_repository,
      usecase: supply_usecase.clone(),
   });
   let warehouse_state = Arc::new(WarehouseState {
      usecase: supply_usecase,
   });

   let auth_layer_state = AuthLayerState { token_service };

   // 公開ルート（読み取り系と認証フロー）
   let public_routes = Router::new()
      .route("/health", get(health_check))
      .merge(
         Router::new()
            .route("/health/ready", get(readiness_check))
            .with_state(readiness_state),
      )
      .merge(
         Router::new()
            .route("/api/users/signup", post(signup))
            .with_state(user_state),
      )
      .merge(
         Router::new()
            .route("/api/auth/login", post(login).get(oauth_login))
            .route("/api/auth/callback", get(oauth_callback))
            .with_state(auth_state),
      )
      .merge(
         Router::new()
            .route("/api/workorders", get(list_work_orders))
            .route("/api/workorders/{work_order_id}", get(get_work_order))
            .with_state(work_order_state.clone()),
      )
      .merge(
         Router::new()
            .route("/api/parts/products", get(get_products))
            .route("/api/parts/needed_parts", get(get_needed_parts))
            .with_state(part_state.clone()),
      );

   // 認証必須ルート（書き込み系すべて）
   let protected_routes = Router::new()
      .merge(
         Router::new()
            .route("/api/workorders/create_workorder", post(create_work_order))
            .route("/api/workorders/complete", post(complete_work_order))
            .route(
               "/api/workorders/{work_order_id}/units/{unit_number}/stations/{station_number}/comment",
               put(update_unit_comment),
            )
            .route(
               "/api/workorders/{work_order_id}/units/{unit_number}/stations/{station_number}/status",
               put(update_unit_status),
            )
            .with_state(work_order_state),
      )
      .merge(
         Router::new()
            .route("/api/stations/comment", post(add_station_comment))
            .with_state(station_state),
      )
      .merge(
         Router::new()
            .route("/api/parts/part_request", post(create_part_request))
            .with_state(part_state),
      )
      .merge(
         Router::new()
            .route("/api/warehouse/dispatch", post(dispatch_parts))
            .with_state(warehouse_state),
      )
      .layer(from_fn_with_state(auth_layer_state, require_auth));

   // ルーター構築
   let app = Router::new()
      .merge(public_routes)
      .merge(protected_routes)
      .layer(CorsLayer::permissive())
      .layer(TraceLayer::new_for_http());

   let addr: SocketAddr = format!("{}:{}", config.host, config.port)
      .parse()
      .expect("アドレスのパースに失敗しました");

   let listener = TcpListener::bind(addr).await?;
   tracing::info!("API サーバーが起動しました: {}", addr);

   axum::serve(listener, app).await?;

   Ok(())
}
