//! # API サーバー設定
//!
//! 環境変数から API サーバーの設定を読み込む。

use std::env;

use genbaflow_infra::oauth::GOOGLE_DISCOVERY_URL;

/// Google OAuth の設定
///
/// クライアント ID とシークレットの両方が設定されている場合のみ有効。
#[derive(Debug, Clone)]
pub struct GoogleConfig {
   /// OAuth クライアント ID
   pub client_id:     String,
   /// OAuth クライアントシークレット
   pub client_secret: String,
   /// OpenID Connect ディスカバリ文書 URL
   pub discovery_url: String,
}

/// API サーバーの設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
   /// バインドアドレス
   pub host:            String,
   /// ポート番号
   pub port:            u16,
   /// データベース接続 URL
   pub database_url:    String,
   /// JWT 署名シークレット
   pub jwt_secret_key:  String,
   /// フロントエンドの URL（OAuth 後のリダイレクト先）
   pub frontend_url:    String,
   /// この API の公開 URL（OAuth の redirect_uri 構築用）
   pub public_base_url: String,
   /// Google OAuth 設定（未設定なら OAuth エンドポイントは 503 を返す）
   pub google:          Option<GoogleConfig>,
}

impl ApiConfig {
   /// 環境変数から設定を読み込む
   pub fn from_env() -> Result<Self, env::VarError> {
      let google = match (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_CLIENT_SECRET")) {
         (Ok(client_id), Ok(client_secret)) => Some(GoogleConfig {
            client_id,
            client_secret,
            discovery_url: env::var("GOOGLE_DISCOVERY_URL")
               .unwrap_or_else(|_| GOOGLE_DISCOVERY_URL.to_string()),
         }),
         _ => None,
      };

      Ok(Self {
         host:            env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
         port:            env::var("API_PORT")
            .expect("API_PORT が設定されていません")
            .parse()
            .expect("API_PORT は有効なポート番号である必要があります"),
         database_url:    env::var("DATABASE_URL")
            .expect("DATABASE_URL が設定されていません"),
         jwt_secret_key:  env::var("JWT_SECRET_KEY")
            .expect("JWT_SECRET_KEY が設定されていません"),
         frontend_url:    env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string()),
         public_base_url: env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:13000".to_string()),
         google,
      })
   }

   /// OAuth コールバックの redirect_uri を構築する
   pub fn oauth_redirect_uri(&self) -> String {
      format!(
         "{}/api/auth/callback",
         self.public_base_url.trim_end_matches('/')
      )
   }
}
