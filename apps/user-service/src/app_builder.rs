//! # User Service アプリケーション構築
//!
//! DI（ユースケース・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。
//!
//! ## アクセス制御
//!
//! | ルート | 認証 |
//! |--------|------|
//! | `POST /api/users` | 不要 |
//! | `/api/users/**`, `/api/card_info/**` | Bearer トークン必須 |
//! | `/health`, `/health/ready` | 不要 |
//! | 上記以外 | 403 |

use std::sync::Arc;

use axum::{
    Json,
    Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use userhub_domain::clock::Clock;
use userhub_infra::{
    UserCache,
    db::TransactionManager,
    repository::{CardRepository, UserRepository},
};
use userhub_shared::{
    ErrorResponse,
    observability::{MakeRequestUuidV7, make_request_span},
};

use crate::{
    client::TokenValidator,
    handler::{
        CardState,
        ReadinessState,
        UserState,
        create_card,
        create_user,
        delete_card,
        delete_user,
        get_card,
        get_user,
        get_user_by_email,
        get_user_with_cards,
        health_check,
        list_cards,
        list_my_cards,
        list_users,
        readiness_check,
        update_user,
    },
    middleware::{AuthnState, require_authentication},
    usecase::{AccessGate, CardUseCaseImpl, UserUseCaseImpl},
};

/// アプリケーションの依存
///
/// `main` では PostgreSQL / Redis / Auth Service の実装を、テストでは
/// インメモリ実装やスタブを渡す。
pub struct AppDependencies {
    pub pool:            PgPool,
    pub user_repository: Arc<dyn UserRepository>,
    pub card_repository: Arc<dyn CardRepository>,
    pub tx_manager:      Arc<dyn TransactionManager>,
    pub cache:           Arc<dyn UserCache>,
    pub token_validator: Arc<dyn TokenValidator>,
    pub clock:           Arc<dyn Clock>,
}

/// DI コンテナの構築とルーター定義を行う
pub fn build_app(deps: AppDependencies) -> Router {
    let access = Arc::new(AccessGate::new(deps.user_repository.clone()));

    let user_state = Arc::new(UserState {
        usecase: UserUseCaseImpl::new(
            deps.user_repository.clone(),
            deps.card_repository.clone(),
            deps.tx_manager.clone(),
            deps.cache.clone(),
            access.clone(),
            deps.clock,
        ),
    });
    let card_state = Arc::new(CardState {
        usecase: CardUseCaseImpl::new(
            deps.card_repository,
            deps.user_repository,
            deps.tx_manager,
            access,
        ),
    });
    let readiness_state = Arc::new(ReadinessState {
        pool:  deps.pool,
        cache: deps.cache,
    });
    let authn_state = AuthnState {
        token_validator: deps.token_validator,
    };

    // 認証が必要な API
    // route_layer のため、未定義パスは認証を経ずに fallback（403）へ落ちる
    let protected_users = Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/api/users/{id}/with-cards", get(get_user_with_cards))
        .route("/api/users/email/{email}", get(get_user_by_email))
        .with_state(user_state.clone());
    let protected_cards = Router::new()
        .route("/api/card_info", get(list_cards).post(create_card))
        .route("/api/card_info/my", get(list_my_cards))
        .route("/api/card_info/{id}", get(get_card).delete(delete_card))
        .with_state(card_state);
    let protected = Router::new()
        .merge(protected_users)
        .merge(protected_cards)
        .route_layer(from_fn_with_state(authn_state, require_authentication));

    // 認証不要の API
    let public = Router::new()
        .route("/api/users", post(create_user))
        .with_state(user_state);
    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .with_state(readiness_state);

    // ルーター構築
    // 同一パスのメソッドはマージされる（POST /api/users のみ認証不要）
    // Request ID + TraceLayer により、すべての HTTP リクエストに request_id が付与されログに自動注入される
    Router::new()
        .merge(health)
        .merge(public)
        .merge(protected)
        .fallback(deny)
        .method_not_allowed_fallback(deny)
        // Request ID レイヤー（レイヤー順序が重要: 下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: リクエスト受信時に UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: カスタムスパンに request_id を含め、全ログに自動注入
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}

/// 定義されていないルートはすべて拒否する
async fn deny() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::forbidden("このリソースへのアクセスは許可されていません")),
    )
}
