//! # カードハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/card_info` - カード作成
//! - `GET /api/card_info` - 全カード一覧（管理者のみ）
//! - `GET /api/card_info/my` - 自分のカード一覧
//! - `GET /api/card_info/{id}` - カード取得
//! - `DELETE /api/card_info/{id}` - カード削除

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use userhub_domain::{
    card::{Card, CardId},
    identity::Identity,
    page::Page,
};
use userhub_shared::{ApiResponse, PaginatedResponse};
use uuid::Uuid;

use crate::{
    error::CoreError,
    extract::{ApiJson, ApiPath, ApiQuery},
    handler::PageQuery,
    usecase::{CardInput, CardUseCaseImpl},
};

/// カード API の共有状態
pub struct CardState {
    pub usecase: CardUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// カード作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    #[serde(alias = "userId")]
    pub user_id:         Uuid,
    #[serde(default)]
    pub number:          String,
    #[serde(default)]
    pub holder:          String,
    #[serde(default, alias = "expirationDate")]
    pub expiration_date: String,
}

impl From<CreateCardRequest> for CardInput {
    fn from(req: CreateCardRequest) -> Self {
        Self {
            user_id:         req.user_id,
            number:          req.number,
            holder:          req.holder,
            expiration_date: req.expiration_date,
        }
    }
}

/// カード情報レスポンス
#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub id:              Uuid,
    pub user_id:         Uuid,
    pub number:          String,
    pub holder:          String,
    pub expiration_date: String,
}

impl From<&Card> for CardResponse {
    fn from(card: &Card) -> Self {
        Self {
            id:              *card.id().as_uuid(),
            user_id:         *card.user_id().as_uuid(),
            number:          card.number().as_str().to_string(),
            holder:          card.holder().as_str().to_string(),
            expiration_date: card.expiration_date().as_str().to_string(),
        }
    }
}

fn paginated(page: Page<Card>) -> PaginatedResponse<CardResponse> {
    let items = page.items.iter().map(CardResponse::from).collect();
    PaginatedResponse::new(items, page.page, page.size, page.total_elements)
}

// --- ハンドラ ---

/// POST /api/card_info
///
/// ## レスポンス
///
/// - `201 Created`: 作成したカード
/// - `400 Bad Request`: 入力値が不正（カード番号は 16 桁、有効期限は MM/YY）
/// - `403 Forbidden`: 他人名義のカード
/// - `404 Not Found`: 所有者が存在しない
/// - `409 Conflict`: カード番号が登録済み
#[tracing::instrument(skip_all)]
pub async fn create_card(
    State(state): State<Arc<CardState>>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<CreateCardRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let card = state.usecase.create(&identity, req.into()).await?;

    let response = ApiResponse::new(CardResponse::from(&card));
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/card_info/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_card(
    State(state): State<Arc<CardState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let card = state
        .usecase
        .get_by_id(&identity, &CardId::from_uuid(id))
        .await?;

    Ok(Json(ApiResponse::new(CardResponse::from(&card))))
}

/// GET /api/card_info/my?page=&size=
#[tracing::instrument(skip_all)]
pub async fn list_my_cards(
    State(state): State<Arc<CardState>>,
    Extension(identity): Extension<Identity>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let page = state
        .usecase
        .get_mine(&identity, query.into_request())
        .await?;

    Ok(Json(paginated(page)))
}

/// GET /api/card_info?page=&size=
///
/// 管理者以外は 403。
#[tracing::instrument(skip_all)]
pub async fn list_cards(
    State(state): State<Arc<CardState>>,
    Extension(identity): Extension<Identity>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let page = state
        .usecase
        .get_all(&identity, query.into_request())
        .await?;

    Ok(Json(paginated(page)))
}

/// DELETE /api/card_info/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_card(
    State(state): State<Arc<CardState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    state
        .usecase
        .delete(&identity, &CardId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
