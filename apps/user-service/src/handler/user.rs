//! # ユーザーハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/users` - ユーザー作成（認証不要）
//! - `GET /api/users` - ユーザー一覧（管理者のみ）
//! - `GET /api/users/{id}` - ユーザー取得
//! - `GET /api/users/{id}/with-cards` - 所有カード付きでユーザー取得
//! - `GET /api/users/email/{email}` - メールアドレスでユーザー取得
//! - `PUT /api/users/{id}` - ユーザー更新
//! - `DELETE /api/users/{id}` - ユーザー削除（所有カードも削除）

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use userhub_domain::{
    identity::Identity,
    user::{User, UserId},
};
use userhub_shared::{ApiResponse, PaginatedResponse};
use uuid::Uuid;

use crate::{
    error::CoreError,
    extract::{ApiJson, ApiPath, ApiQuery},
    handler::{PageQuery, card::CardResponse},
    usecase::{UserInput, UserUseCaseImpl, UserWithCards},
};

/// ユーザー API の共有状態
pub struct UserState {
    pub usecase: UserUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// ユーザー作成・更新リクエスト
///
/// 文字列項目の欠落は空文字として扱い、ドメインの検証エラーにする。
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub name:       String,
    #[serde(default)]
    pub surname:    String,
    #[serde(alias = "birthDate")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub email:      String,
}

impl UserRequest {
    fn into_input(self) -> Result<UserInput, CoreError> {
        let birth_date = self
            .birth_date
            .ok_or_else(|| CoreError::Validation("生年月日は必須です".to_string()))?;
        Ok(UserInput {
            name: self.name,
            surname: self.surname,
            birth_date,
            email: self.email,
        })
    }
}

/// ユーザー情報レスポンス
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id:         Uuid,
    pub name:       String,
    pub surname:    String,
    pub birth_date: NaiveDate,
    pub email:      String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id:         *user.id().as_uuid(),
            name:       user.name().as_str().to_string(),
            surname:    user.surname().as_str().to_string(),
            birth_date: user.birth_date().as_date(),
            email:      user.email().as_str().to_string(),
        }
    }
}

/// 所有カード付きユーザーレスポンス
#[derive(Debug, Serialize)]
pub struct UserWithCardsResponse {
    #[serde(flatten)]
    pub user:  UserResponse,
    pub cards: Vec<CardResponse>,
}

impl From<&UserWithCards> for UserWithCardsResponse {
    fn from(value: &UserWithCards) -> Self {
        Self {
            user:  UserResponse::from(&value.user),
            cards: value.cards.iter().map(CardResponse::from).collect(),
        }
    }
}

// --- ハンドラ ---

/// POST /api/users
///
/// ## レスポンス
///
/// - `201 Created`: 作成したユーザー
/// - `400 Bad Request`: 入力値が不正
/// - `409 Conflict`: メールアドレスが使用済み
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<Arc<UserState>>,
    ApiJson(req): ApiJson<UserRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let user = state.usecase.create(req.into_input()?).await?;

    let response = ApiResponse::new(UserResponse::from(&user));
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/users/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_user(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let user = state
        .usecase
        .get_by_id(&identity, &UserId::from_uuid(id))
        .await?;

    Ok(Json(ApiResponse::new(UserResponse::from(&user))))
}

/// GET /api/users/{id}/with-cards
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_user_with_cards(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let result = state
        .usecase
        .get_with_cards(&identity, &UserId::from_uuid(id))
        .await?;

    Ok(Json(ApiResponse::new(UserWithCardsResponse::from(&result))))
}

/// GET /api/users?page=&size=
///
/// 管理者以外は 403。
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<Identity>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let page = state.usecase.get_all(&identity, query.into_request()).await?;

    let items = page.items.iter().map(UserResponse::from).collect();
    Ok(Json(PaginatedResponse::new(
        items,
        page.page,
        page.size,
        page.total_elements,
    )))
}

/// GET /api/users/email/{email}
#[tracing::instrument(skip_all)]
pub async fn get_user_by_email(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(email): ApiPath<String>,
) -> Result<impl IntoResponse, CoreError> {
    let user = state.usecase.get_by_email(&identity, &email).await?;

    Ok(Json(ApiResponse::new(UserResponse::from(&user))))
}

/// PUT /api/users/{id}
///
/// 名前・姓・生年月日・メールアドレスをすべて置き換える。
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_user(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UserRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let user = state
        .usecase
        .update(&identity, &UserId::from_uuid(id), req.into_input()?)
        .await?;

    Ok(Json(ApiResponse::new(UserResponse::from(&user))))
}

/// DELETE /api/users/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_user(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    state
        .usecase
        .delete_by_id(&identity, &UserId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
