//! # エクストラクタ
//!
//! axum 標準の `Json` / `Path` / `Query` をラップし、拒否時のレスポンスを
//! Problem Details 形式（[`CoreError`]）に揃える。
//!
//! | 拒否理由 | ステータス |
//! |---------|-----------|
//! | Content-Type が `application/json` でない | 415 |
//! | JSON 構文エラー・型不一致・必須フィールド欠落 | 400 |
//! | パスパラメータの形式不正（UUID でない等） | 400 |
//! | クエリパラメータの形式不正（負のページ番号等） | 400 |

use axum::{
    Json,
    extract::{
        FromRequest,
        FromRequestParts,
        Path,
        Query,
        Request,
        rejection::JsonRejection,
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::CoreError;

/// JSON ボディ
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::MissingJsonContentType(rejection)) => {
                Err(CoreError::UnsupportedMediaType(rejection.body_text()))
            }
            Err(rejection) => Err(CoreError::BadRequest(rejection.body_text())),
        }
    }
}

/// パスパラメータ
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| CoreError::BadRequest(rejection.body_text()))
    }
}

/// クエリパラメータ
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| CoreError::BadRequest(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, StatusCode, header},
        routing::{get, post},
    };
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct PageQuery {
        #[allow(dead_code)]
        page: Option<u32>,
    }

    async fn json_handler(ApiJson(_payload): ApiJson<Payload>) -> StatusCode {
        StatusCode::OK
    }

    async fn path_handler(ApiPath(_id): ApiPath<Uuid>) -> StatusCode {
        StatusCode::OK
    }

    async fn query_handler(ApiQuery(_query): ApiQuery<PageQuery>) -> StatusCode {
        StatusCode::OK
    }

    fn create_test_app() -> Router {
        Router::new()
            .route("/json", post(json_handler))
            .route("/items/{id}", get(path_handler))
            .route("/items", get(query_handler))
    }

    async fn problem_type(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["type"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_content_typeがjsonでなければ415() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/json")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(r#"{"name":"Tom"}"#))
            .unwrap();

        let response = create_test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_壊れたjsonはproblem_detailsの400() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"#))
            .unwrap();

        let response = create_test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            problem_type(response).await,
            "https://userhub.example.com/errors/bad-request"
        );
    }

    #[tokio::test]
    async fn test_必須フィールド欠落は400() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = create_test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_uuidでないパスパラメータは400() {
        let request = Request::builder()
            .uri("/items/not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = create_test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_負のページ番号は400() {
        let request = Request::builder()
            .uri("/items?page=-1")
            .body(Body::empty())
            .unwrap();

        let response = create_test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
