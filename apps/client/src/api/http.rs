use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::{AuthApi, SpacesApi};
use crate::errors::ClientError;
use crate::models::space::{AddMembersRequest, CreateSpaceRequest, Member, Space, SpaceId};
use crate::models::user::Identity;

const ME_PATH: &str = "/api/auth/me";
const LOGOUT_PATH: &str = "/api/auth/logout";
const SPACES_PATH: &str = "/api/spaces";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// reqwest-backed implementation of every backend collaborator.
///
/// Requests are credentialed: the client keeps a cookie jar and can be seeded
/// with a fixed session cookie.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session_cookie: Option<&str>,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
        }

        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            if status.is_server_error() {
                warn!("Backend returned {}: {}", status, message);
            }
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(ClientError::from_transport)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn me(&self) -> Result<Identity, ClientError> {
        self.send_json(self.client.get(self.url(ME_PATH))).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.send(self.client.get(self.url(LOGOUT_PATH))).await?;
        Ok(())
    }
}

#[async_trait]
impl SpacesApi for HttpApi {
    async fn list_spaces(&self) -> Result<Vec<Space>, ClientError> {
        let spaces: Vec<Space> = self.send_json(self.client.get(self.url(SPACES_PATH))).await?;
        debug!("Fetched {} spaces", spaces.len());
        Ok(spaces)
    }

    async fn create_space(&self, req: &CreateSpaceRequest) -> Result<Space, ClientError> {
        self.send_json(self.client.post(self.url(SPACES_PATH)).json(req))
            .await
    }

    async fn add_members(
        &self,
        space_id: SpaceId,
        req: &AddMembersRequest,
    ) -> Result<Vec<Member>, ClientError> {
        let url = self.url(&format!("{SPACES_PATH}/{space_id}/members"));
        self.send_json(self.client.post(url).json(req)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::space::SpaceType;
    use axum::extract::Path;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn space_json(id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "type": "PERSONAL",
            "members": [],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    fn api(base: &str) -> HttpApi {
        HttpApi::new(base, Duration::from_secs(5), Some("SESSION=abc")).unwrap()
    }

    #[tokio::test]
    async fn test_me_sends_session_cookie() {
        let app = Router::new().route(
            "/api/auth/me",
            get(|headers: AxumHeaders| async move {
                let cookie = headers
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if cookie.contains("SESSION=abc") {
                    Ok(Json(json!({"id": 7, "nickname": "jdoe"})))
                } else {
                    Err(AxumStatus::UNAUTHORIZED)
                }
            }),
        );
        let base = serve(app).await;

        let identity = api(&base).me().await.unwrap();
        assert_eq!(identity.id.as_str(), "7");
        assert_eq!(identity.name, "jdoe");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_dedicated_variant() {
        let app = Router::new().route("/api/auth/me", get(|| async { AxumStatus::UNAUTHORIZED }));
        let base = serve(app).await;

        let err = api(&base).me().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
    }

    #[tokio::test]
    async fn test_server_error_carries_backend_message() {
        let app = Router::new().route(
            "/api/spaces",
            get(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": "database unavailable"})),
                )
            }),
        );
        let base = serve(app).await;

        match api(&base).list_spaces().await.unwrap_err() {
            ClientError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_spaces_preserves_server_order() {
        let app = Router::new().route(
            "/api/spaces",
            get(|| async { Json(json!([space_json(9, "Team"), space_json(5, "Mine")])) }),
        );
        let base = serve(app).await;

        let spaces = api(&base).list_spaces().await.unwrap();
        let ids: Vec<_> = spaces.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![9, 5]);
    }

    #[tokio::test]
    async fn test_create_space_posts_type_and_name() {
        let app = Router::new().route(
            "/api/spaces",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["type"], "TEAM");
                assert_eq!(body["members"], json!(["bob"]));
                let mut space = space_json(11, body["name"].as_str().unwrap_or_default());
                space["type"] = json!("TEAM");
                Json(space)
            }),
        );
        let base = serve(app).await;

        let created = api(&base)
            .create_space(&CreateSpaceRequest {
                space_type: SpaceType::Team,
                name: "Study Group".to_string(),
                members: vec!["bob".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(created.id, 11);
        assert_eq!(created.name, "Study Group");
        assert_eq!(created.space_type, SpaceType::Team);
    }

    #[tokio::test]
    async fn test_add_members_targets_space_route() {
        let app = Router::new().route(
            "/api/spaces/:id/members",
            post(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                assert_eq!(id, 5);
                let added: Vec<Value> = body["nicknames"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .enumerate()
                    .map(|(i, n)| json!({"id": 100 + i as i64, "nickname": n, "role": "MEMBER"}))
                    .collect();
                Json(Value::Array(added))
            }),
        );
        let base = serve(app).await;

        let members = api(&base)
            .add_members(
                5,
                &AddMembersRequest {
                    nicknames: vec!["bob".to_string(), "carol".to_string()],
                },
            )
            .await
            .unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].nickname, "carol");
        assert_eq!(members[1].id, 101);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_variant() {
        let app = Router::new().route(
            "/api/spaces",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!([]))
            }),
        );
        let base = serve(app).await;

        let api = HttpApi::new(&base, Duration::from_millis(100), None).unwrap();
        let err = api.list_spaces().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
    }

    #[tokio::test]
    async fn test_logout_ignores_response_body() {
        let app = Router::new().route("/api/auth/logout", get(|| async { "bye" }));
        let base = serve(app).await;

        api(&base).logout().await.unwrap();
    }
}
