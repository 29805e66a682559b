//! In-memory stand-in for the Learn Sphere auth backend.
//!
//! Implements `/auth/login`, `/auth/refresh` (rotating), `/auth/validate`,
//! `/auth/logout` and a protected `GET /courses`, recording every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use super::transport::{ApiRequest, ApiResponse, HttpTransport, Method};
use super::types::{TokenPair, UserSession};
use crate::error::AuthError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
}

#[derive(Default)]
struct BackendState {
    accounts: Vec<(String, String, UserSession)>,
    access: HashMap<String, UserSession>,
    refresh: HashMap<String, UserSession>,
    next_token: u32,
    calls: Vec<Call>,
    /// Protected endpoints answer 401 regardless of the token.
    reject_protected: bool,
    /// `/auth/logout` fails at the transport level.
    logout_offline: bool,
    /// Every request fails at the transport level.
    offline: bool,
    /// Login responses embed the user profile.
    login_includes_user: bool,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: String,
}

pub fn user(id: &str, role: &str, is_educator: bool, is_admin: bool) -> UserSession {
    UserSession {
        id: id.to_owned(),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        is_educator,
        is_admin,
        role: role.to_owned(),
    }
}

pub fn student() -> UserSession {
    user("stu", "student", false, false)
}

pub fn admin() -> UserSession {
    user("adm", "admin", false, true)
}

fn json_response(status: u16, value: &impl serde::Serialize) -> ApiResponse {
    ApiResponse::new(status, serde_json::to_string(value).unwrap())
}

fn unauthorized() -> ApiResponse {
    ApiResponse::new(401, r#"{"message":"Unauthorized"}"#)
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_account(&self, email: &str, password: &str, user: UserSession) {
        self.lock().accounts.push((email.to_owned(), password.to_owned(), user));
    }

    /// Issue a session directly, as if the user had logged in earlier.
    pub fn issue(&self, user: &UserSession) -> TokenPair {
        let mut state = self.lock();
        Self::issue_locked(&mut state, user)
    }

    /// Forget an access token so the next use of it gets a 401.
    pub fn expire_access(&self, token: &str) {
        self.lock().access.remove(token);
    }

    pub fn revoke_refresh(&self, token: &str) {
        self.lock().refresh.remove(token);
    }

    pub fn set_reject_protected(&self, on: bool) {
        self.lock().reject_protected = on;
    }

    pub fn set_logout_offline(&self, on: bool) {
        self.lock().logout_offline = on;
    }

    pub fn set_offline(&self, on: bool) {
        self.lock().offline = on;
    }

    pub fn set_login_includes_user(&self, on: bool) {
        self.lock().login_includes_user = on;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.path == path).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    fn issue_locked(state: &mut BackendState, user: &UserSession) -> TokenPair {
        state.next_token += 1;
        let n = state.next_token;
        let pair = TokenPair { access_token: format!("access-{n}"), refresh_token: format!("refresh-{n}") };
        state.access.insert(pair.access_token.clone(), user.clone());
        state.refresh.insert(pair.refresh_token.clone(), user.clone());
        pair
    }

    fn handle(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, AuthError> {
        let mut state = self.lock();
        state.calls.push(Call {
            method: request.method.clone(),
            path: request.path.clone(),
            bearer: bearer.map(str::to_owned),
        });
        if state.offline {
            return Err(AuthError::Network("connection refused".into()));
        }
        let body = request.body.clone().unwrap_or(serde_json::Value::Null);

        match (request.method.as_str(), request.path.as_str()) {
            ("POST", "/auth/login") => {
                let Ok(login) = serde_json::from_value::<LoginBody>(body) else {
                    return Ok(ApiResponse::new(400, r#"{"message":"Bad request"}"#));
                };
                let found = state
                    .accounts
                    .iter()
                    .find(|(e, p, _)| *e == login.email && *p == login.password)
                    .map(|(_, _, u)| u.clone());
                let Some(user) = found else {
                    return Ok(ApiResponse::new(401, r#"{"message":"Invalid email or password"}"#));
                };
                let pair = Self::issue_locked(&mut state, &user);
                let mut value = serde_json::to_value(&pair).unwrap();
                if state.login_includes_user {
                    value["user"] = serde_json::to_value(&user).unwrap();
                }
                Ok(json_response(200, &value))
            }
            ("POST", "/auth/refresh") => {
                let Ok(refresh) = serde_json::from_value::<RefreshBody>(body) else {
                    return Ok(ApiResponse::new(400, r#"{"message":"Bad request"}"#));
                };
                let Some(user) = state.refresh.remove(&refresh.refresh_token) else {
                    return Ok(unauthorized());
                };
                let pair = Self::issue_locked(&mut state, &user);
                Ok(json_response(200, &pair))
            }
            ("POST", "/auth/logout") => {
                if state.logout_offline {
                    return Err(AuthError::Network("connection reset".into()));
                }
                if let Some(token) = bearer {
                    state.access.remove(token);
                }
                Ok(ApiResponse::new(204, ""))
            }
            ("GET", path) => {
                let user = bearer.and_then(|t| state.access.get(t).cloned());
                match (user, state.reject_protected) {
                    (Some(user), false) => match path {
                        "/auth/validate" => Ok(json_response(200, &serde_json::json!({ "user": user }))),
                        "/courses" => Ok(json_response(200, &serde_json::json!([{ "id": "c1", "title": "Rust 101" }]))),
                        _ => Ok(ApiResponse::new(404, r#"{"message":"Not found"}"#)),
                    },
                    _ => Ok(unauthorized()),
                }
            }
            _ => Ok(ApiResponse::new(404, r#"{"message":"Not found"}"#)),
        }
    }
}

#[async_trait::async_trait]
impl HttpTransport for FakeBackend {
    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, AuthError> {
        self.handle(request, bearer)
    }
}
