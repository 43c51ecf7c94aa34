//! Per-client sessions
//!
//! `POST /session` hands out an opaque bearer token. Later requests present
//! it as `Authorization: Bearer <token>` and are served with the matching
//! [`Session`], so every client sees listings through its own user.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use listings::models::User;
use listings::remote::UserDirectory;
use listings::{Session, SyncResult};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::state::AppState;

/// Signed-in sessions keyed by bearer token
#[derive(Clone)]
pub struct SessionRegistry {
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionRegistry {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Open a session for `user_id` and return its token with the loaded user
    pub async fn sign_in(&self, user_id: &str) -> SyncResult<(String, Arc<User>)> {
        let session = Session::new(Arc::clone(&self.directory));
        let user = session.sign_in(user_id).await?;

        let token = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.lock().await;
        sessions.insert(token.clone(), session);
        info!("Opened session for user {} ({} active)", user_id, sessions.len());
        Ok((token, user))
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.lock().await.get(token).cloned()
    }

    /// Close the session behind `token`; returns whether it existed
    pub async fn sign_out(&self, token: &str) -> bool {
        match self.sessions.lock().await.remove(token) {
            Some(session) => {
                session.sign_out();
                true
            }
            None => false,
        }
    }
}

/// The client behind a request, anonymous when it sent no known token
#[derive(Clone, Default)]
pub struct Viewer {
    pub token: Option<String>,
    pub session: Option<Session>,
}

impl Viewer {
    pub fn user(&self) -> Option<Arc<User>> {
        self.session.as_ref().and_then(Session::current)
    }

    pub fn user_id(&self) -> Option<String> {
        self.session.as_ref().and_then(Session::user_id)
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Viewer::default());
        };

        let session = state.sessions.get(&token).await;
        if session.is_none() {
            info!("Request with unknown session token treated as anonymous");
        }
        Ok(Viewer {
            token: Some(token),
            session,
        })
    }
}
