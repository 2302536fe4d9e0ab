//! Auth service endpoints: sign-up, sign-in, sign-out, password reset.

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use podium_shared::NewProfile;

use crate::api::{snippet, Remote};
use crate::error::{RemoteError, Result};

/// Authenticated backend user, as reported by the auth service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An access token plus the user it belongs to.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

/// Free-form metadata attached to the auth user at sign-up.
#[derive(Serialize)]
struct SignUpMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

/// With auto-confirm enabled the sign-up response carries a session; with
/// email confirmation pending it is just the bare user object.
#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl Remote {
    /// Create an auth user.  Returns the new user plus a session when the
    /// backend confirms immediately; the session (if any) is installed on
    /// this handle.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        details: &NewProfile,
    ) -> Result<(AuthUser, Option<Session>)> {
        let body = SignUpRequest {
            email,
            password,
            data: SignUpMetadata {
                name: &details.name,
                bio: details.bio.as_deref(),
                location: details.location.as_deref(),
            },
        };

        let resp = self
            .authed(self.http().post(self.config().auth_url("signup")))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(auth_error(resp).await);
        }

        let parsed: SignUpResponse = resp.json().await?;
        let user = match (parsed.user, parsed.id) {
            (Some(user), _) => user,
            (None, Some(id)) => AuthUser {
                id,
                email: parsed.email,
            },
            (None, None) => {
                return Err(RemoteError::Auth(
                    "sign-up response carried no user".to_string(),
                ))
            }
        };

        let session = parsed.access_token.map(|access_token| Session {
            access_token,
            user: user.clone(),
        });

        if let Some(session) = &session {
            self.set_session(session.clone());
        }

        debug!(user_id = %user.id, confirmed = session.is_some(), "sign-up accepted");
        Ok((user, session))
    }

    /// Exchange credentials for a session and install it on this handle.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let resp = self
            .authed(self.http().post(self.config().auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(auth_error(resp).await);
        }

        let session: Session = resp.json().await?;
        self.set_session(session.clone());

        debug!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Revoke the session server-side.  The local session is dropped even
    /// if the revocation fails.
    pub async fn sign_out(&self) -> Result<()> {
        let sent = self
            .authed(self.http().post(self.config().auth_url("logout")))
            .send()
            .await;

        self.clear_session();

        let resp = sent?;
        if !resp.status().is_success() {
            return Err(auth_error(resp).await);
        }
        Ok(())
    }

    /// Ask the auth service to email a password recovery link.
    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        let resp = self
            .authed(self.http().post(self.config().auth_url("recover")))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(auth_error(resp).await);
        }
        Ok(())
    }
}

/// Error bodies vary across auth endpoints; pick whichever detail field is
/// present.
async fn auth_error(resp: Response) -> RemoteError {
    #[derive(Deserialize)]
    struct AuthErrorBody {
        #[serde(default)]
        error_description: Option<String>,
        #[serde(default)]
        msg: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    let detail = serde_json::from_str::<AuthErrorBody>(&body)
        .ok()
        .and_then(|b| b.error_description.or(b.msg).or(b.error))
        .unwrap_or_else(|| snippet(&body));

    RemoteError::Auth(format!("{status}: {detail}"))
}
