use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::decode_header;
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

/// The signed-in person, as described by the identity provider's credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "sub")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: String,
}

/// Read the claims of an ID token handed over by the sign-in widget.
///
/// The provider's client library has already checked the signature before
/// invoking the sign-in callback, so only the header and claims are parsed.
pub fn decode_credential(credential: &str) -> Result<UserProfile, SubmitError> {
    let invalid =
        |detail: String| SubmitError::Authentication(format!("Invalid sign-in credential: {detail}"));

    decode_header(credential).map_err(|e| invalid(e.to_string()))?;

    let payload = credential
        .split('.')
        .nth(1)
        .ok_or_else(|| invalid("missing payload".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| invalid(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))
}

/// Explicit sign-in state for one form instance.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<UserProfile>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, credential: &str) -> Result<&UserProfile, SubmitError> {
        let profile = decode_credential(credential)?;
        tracing::info!("Signed in as {}", profile.email);
        Ok(self.user.insert(profile))
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!("Signed out {}", user.email);
        }
    }

    pub fn current(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> Result<&UserProfile, SubmitError> {
        self.user.as_ref().ok_or_else(|| {
            SubmitError::Authentication("Sign in with your Google account first".to_string())
        })
    }
}
