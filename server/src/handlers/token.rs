use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::{
    access_token::{now_secs, AccessTokenIssuer},
    config::Settings,
    error::Result,
};

pub const DEFAULT_ROOM: &str = "audio-room";
pub const DEFAULT_PARTICIPANT: &str = "user";

/// Query string of `/get-token/`. Absent parameters fall back to the defaults,
/// a repeated parameter keeps its last value, and values are otherwise taken
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQuery {
    pub room: String,
    pub participant: String,
}

impl TokenQuery {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut room = None;
        let mut participant = None;

        for (key, value) in pairs {
            match key.as_str() {
                "room" => room = Some(value),
                "participant" => participant = Some(value),
                _ => {}
            }
        }

        Self {
            room: room.unwrap_or_else(|| DEFAULT_ROOM.to_string()),
            participant: participant.unwrap_or_else(|| DEFAULT_PARTICIPANT.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub livekit_url: String,
}

// Unauthenticated: any caller can mint a token for any room/participant pair.
pub async fn get_token(
    query: web::Query<Vec<(String, String)>>,
    issuer: web::Data<AccessTokenIssuer>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse> {
    let TokenQuery { room, participant } = TokenQuery::from_pairs(query.into_inner());

    let token = issuer.issue_token(&room, &participant, now_secs())?;

    let response = TokenResponse {
        token,
        livekit_url: settings.livekit.url.clone(),
    };

    Ok(HttpResponse::Ok().json(response))
}
