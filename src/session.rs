/*
 * Copyright (C) 2020 Oakes, Gregory <gregoryoakes@fastmail.com>
 * Author: Oakes, Gregory <gregory.oakes@fastmail.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

//! The per-request session.
//!
//! A session is carried client-side in the `session` cookie as an HS256 JWT.
//! Handlers receive it as a plain value, mutate it (log in, log out, queue
//! flash messages) and hand it back through [`Session::reply`], which
//! re-issues the cookie alongside the response.

use std::{convert::Infallible, fmt};

use chrono::Utc;
use cookie::{Cookie, SameSite};
use jsonwebtoken::{
    decode as jwt_decode, encode as jwt_encode, DecodingKey, EncodingKey, Header as JWTHeader,
    Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use warp::{
    http::{
        header::{HeaderValue, LOCATION, SET_COOKIE},
        StatusCode,
    },
    reply::{with_status, Response},
    Filter, Rejection, Reply,
};

use crate::{models::Role, view::Layout, Error};

pub const SESSION_COOKIE: &str = "session";

const TOKEN_LIFETIME_SECONDS: u64 = 604800;

/// The keys sessions are signed and verified with.
#[derive(Clone)]
pub struct SessionKeys {
    encoder: EncodingKey,
    decoder: DecodingKey<'static>,
}

impl SessionKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        SessionKeys {
            encoder: EncodingKey::from_secret(secret),
            decoder: DecodingKey::from_secret(secret).into_static(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SessionToken {
    iat: u64,
    exp: u64,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    flashes: Vec<String>,
}

#[derive(Clone)]
pub struct Session {
    keys: SessionKeys,
    user: Option<String>,
    role: Role,
    flashes: Vec<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("role", &self.role)
            .field("flashes", &self.flashes)
            .finish()
    }
}

impl Session {
    pub fn anonymous(keys: SessionKeys) -> Self {
        Session {
            keys,
            user: None,
            role: Role::Anonymous,
            flashes: Vec::new(),
        }
    }

    pub fn decode(keys: SessionKeys, raw: &str) -> Result<Self, Error> {
        let validation = Validation {
            leeway: 60,
            ..Default::default()
        };
        let token = jwt_decode::<SessionToken>(raw, &keys.decoder, &validation)?.claims;
        let role = match token.user {
            Some(_) if token.role != Role::Anonymous => token.role,
            Some(_) => Role::User,
            None => Role::Anonymous,
        };
        Ok(Session {
            keys,
            user: token.user,
            role,
            flashes: token.flashes,
        })
    }

    /// Anything that does not verify is treated as no session at all.
    pub fn from_cookie(keys: SessionKeys, raw: Option<String>) -> Self {
        match raw {
            Some(raw) => Session::decode(keys.clone(), raw.as_str()).unwrap_or_else(|e| {
                debug!("discarding session cookie: {}", e);
                Session::anonymous(keys)
            }),
            None => Session::anonymous(keys),
        }
    }

    pub fn encode(&self) -> Result<String, Error> {
        let now = Utc::now().timestamp() as u64;
        let token = SessionToken {
            iat: now,
            exp: now + TOKEN_LIFETIME_SECONDS,
            user: self.user.clone(),
            role: self.role,
            flashes: self.flashes.clone(),
        };
        Ok(jwt_encode(&JWTHeader::default(), &token, &self.keys.encoder)?)
    }

    /// The `Set-Cookie` value for this session. No `Max-Age`, so the browser
    /// drops it when the browsing session ends.
    pub fn cookie(&self) -> Result<String, Error> {
        let cookie = Cookie::build((SESSION_COOKIE, self.encode()?))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        Ok(cookie.to_string())
    }

    pub fn login(&mut self, username: &str, role: Role) {
        self.user = Some(username.to_string());
        self.role = match role {
            Role::Anonymous => Role::User,
            role => role,
        };
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.role = Role::Anonymous;
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn flash<S: Into<String>>(&mut self, message: S) {
        self.flashes.push(message.into());
    }

    pub fn flashes(&self) -> &[String] {
        &self.flashes
    }

    pub fn take_flashes(&mut self) -> Vec<String> {
        std::mem::replace(&mut self.flashes, Vec::new())
    }

    /// Consumes the pending flash messages into the chrome of a page.
    pub fn layout(&mut self) -> Layout {
        Layout {
            user: self.user.clone(),
            admin: self.role == Role::Admin,
            flashes: self.take_flashes(),
        }
    }

    /// Attaches the current session cookie to `reply`.
    pub fn reply<T: Reply>(&self, reply: T) -> Result<Response, Rejection> {
        let cookie = HeaderValue::from_str(self.cookie()?.as_str()).map_err(Error::from)?;
        let mut response = reply.into_response();
        response.headers_mut().append(SET_COOKIE, cookie);
        Ok(response)
    }

    pub fn redirect(&self, location: &str) -> Result<Response, Rejection> {
        let location = HeaderValue::from_str(location).map_err(Error::from)?;
        let mut response = with_status(warp::reply(), StatusCode::SEE_OTHER).into_response();
        response.headers_mut().insert(LOCATION, location);
        self.reply(response)
    }

    pub fn html(&self, page: String) -> Result<Response, Rejection> {
        self.reply(warp::reply::html(page))
    }
}

/// Extracts the request's session, falling back to an anonymous one.
pub fn session(keys: SessionKeys) -> impl Filter<Extract = (Session,), Error = Infallible> + Clone {
    warp::cookie::optional(SESSION_COOKIE)
        .map(move |raw: Option<String>| Session::from_cookie(keys.clone(), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::from_secret(b"session-test-secret")
    }

    #[test]
    fn login_survives_the_cookie_round_trip() {
        let mut session = Session::anonymous(keys());
        session.login("alice", Role::User);
        session.flash("Welcome, alice");

        let decoded = Session::decode(keys(), session.encode().unwrap().as_str()).unwrap();
        assert_eq!(decoded.current_user(), Some("alice"));
        assert_eq!(decoded.role(), Role::User);
        assert_eq!(decoded.flashes(), &["Welcome, alice".to_string()][..]);
    }

    #[test]
    fn logout_clears_identity_and_is_idempotent() {
        let mut session = Session::anonymous(keys());
        session.logout();
        assert_eq!(session.current_user(), None);

        session.login("admin", Role::Admin);
        session.logout();
        assert_eq!(session.current_user(), None);
        assert_eq!(session.role(), Role::Anonymous);
    }

    #[test]
    fn tampered_or_foreign_tokens_are_anonymous() {
        let mut session = Session::anonymous(keys());
        session.login("admin", Role::Admin);
        let token = session.encode().unwrap();

        let other = SessionKeys::from_secret(b"some-other-secret");
        let forged = Session::from_cookie(other, Some(token.clone()));
        assert_eq!(forged.current_user(), None);

        let garbage = Session::from_cookie(keys(), Some(format!("{}x", token)));
        assert_eq!(garbage.current_user(), None);
    }

    #[test]
    fn cookie_is_scoped_and_http_only() {
        let mut session = Session::anonymous(keys());
        session.login("alice", Role::User);
        let header = session.cookie().unwrap();

        let parsed = Cookie::parse(header.as_str()).unwrap();
        assert_eq!(parsed.name(), SESSION_COOKIE);
        assert_eq!(parsed.path(), Some("/"));
        assert_eq!(parsed.http_only(), Some(true));
        assert_eq!(parsed.same_site(), Some(SameSite::Lax));
        assert_eq!(parsed.max_age(), None);

        let decoded = Session::decode(keys(), parsed.value()).unwrap();
        assert_eq!(decoded.current_user(), Some("alice"));
    }

    #[test]
    fn layout_consumes_flashes() {
        let mut session = Session::anonymous(keys());
        session.flash("one");
        let layout = session.layout();
        assert_eq!(layout.flashes, vec!["one".to_string()]);
        assert!(session.flashes().is_empty());
    }
}
