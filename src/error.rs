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

use std::convert::Infallible;

use mobc_postgres::tokio_postgres;
use tracing::{debug, error};
use warp::{
    http::{header::InvalidHeaderValue, StatusCode},
    reject,
    reply::{html, with_status},
    Rejection, Reply,
};

use crate::view;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    DBPoolError(#[from] mobc::Error<tokio_postgres::Error>),
    #[error(transparent)]
    DBError(#[from] tokio_postgres::Error),
    #[error(transparent)]
    JWTError(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    HeaderError(#[from] InvalidHeaderValue),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("resource not found")]
    NotFound,
    #[error("Usernames may only contain letters, numbers, '.', '_' and '-'.")]
    InvalidUsername,
    #[error("Username already exists. Please choose another username.")]
    UsernameTaken,
    #[error("Please ensure that your passwords match.")]
    PasswordMismatch,
    #[error("Incorrect Username and/or Password")]
    InvalidCredentials,
}

impl Error {
    /// Errors the user can fix by resubmitting a form. Their `Display` text is
    /// shown to the user as a flash message.
    pub fn is_validation(&self) -> bool {
        match self {
            Error::InvalidUsername
            | Error::UsernameTaken
            | Error::PasswordMismatch
            | Error::InvalidCredentials => true,
            _ => false,
        }
    }
}

impl reject::Reject for Error {}

impl From<Error> for Rejection {
    fn from(item: Error) -> Rejection {
        reject::custom(item)
    }
}

pub async fn handle_rejects(err: Rejection) -> Result<impl Reply, Infallible> {
    let code = if let Some(e) = err.find::<Error>() {
        match e {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidUsername | Error::PasswordMismatch => StatusCode::BAD_REQUEST,
            Error::UsernameTaken => StatusCode::CONFLICT,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            e => {
                error!("request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        debug!("rejected form body: {}", e);
        StatusCode::BAD_REQUEST
    } else if let Some(_) = err.find::<reject::PayloadTooLarge>() {
        StatusCode::PAYLOAD_TOO_LARGE
    } else if let Some(_) = err.find::<reject::MethodNotAllowed>() {
        StatusCode::METHOD_NOT_ALLOWED
    } else {
        error!("unhandled rejection: {:?}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok(with_status(html(view::error_page(code)), code))
}
