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

use std::{
    env,
    fmt::Display,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    str::FromStr,
};

use serde::Serialize;
use tracing::{info, warn};

use crate::{util, Error};

const DEFAULT_DATABASE_URL: &'static str = "postgres://postgres@0.0.0.0:5432";
const DEFAULT_IP: &'static str = "127.0.0.1";
const DEFAULT_PORT: &'static str = "8080";
const DEFAULT_ADMIN_USERNAME: &'static str = "admin";
const DEFAULT_STATIC_DIR: &'static str = "static";
const DEFAULT_PASSWORD_ITERATIONS: &'static str = "150000";

/// Public settings of the hosted image-upload widget. The upload itself
/// happens in the browser; only the resulting URL reaches this server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageHost {
    pub cloud_name: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `postgres://...`, or `memory://` for a process-local store.
    pub database_url: String,
    pub secret_key: String,
    pub addr: SocketAddr,
    /// Registering under this name yields the admin role.
    pub admin_username: String,
    pub image_host: Option<ImageHost>,
    pub static_dir: PathBuf,
    /// PBKDF2 rounds for newly stored passwords. Existing hashes keep the
    /// count they were created with.
    pub password_iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            secret_key: util::random_string(32),
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            image_host: None,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            password_iterations: 150_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let secret_key = match env::var("SECRET_KEY") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("SECRET_KEY not set, sessions will not survive a restart");
                util::random_string(32)
            }
        };

        let ip: IpAddr = parse("IP", DEFAULT_IP)?;
        let port: u16 = parse("PORT", DEFAULT_PORT)?;
        let password_iterations: u32 = parse("PASSWORD_ITERATIONS", DEFAULT_PASSWORD_ITERATIONS)?;
        if password_iterations == 0 {
            return Err(Error::Config("PASSWORD_ITERATIONS must be positive".into()));
        }

        let image_host = match (env::var("CLOUD_NAME"), env::var("UPLOAD_PRESET")) {
            (Ok(cloud_name), Ok(upload_preset)) => Some(ImageHost {
                cloud_name,
                upload_preset,
            }),
            _ => {
                info!("CLOUD_NAME or UPLOAD_PRESET not set, image uploads take plain URLs");
                None
            }
        };

        Ok(Config {
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            secret_key,
            addr: SocketAddr::new(ip, port),
            admin_username: var_or("ADMIN_USERNAME", DEFAULT_ADMIN_USERNAME).to_lowercase(),
            image_host,
            static_dir: PathBuf::from(var_or("STATIC_DIR", DEFAULT_STATIC_DIR)),
            password_iterations,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{} not set, using default: {}", key, default);
        default.to_string()
    })
}

fn parse<T: FromStr>(key: &str, default: &str) -> Result<T, Error>
where
    T::Err: Display,
{
    var_or(key, default)
        .parse()
        .map_err(|e| Error::Config(format!("invalid {}: {}", key, e)))
}
