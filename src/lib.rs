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

use std::{convert::Infallible, sync::Arc};

use warp::{Filter, Reply};

pub mod guard;
pub mod session;

pub mod auth;
pub mod category;
pub mod cocktail;

pub mod config;
pub mod models;
pub mod store;
pub mod view;

mod error;
mod util;

pub use config::Config;
pub use error::{handle_rejects, Error};
pub use store::Store;

use session::SessionKeys;

/// Opens the configured store and builds the full application filter.
pub async fn app(
    config: Config,
) -> Result<impl Filter<Extract = impl Reply, Error = Infallible> + Clone, Error> {
    let store = Store::connect(config.database_url.as_str()).await?;
    Ok(routes(store, config))
}

/// The application filter over an already opened store.
pub fn routes(
    store: Store,
    config: Config,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let keys = SessionKeys::from_secret(config.secret_key.as_bytes());
    let static_files = warp::path("static").and(warp::fs::dir(config.static_dir.clone()));
    let config = Arc::new(config);

    let auth_api = auth::api(store.clone(), keys.clone(), config.clone());
    let cocktail_api = cocktail::api(store.clone(), keys.clone(), config);
    let category_api = category::api(store, keys);

    cocktail_api
        .or(auth_api)
        .or(category_api)
        .or(static_files)
        .with(warp::filters::trace::request())
        .recover(handle_rejects)
}
