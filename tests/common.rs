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

use lazy_static::lazy_static;
use warp::{
    http::header::{LOCATION, SET_COOKIE},
    Filter, Reply,
};

use cocktail_catalog::{auth, routes, Config, Store};

pub const ADMIN: &str = "admin";

lazy_static! {
    static ref CONFIG: Config = Config {
        database_url: "memory://".to_string(),
        secret_key: "integration-test-secret".to_string(),
        admin_username: ADMIN.to_string(),
        password_iterations: 1_000,
        ..Default::default()
    };
}

/// A fresh in-memory application and a handle on its store.
pub fn app() -> (
    impl Filter<Extract = impl Reply, Error = Infallible> + Clone + 'static,
    Store,
) {
    let store = Store::memory();
    (routes(store.clone(), CONFIG.clone()), store)
}

/// The parts of a response the tests look at.
#[derive(Debug)]
pub struct Page {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

/// Carries the session cookie from one request to the next.
#[derive(Debug, Default)]
pub struct Browser {
    cookie: Option<String>,
}

impl Browser {
    pub async fn get<F>(&mut self, app: &F, path: &str) -> Page
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        let mut req = warp::test::request().method("GET").path(path);
        if let Some(cookie) = &self.cookie {
            req = req.header("cookie", cookie.as_str());
        }
        self.finish(req.reply(app).await)
    }

    pub async fn post<F>(&mut self, app: &F, path: &str, form: &[(&str, &str)]) -> Page
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        let body = encode_form(form);
        let mut req = warp::test::request()
            .method("POST")
            .path(path)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body);
        if let Some(cookie) = &self.cookie {
            req = req.header("cookie", cookie.as_str());
        }
        self.finish(req.reply(app).await)
    }

    /// Follows `page` once if it is a redirect.
    pub async fn follow<F>(&mut self, app: &F, page: Page) -> Page
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        match page.location {
            Some(location) if page.status == 303 => self.get(app, &location).await,
            _ => page,
        }
    }

    pub async fn register<F>(&mut self, app: &F, username: &str, password: &str) -> Page
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        self.post(
            app,
            "/register",
            &[
                ("username", username),
                ("password", password),
                ("confirm_password", password),
            ],
        )
        .await
    }

    pub async fn login<F>(&mut self, app: &F, username: &str, password: &str) -> Page
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        self.post(
            app,
            "/login",
            &[("username", username), ("password", password)],
        )
        .await
    }

    fn finish(&mut self, res: warp::http::Response<impl AsRef<[u8]>>) -> Page {
        if let Some(cookie) = res.headers().get(SET_COOKIE) {
            let cookie = cookie.to_str().expect("ascii cookie");
            let pair = cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }
        Page {
            status: res.status().as_u16(),
            location: res
                .headers()
                .get(LOCATION)
                .map(|v| v.to_str().expect("ascii location").to_string()),
            body: String::from_utf8_lossy(res.body().as_ref()).into_owned(),
        }
    }
}

fn encode_form(form: &[(&str, &str)]) -> String {
    let encode = |s: &str| {
        let mut out = String::new();
        for c in s.chars() {
            match c {
                ' ' => out.push('+'),
                '&' | '=' | '+' | '%' | '#' => out.push_str(&format!("%{:02X}", c as u32)),
                c => out.push(c),
            }
        }
        out
    };
    form.iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Registers `username` directly against the store.
pub async fn seed_user(store: &Store, username: &str, password: &str) {
    auth::register(store, username, password, &CONFIG)
        .await
        .expect("seeded user");
}

pub fn cocktail_form<'a>(name: &'a str, category: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("category_name", category),
        ("cocktail_name", name),
        ("cocktail_description", "A classic"),
        ("cocktail_ingredients", "gin, vermouth"),
        ("cocktail_instructions", "Stir with ice"),
        ("cocktail_serving", "Coupe"),
        ("cocktail_img", "https://img.example/drink.jpg"),
    ]
}
