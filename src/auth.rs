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

use std::sync::Arc;

use crypto::pbkdf2::{pbkdf2_check, pbkdf2_simple};
use tracing::{info, warn};
use warp::{reply::Response, Filter, Rejection, Reply};

use crate::{
    config::Config,
    guard::{self, AuthorizationGuard},
    models::{LoginForm, RegisterForm, Role, User},
    session::{self, Session, SessionKeys},
    store::{CocktailFilter, Store},
    util, view, Error,
};

const FORM_LIMIT: u64 = 1024 * 16;

pub fn api(
    store: Store,
    keys: SessionKeys,
    config: Arc<Config>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let register_form = warp::path!("register")
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and_then(register_form);

    let register = warp::path!("register")
        .and(warp::post())
        .and(session::session(keys.clone()))
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .and(guard::with_store(store.clone()))
        .and(guard::with_config(config))
        .and_then(register_user);

    let login_form = warp::path!("login")
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and_then(login_form);

    let login = warp::path!("login")
        .and(warp::post())
        .and(session::session(keys.clone()))
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .and(guard::with_store(store.clone()))
        .and_then(login_user);

    let profile = warp::path!("profile" / String)
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(profile);

    let logout = warp::path!("logout")
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and_then(logout);

    let delete_profile = warp::path!("delete_profile" / String)
        .and(warp::get())
        .and(session::session(keys))
        .and(guard::with_store(store))
        .and_then(delete_profile);

    register_form
        .or(register)
        .or(login_form)
        .or(login)
        .or(profile)
        .or(logout)
        .or(delete_profile)
}

/// Salted PBKDF2-HMAC-SHA256 in rust-crypto's self-describing `$rpbkdf2$`
/// format, which records its own iteration count.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, Error> {
    Ok(pbkdf2_simple(password, iterations)?)
}

pub fn verify_password(password_hash: &str, password: &str) -> bool {
    match pbkdf2_check(password, password_hash) {
        Ok(matched) => matched,
        Err(e) => {
            warn!("unreadable password hash: {}", e);
            false
        }
    }
}

/// Creates an account. The username is lowercased; `config.admin_username`
/// decides which account receives the admin role.
pub async fn register(
    store: &Store,
    username: &str,
    password: &str,
    config: &Config,
) -> Result<User, Error> {
    let username = username.to_lowercase();
    if !util::valid_username(&username) {
        return Err(Error::InvalidUsername);
    }
    let user = User {
        role: if username == config.admin_username {
            Role::Admin
        } else {
            Role::User
        },
        password_hash: hash_password(password, config.password_iterations)?,
        username,
    };
    if store.insert_user(&user).await? {
        Ok(user)
    } else {
        Err(Error::UsernameTaken)
    }
}

/// Unknown usernames and wrong passwords fail identically.
pub async fn authenticate(store: &Store, username: &str, password: &str) -> Result<User, Error> {
    let username = username.to_lowercase();
    match store.find_user(&username).await? {
        Some(user) if verify_password(&user.password_hash, password) => Ok(user),
        Some(_) => {
            warn!("wrong password for user {}", username);
            Err(Error::InvalidCredentials)
        }
        None => {
            warn!("rejecting non-existent user {}", username);
            Err(Error::InvalidCredentials)
        }
    }
}

pub async fn delete(store: &Store, username: &str) -> Result<(), Error> {
    store.delete_user(&username.to_lowercase()).await
}

pub fn profile_path(username: &str) -> String {
    format!("/profile/{}", username)
}

async fn register_form(mut session: Session) -> Result<Response, Rejection> {
    let layout = session.layout();
    session.html(view::register(&layout))
}

async fn register_user(
    mut session: Session,
    form: RegisterForm,
    store: Store,
    config: Arc<Config>,
) -> Result<Response, Rejection> {
    let checked = match store.find_user(&form.username.to_lowercase()).await? {
        Some(_) => Err(Error::UsernameTaken),
        None if form.password != form.confirm_password => Err(Error::PasswordMismatch),
        None => register(&store, &form.username, &form.password, &config).await,
    };

    match checked {
        Ok(user) => {
            info!("registered {} as {}", user.username, user.role);
            session.login(&user.username, user.role);
            session.flash("Registration Successful!");
            session.redirect(&profile_path(&user.username))
        }
        Err(e) if e.is_validation() => {
            info!("registration of {:?} rejected: {}", form.username, e);
            session.flash(e.to_string());
            session.redirect("/register")
        }
        Err(e) => Err(Rejection::from(e)),
    }
}

async fn login_form(mut session: Session) -> Result<Response, Rejection> {
    let layout = session.layout();
    session.html(view::login(&layout))
}

async fn login_user(
    mut session: Session,
    form: LoginForm,
    store: Store,
) -> Result<Response, Rejection> {
    match authenticate(&store, &form.username, &form.password).await {
        Ok(user) => {
            info!("{} logged in", user.username);
            session.login(&user.username, user.role);
            session.flash(format!("Welcome, {}", form.username));
            session.redirect(&profile_path(&user.username))
        }
        Err(e) if e.is_validation() => {
            session.flash(e.to_string());
            session.redirect("/login")
        }
        Err(e) => Err(Rejection::from(e)),
    }
}

/// The profile always shows the session's own user; the path segment only
/// makes the URL readable.
async fn profile(
    _username: String,
    mut session: Session,
    store: Store,
) -> Result<Response, Rejection> {
    let username = match session.require_logged_in() {
        Ok(user) => user.to_string(),
        Err(_) => return guard::to_login(&session),
    };

    if store.find_user(&username).await?.is_none() {
        warn!("session refers to missing user {}", username);
        session.logout();
        return guard::to_login(&session);
    }

    let filter = CocktailFilter {
        created_by: Some(username.clone()),
        ..Default::default()
    };
    let cocktails = store.list_cocktails(&filter).await?;
    let layout = session.layout();
    session.html(view::profile(&layout, &username, &cocktails))
}

async fn logout(mut session: Session) -> Result<Response, Rejection> {
    if let Some(user) = session.current_user() {
        info!("{} logged out", user);
        session.flash("You have successfully logged out!");
    }
    session.logout();
    session.redirect("/login")
}

/// Users may delete themselves; admins may delete anyone.
async fn delete_profile(
    username: String,
    mut session: Session,
    store: Store,
) -> Result<Response, Rejection> {
    let target = username.to_lowercase();
    let current = match session.require_owner_or_admin(&target) {
        Ok(user) => user.to_string(),
        Err(guard::Denied::Anonymous) => return guard::to_login(&session),
        Err(_) => {
            session.flash("You can only delete your own profile.");
            let own = profile_path(session.current_user().unwrap_or_default());
            return session.redirect(&own);
        }
    };

    delete(&store, &target).await?;
    info!("{} deleted profile {}", current, target);
    if current == target {
        session.logout();
    }
    session.flash("Profile Successfully Deleted");
    session.redirect("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ITERATIONS: u32 = 1_000;

    fn config() -> Config {
        Config {
            admin_username: "admin".to_string(),
            password_iterations: TEST_ITERATIONS,
            ..Default::default()
        }
    }

    #[test]
    fn hashes_are_salted_and_verify() {
        let a = hash_password("hunter2", TEST_ITERATIONS).unwrap();
        let b = hash_password("hunter2", TEST_ITERATIONS).unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "hunter2"));
        assert!(verify_password(&b, "hunter2"));
        assert!(!verify_password(&a, "hunter3"));
        assert!(!verify_password("plaintext", "plaintext"));
    }

    #[test]
    fn hashes_record_their_work_factor() {
        // 1000 rounds, big-endian, base64.
        let hash = hash_password("hunter2", TEST_ITERATIONS).unwrap();
        assert!(hash.starts_with("$rpbkdf2$0$AAAD6A==$"), "{}", hash);
        assert!(Config::default().password_iterations >= 100_000);

        // Single-round digests from before the switch no longer verify.
        let legacy = format!("sha3-256$salt${}", "0".repeat(64));
        assert!(!verify_password(&legacy, "hunter2"));
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let store = Store::memory();
        let config = config();
        let user = register(&store, "Alice", "pw", &config).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, Role::User);
        assert!(user.password_hash.starts_with("$rpbkdf2$"));

        assert!(matches!(
            register(&store, "ALICE", "other", &config).await,
            Err(Error::UsernameTaken)
        ));
        assert!(matches!(
            register(&store, "has space", "pw", &config).await,
            Err(Error::InvalidUsername)
        ));

        let admin = register(&store, "admin", "pw", &config).await.unwrap();
        assert_eq!(admin.role, Role::Admin);

        assert_eq!(
            authenticate(&store, "ALICE", "pw").await.unwrap().username,
            "alice"
        );
        assert!(matches!(
            authenticate(&store, "alice", "wrong").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, "nobody", "pw").await,
            Err(Error::InvalidCredentials)
        ));

        delete(&store, "Alice").await.unwrap();
        assert!(store.find_user("alice").await.unwrap().is_none());
    }
}
