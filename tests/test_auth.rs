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

use cocktail_catalog::models::Role;

mod common;

use common::Browser;

#[tokio::test]
async fn registration_flow() {
    let (app, store) = common::app();
    let mut alice = Browser::default();

    // Register a new user; the session is logged in right away.
    let res = alice.register(&app, "Alice", "pw").await;
    assert_eq!(res.status, 303, "registration redirects");
    assert_eq!(res.location.as_deref(), Some("/profile/alice"));
    let res = alice.follow(&app, res).await;
    assert_eq!(res.status, 200, "the new user sees their profile");
    assert!(res.body.contains("Registration Successful!"));
    assert!(res.body.contains("alice's cocktails"));

    let user = store.find_user("alice").await.unwrap().expect("stored user");
    assert_eq!(user.role, Role::User);
    assert!(
        user.password_hash.starts_with("$rpbkdf2$0$AAAD6A==$"),
        "passwords are stored as PBKDF2 hashes with the configured rounds"
    );

    // Flashes are shown once.
    let res = alice.get(&app, "/profile/alice").await;
    assert!(!res.body.contains("Registration Successful!"));

    // Repeat the registration under a different case.
    let mut other = Browser::default();
    let res = other.register(&app, "ALICE", "other").await;
    assert_eq!(res.location.as_deref(), Some("/register"));
    let res = other.follow(&app, res).await;
    assert!(res.body.contains("Username already exists"));
    assert!(store
        .find_user("alice")
        .await
        .unwrap()
        .map(|u| auth_ok(&u.password_hash, "pw"))
        .unwrap_or(false));

    // Mismatched passwords.
    let res = other
        .post(
            &app,
            "/register",
            &[
                ("username", "bob"),
                ("password", "one"),
                ("confirm_password", "two"),
            ],
        )
        .await;
    assert_eq!(res.location.as_deref(), Some("/register"));
    let res = other.follow(&app, res).await;
    assert!(res.body.contains("Please ensure that your passwords match."));
    assert!(store.find_user("bob").await.unwrap().is_none());

    // Names outside the safe alphabet are refused.
    let res = other.register(&app, "bad name", "pw").await;
    assert_eq!(res.location.as_deref(), Some("/register"));
    assert!(store.find_user("bad name").await.unwrap().is_none());
}

fn auth_ok(hash: &str, password: &str) -> bool {
    cocktail_catalog::auth::verify_password(hash, password)
}

#[tokio::test]
async fn admin_role_follows_configured_username() {
    let (app, store) = common::app();
    let mut admin = Browser::default();

    admin.register(&app, common::ADMIN, "root").await;
    let user = store
        .find_user(common::ADMIN)
        .await
        .unwrap()
        .expect("stored admin");
    assert_eq!(user.role, Role::Admin);

    let res = admin.get(&app, "/").await;
    assert!(
        res.body.contains("/get_categories"),
        "admins see the category link"
    );
}

#[tokio::test]
async fn login_logout_flow() {
    let (app, store) = common::app();
    common::seed_user(&store, "alice", "pw").await;
    let mut browser = Browser::default();

    // Wrong password and unknown user fail the same way.
    let res = browser.login(&app, "alice", "nope").await;
    assert_eq!(res.location.as_deref(), Some("/login"));
    let res = browser.follow(&app, res).await;
    assert!(res.body.contains("Incorrect Username and/or Password"));

    let res = browser.login(&app, "mallory", "pw").await;
    assert_eq!(res.location.as_deref(), Some("/login"));
    let res = browser.follow(&app, res).await;
    assert!(res.body.contains("Incorrect Username and/or Password"));

    // Protected pages send anonymous sessions to the login page.
    let res = browser.get(&app, "/profile/alice").await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location.as_deref(), Some("/login"));

    let res = browser.login(&app, "ALICE", "pw").await;
    assert_eq!(res.location.as_deref(), Some("/profile/alice"));
    let res = browser.follow(&app, res).await;
    assert_eq!(res.status, 200);
    assert!(res.body.contains("Welcome, ALICE"));

    // The profile always shows the session's own user.
    let res = browser.get(&app, "/profile/someone-else").await;
    assert_eq!(res.status, 200);
    assert!(res.body.contains("alice's cocktails"));

    let res = browser.get(&app, "/logout").await;
    assert_eq!(res.location.as_deref(), Some("/login"));
    let res = browser.follow(&app, res).await;
    assert!(res.body.contains("You have successfully logged out!"));

    let res = browser.get(&app, "/profile/alice").await;
    assert_eq!(res.location.as_deref(), Some("/login"));

    // Logging out again is harmless.
    let res = browser.get(&app, "/logout").await;
    assert_eq!(res.location.as_deref(), Some("/login"));
    let res = browser.follow(&app, res).await;
    assert!(!res.body.contains("You have successfully logged out!"));
}

#[tokio::test]
async fn foreign_session_cookies_are_ignored() {
    let (app, store) = common::app();
    common::seed_user(&store, "alice", "pw").await;

    let res = warp::test::request()
        .method("GET")
        .path("/profile/alice")
        .header("cookie", "session=not-a-token")
        .reply(&app)
        .await;
    assert_eq!(res.status(), 303, "invalid session is anonymous");
    assert_eq!(res.headers()["location"], "/login");
}

#[tokio::test]
async fn delete_profile_flow() {
    let (app, store) = common::app();
    common::seed_user(&store, "bob", "pw").await;
    let mut alice = Browser::default();
    alice.register(&app, "alice", "pw").await;

    // Only your own profile.
    let res = alice.get(&app, "/delete_profile/bob").await;
    assert_eq!(res.location.as_deref(), Some("/profile/alice"));
    let res = alice.follow(&app, res).await;
    assert!(res.body.contains("You can only delete your own profile."));
    assert!(store.find_user("bob").await.unwrap().is_some());

    let res = alice.get(&app, "/delete_profile/alice").await;
    assert_eq!(res.location.as_deref(), Some("/"));
    let res = alice.follow(&app, res).await;
    assert!(res.body.contains("Profile Successfully Deleted"));
    assert!(store.find_user("alice").await.unwrap().is_none());

    // The session went with the account.
    let res = alice.get(&app, "/add_cocktail").await;
    assert_eq!(res.location.as_deref(), Some("/login"));

    // Admins may remove anyone and stay logged in.
    let mut admin = Browser::default();
    admin.register(&app, common::ADMIN, "root").await;
    let res = admin.get(&app, "/delete_profile/bob").await;
    assert_eq!(res.location.as_deref(), Some("/"));
    assert!(store.find_user("bob").await.unwrap().is_none());
    let res = admin.get(&app, "/add_cocktail").await;
    assert_eq!(res.status, 200);
}
