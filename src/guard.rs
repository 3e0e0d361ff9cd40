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

use tracing::info;
use warp::{reply::Response, Filter, Rejection};

use crate::{config::Config, models::Role, session::Session, store::Store};

pub fn with_store(store: Store) -> impl Filter<Extract = (Store,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

pub fn with_config(
    config: Arc<Config>,
) -> impl Filter<Extract = (Arc<Config>,), Error = Infallible> + Clone {
    warp::any().map(move || config.clone())
}

/// Why a capability check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    Anonymous,
    NotOwner,
    NotAdmin,
}

/// Capability checks every handler runs before touching the store. Each
/// returns the session's username when the check passes.
pub trait AuthorizationGuard {
    fn require_logged_in(&self) -> Result<&str, Denied>;

    fn require_owner_or_admin(&self, created_by: &str) -> Result<&str, Denied>;

    fn require_admin(&self) -> Result<&str, Denied>;
}

impl AuthorizationGuard for Session {
    fn require_logged_in(&self) -> Result<&str, Denied> {
        self.current_user().ok_or(Denied::Anonymous)
    }

    fn require_owner_or_admin(&self, created_by: &str) -> Result<&str, Denied> {
        let user = self.require_logged_in()?;
        if user == created_by || self.role() == Role::Admin {
            Ok(user)
        } else {
            info!("{} denied access to a record of {}", user, created_by);
            Err(Denied::NotOwner)
        }
    }

    fn require_admin(&self) -> Result<&str, Denied> {
        let user = self.require_logged_in()?;
        if self.role() == Role::Admin {
            Ok(user)
        } else {
            info!("{} denied admin access", user);
            Err(Denied::NotAdmin)
        }
    }
}

/// Sends anonymous sessions to the login page.
pub fn to_login(session: &Session) -> Result<Response, Rejection> {
    session.redirect("/login")
}

/// The failure response of admin-only routes.
pub fn admin_denied(mut session: Session, denied: Denied) -> Result<Response, Rejection> {
    session.flash("You must have an admin account to manage categories");
    match denied {
        Denied::Anonymous => session.redirect("/login"),
        _ => session.redirect("/view_cocktails"),
    }
}
