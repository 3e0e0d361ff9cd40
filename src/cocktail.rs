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

use futures::future::try_join;
use tracing::info;
use warp::{reply::Response, Filter, Rejection, Reply};

use crate::{
    config::Config,
    guard::{self, AuthorizationGuard, Denied},
    models::{Cocktail, CocktailForm, Role, SearchForm},
    session::{self, Session, SessionKeys},
    store::{CocktailFilter, Store},
    view, Error,
};

const FORM_LIMIT: u64 = 1024 * 16;
const FEATURED_LIMIT: usize = 3;
const DENIED_EDIT: &str = "You can only edit cocktails that you created.";
const DENIED_DELETE: &str = "You can only delete cocktails that you created.";

pub fn api(
    store: Store,
    keys: SessionKeys,
    config: Arc<Config>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let home = warp::path::end()
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(index);

    let index_page = warp::path!("index")
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(index);

    let view_cocktails = warp::path!("view_cocktails")
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(view_cocktails);

    let search_form = warp::path!("search")
        .and(warp::post())
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form::<SearchForm>())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(search);

    let search_query = warp::path!("search")
        .and(warp::get())
        .and(warp::query::<SearchForm>())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(search);

    let view_cocktail = warp::path!("cocktail" / String)
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(view_cocktail);

    let add_form = warp::path!("add_cocktail")
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and(guard::with_config(config.clone()))
        .and_then(add_cocktail_form);

    let add = warp::path!("add_cocktail")
        .and(warp::post())
        .and(session::session(keys.clone()))
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .and(guard::with_store(store.clone()))
        .and_then(add_cocktail);

    let edit_form = warp::path!("edit_cocktail" / String)
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and(guard::with_config(config))
        .and_then(edit_cocktail_form);

    let edit = warp::path!("edit_cocktail" / String)
        .and(warp::post())
        .and(session::session(keys.clone()))
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .and(guard::with_store(store.clone()))
        .and_then(edit_cocktail);

    let delete = warp::path!("delete_cocktail" / String)
        .and(warp::get())
        .and(session::session(keys))
        .and(guard::with_store(store))
        .and_then(delete_cocktail);

    home.or(index_page)
        .or(view_cocktails)
        .or(search_form)
        .or(search_query)
        .or(view_cocktail)
        .or(add_form)
        .or(add)
        .or(edit_form)
        .or(edit)
        .or(delete)
}

/// Renders the full catalog, used both as the list page and as the fallback
/// page of denied edits.
async fn render_catalog(mut session: Session, store: &Store) -> Result<Response, Rejection> {
    let cocktails = store.list_cocktails(&CocktailFilter::default()).await?;
    let layout = session.layout();
    session.html(view::cocktails(&layout, &cocktails))
}

async fn index(mut session: Session, store: Store) -> Result<Response, Rejection> {
    let filter = CocktailFilter {
        author_role: Some(Role::Admin),
        limit: Some(FEATURED_LIMIT),
        ..Default::default()
    };
    let featured = store.list_cocktails(&filter).await?;
    let layout = session.layout();
    session.html(view::index(&layout, &featured))
}

async fn view_cocktails(session: Session, store: Store) -> Result<Response, Rejection> {
    render_catalog(session, &store).await
}

async fn search(
    form: SearchForm,
    mut session: Session,
    store: Store,
) -> Result<Response, Rejection> {
    let query = form.query.unwrap_or_default();
    let cocktails = store.search_cocktails(&query).await?;
    info!("search {:?} matched {} cocktails", query, cocktails.len());
    let layout = session.layout();
    session.html(view::cocktails(&layout, &cocktails))
}

async fn view_cocktail(
    id: String,
    mut session: Session,
    store: Store,
) -> Result<Response, Rejection> {
    let cocktail = store.find_cocktail(&id).await?.ok_or(Error::NotFound)?;
    let can_modify = session.require_owner_or_admin(&cocktail.created_by).is_ok();
    let layout = session.layout();
    session.html(view::cocktail(&layout, &cocktail, can_modify))
}

async fn add_cocktail_form(
    mut session: Session,
    store: Store,
    config: Arc<Config>,
) -> Result<Response, Rejection> {
    if session.require_logged_in().is_err() {
        return guard::to_login(&session);
    }
    let categories = store.list_categories().await?;
    let layout = session.layout();
    session.html(view::cocktail_form(
        &layout,
        None,
        &categories,
        config.image_host.as_ref(),
    ))
}

async fn add_cocktail(
    mut session: Session,
    form: CocktailForm,
    store: Store,
) -> Result<Response, Rejection> {
    let user = match session.require_logged_in() {
        Ok(user) => user.to_string(),
        Err(_) => return guard::to_login(&session),
    };
    let cocktail = store.insert_cocktail(&user, form).await?;
    info!("{} added cocktail {}", user, cocktail.id);
    session.flash("Cocktail Successfully Added");
    session.redirect("/view_cocktails")
}

async fn deny_modify(
    mut session: Session,
    denied: Denied,
    message: &str,
    store: &Store,
) -> Result<Response, Rejection> {
    match denied {
        Denied::Anonymous => guard::to_login(&session),
        _ => {
            session.flash(message);
            render_catalog(session, store).await
        }
    }
}

async fn edit_cocktail_form(
    id: String,
    mut session: Session,
    store: Store,
    config: Arc<Config>,
) -> Result<Response, Rejection> {
    if session.require_logged_in().is_err() {
        return guard::to_login(&session);
    }
    let (cocktail, categories) =
        try_join(store.find_cocktail(&id), store.list_categories()).await?;
    let cocktail = cocktail.ok_or(Error::NotFound)?;

    if let Err(denied) = session.require_owner_or_admin(&cocktail.created_by) {
        return deny_modify(session, denied, DENIED_EDIT, &store).await;
    }

    let layout = session.layout();
    session.html(view::cocktail_form(
        &layout,
        Some(&cocktail),
        &categories,
        config.image_host.as_ref(),
    ))
}

/// Replaces the whole document. The id and the original author survive the
/// replace.
async fn edit_cocktail(
    id: String,
    mut session: Session,
    form: CocktailForm,
    store: Store,
) -> Result<Response, Rejection> {
    if session.require_logged_in().is_err() {
        return guard::to_login(&session);
    }
    let stored = store.find_cocktail(&id).await?.ok_or(Error::NotFound)?;
    let user = match session.require_owner_or_admin(&stored.created_by) {
        Ok(user) => user.to_string(),
        Err(denied) => return deny_modify(session, denied, DENIED_EDIT, &store).await,
    };

    let replacement = Cocktail::new(stored.id, stored.created_by, form);
    if !store.update_cocktail(&replacement).await? {
        return Err(Rejection::from(Error::NotFound));
    }
    info!("{} updated cocktail {}", user, replacement.id);
    session.flash("Cocktail Successfully Updated");
    session.redirect("/view_cocktails")
}

/// Deleting an id that does not exist is a no-op.
async fn delete_cocktail(
    id: String,
    mut session: Session,
    store: Store,
) -> Result<Response, Rejection> {
    if session.require_logged_in().is_err() {
        return guard::to_login(&session);
    }
    if let Some(stored) = store.find_cocktail(&id).await? {
        let user = match session.require_owner_or_admin(&stored.created_by) {
            Ok(user) => user.to_string(),
            Err(denied) => return deny_modify(session, denied, DENIED_DELETE, &store).await,
        };
        store.delete_cocktail(&id).await?;
        info!("{} deleted cocktail {}", user, id);
    }
    session.flash("Cocktail Successfully Deleted");
    session.redirect("/view_cocktails")
}
