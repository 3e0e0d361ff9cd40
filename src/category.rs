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

use tracing::info;
use warp::{reply::Response, Filter, Rejection, Reply};

use crate::{
    guard::{self, AuthorizationGuard},
    models::{Category, CategoryForm},
    session::{self, Session, SessionKeys},
    store::Store,
    view, Error,
};

const FORM_LIMIT: u64 = 1024 * 4;

/// Category management. Every route is admin-only.
pub fn api(
    store: Store,
    keys: SessionKeys,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("get_categories")
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(get_categories);

    let add_form = warp::path!("add_category")
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and_then(add_category_form);

    let add = warp::path!("add_category")
        .and(warp::post())
        .and(session::session(keys.clone()))
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .and(guard::with_store(store.clone()))
        .and_then(add_category);

    let edit_form = warp::path!("edit_category" / String)
        .and(warp::get())
        .and(session::session(keys.clone()))
        .and(guard::with_store(store.clone()))
        .and_then(edit_category_form);

    let edit = warp::path!("edit_category" / String)
        .and(warp::post())
        .and(session::session(keys.clone()))
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .and(guard::with_store(store.clone()))
        .and_then(edit_category);

    let delete = warp::path!("delete_category" / String)
        .and(warp::get())
        .and(session::session(keys))
        .and(guard::with_store(store))
        .and_then(delete_category);

    list.or(add_form)
        .or(add)
        .or(edit_form)
        .or(edit)
        .or(delete)
}

async fn get_categories(mut session: Session, store: Store) -> Result<Response, Rejection> {
    if let Err(denied) = session.require_admin() {
        return guard::admin_denied(session, denied);
    }
    let categories = store.list_categories().await?;
    let layout = session.layout();
    session.html(view::categories(&layout, &categories))
}

async fn add_category_form(mut session: Session) -> Result<Response, Rejection> {
    if let Err(denied) = session.require_admin() {
        return guard::admin_denied(session, denied);
    }
    let layout = session.layout();
    session.html(view::category_form(&layout, None))
}

async fn add_category(
    mut session: Session,
    form: CategoryForm,
    store: Store,
) -> Result<Response, Rejection> {
    if let Err(denied) = session.require_admin() {
        return guard::admin_denied(session, denied);
    }
    let category = store.insert_category(form).await?;
    info!("added category {:?} as {}", category.category_name, category.id);
    session.flash("New Category Added");
    session.redirect("/get_categories")
}

async fn edit_category_form(
    id: String,
    mut session: Session,
    store: Store,
) -> Result<Response, Rejection> {
    if let Err(denied) = session.require_admin() {
        return guard::admin_denied(session, denied);
    }
    let category = store.find_category(&id).await?.ok_or(Error::NotFound)?;
    let layout = session.layout();
    session.html(view::category_form(&layout, Some(&category)))
}

async fn edit_category(
    id: String,
    mut session: Session,
    form: CategoryForm,
    store: Store,
) -> Result<Response, Rejection> {
    if let Err(denied) = session.require_admin() {
        return guard::admin_denied(session, denied);
    }
    let category = Category {
        id,
        category_name: form.category_name,
    };
    if !store.update_category(&category).await? {
        return Err(Rejection::from(Error::NotFound));
    }
    info!("renamed category {} to {:?}", category.id, category.category_name);
    session.flash("Category Successfully Updated");
    session.redirect("/get_categories")
}

async fn delete_category(
    id: String,
    mut session: Session,
    store: Store,
) -> Result<Response, Rejection> {
    if let Err(denied) = session.require_admin() {
        return guard::admin_denied(session, denied);
    }
    store.delete_category(&id).await?;
    info!("deleted category {}", id);
    session.flash("Category Successfully Deleted");
    session.redirect("/get_categories")
}
