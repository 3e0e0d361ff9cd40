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

//! Persistence for accounts, cocktails and categories.
//!
//! [`Store`] is the single handle handlers hold. It dispatches every
//! operation to either PostgreSQL or a process-local in-memory backend; both
//! keep the same semantics:
//!
//! - ids are application-generated opaque strings and never change;
//! - cocktail listings come back in insertion order, categories sorted by name;
//! - updates replace the whole document and report whether the id existed;
//! - deletes of unknown ids are no-ops;
//! - search matches any query term against the words of the indexed fields,
//!   case-insensitively, and an empty query matches nothing.

use crate::{
    models::{Category, CategoryForm, Cocktail, CocktailForm, Role, User},
    util, Error,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Selects the in-memory backend in place of a `postgres://` URL.
pub const MEMORY_URL_SCHEME: &'static str = "memory://";

const ID_LEN: usize = 24;

fn new_id() -> String {
    util::random_string(ID_LEN)
}

/// Restricts a cocktail listing. The default lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CocktailFilter {
    pub created_by: Option<String>,
    /// Only cocktails whose author currently holds this role.
    pub author_role: Option<Role>,
    pub limit: Option<usize>,
}

#[derive(Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

macro_rules! dispatch {
    ($self:ident . $method:ident ( $($arg:expr),* )) => {
        match $self {
            Store::Postgres(store) => store.$method($($arg),*).await,
            Store::Memory(store) => store.$method($($arg),*).await,
        }
    };
}

impl Store {
    pub async fn connect(url: &str) -> Result<Store, Error> {
        if url.starts_with(MEMORY_URL_SCHEME) {
            Ok(Store::memory())
        } else {
            let store = PgStore::connect(url)?;
            store.init().await?;
            Ok(Store::Postgres(store))
        }
    }

    pub fn memory() -> Store {
        Store::Memory(MemoryStore::default())
    }
}

impl Store {
    /// Inserts `user` unless the username is taken. Returns whether it was
    /// inserted.
    pub async fn insert_user(&self, user: &User) -> Result<bool, Error> {
        dispatch!(self.insert_user(user))
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, Error> {
        dispatch!(self.find_user(username))
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), Error> {
        dispatch!(self.delete_user(username))
    }
}

impl Store {
    pub async fn insert_cocktail(
        &self,
        created_by: &str,
        form: CocktailForm,
    ) -> Result<Cocktail, Error> {
        let cocktail = Cocktail::new(new_id(), created_by.to_string(), form);
        dispatch!(self.insert_cocktail(&cocktail))?;
        Ok(cocktail)
    }

    pub async fn find_cocktail(&self, id: &str) -> Result<Option<Cocktail>, Error> {
        dispatch!(self.find_cocktail(id))
    }

    pub async fn list_cocktails(&self, filter: &CocktailFilter) -> Result<Vec<Cocktail>, Error> {
        dispatch!(self.list_cocktails(filter))
    }

    /// Replaces the stored document under `cocktail.id`.
    pub async fn update_cocktail(&self, cocktail: &Cocktail) -> Result<bool, Error> {
        dispatch!(self.update_cocktail(cocktail))
    }

    pub async fn delete_cocktail(&self, id: &str) -> Result<(), Error> {
        dispatch!(self.delete_cocktail(id))
    }

    pub async fn search_cocktails(&self, query: &str) -> Result<Vec<Cocktail>, Error> {
        let terms = util::search_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        dispatch!(self.search_cocktails(&terms))
    }
}

impl Store {
    pub async fn insert_category(&self, form: CategoryForm) -> Result<Category, Error> {
        let category = Category {
            id: new_id(),
            category_name: form.category_name,
        };
        dispatch!(self.insert_category(&category))?;
        Ok(category)
    }

    pub async fn find_category(&self, id: &str) -> Result<Option<Category>, Error> {
        dispatch!(self.find_category(id))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        dispatch!(self.list_categories())
    }

    pub async fn update_category(&self, category: &Category) -> Result<bool, Error> {
        dispatch!(self.update_category(category))
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), Error> {
        dispatch!(self.delete_category(id))
    }
}
