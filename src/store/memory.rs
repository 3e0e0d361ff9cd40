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

use tokio::sync::RwLock;

use crate::{
    models::{Category, Cocktail, User},
    store::CocktailFilter,
    util, Error,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    cocktails: Vec<Cocktail>,
    categories: Vec<Category>,
}

/// A volatile store held in process memory. Vectors keep insertion order.
#[derive(Clone)]
pub struct MemoryStore(Arc<RwLock<Tables>>);

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore(Arc::new(RwLock::new(Tables::default())))
    }
}

impl MemoryStore {
    pub async fn insert_user(&self, user: &User) -> Result<bool, Error> {
        let mut tables = self.0.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Ok(false);
        }
        tables.users.push(user.clone());
        Ok(true)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, Error> {
        let tables = self.0.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), Error> {
        self.0.write().await.users.retain(|u| u.username != username);
        Ok(())
    }
}

impl MemoryStore {
    pub async fn insert_cocktail(&self, cocktail: &Cocktail) -> Result<(), Error> {
        self.0.write().await.cocktails.push(cocktail.clone());
        Ok(())
    }

    pub async fn find_cocktail(&self, id: &str) -> Result<Option<Cocktail>, Error> {
        let tables = self.0.read().await;
        Ok(tables.cocktails.iter().find(|c| c.id == id).cloned())
    }

    pub async fn list_cocktails(&self, filter: &CocktailFilter) -> Result<Vec<Cocktail>, Error> {
        let tables = self.0.read().await;
        let authored_by_role = |username: &str| match filter.author_role {
            Some(role) => tables
                .users
                .iter()
                .any(|u| u.username == username && u.role == role),
            None => true,
        };
        Ok(tables
            .cocktails
            .iter()
            .filter(|c| match &filter.created_by {
                Some(created_by) => &c.created_by == created_by,
                None => true,
            })
            .filter(|c| authored_by_role(&c.created_by))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    pub async fn update_cocktail(&self, cocktail: &Cocktail) -> Result<bool, Error> {
        let mut tables = self.0.write().await;
        match tables.cocktails.iter_mut().find(|c| c.id == cocktail.id) {
            Some(stored) => {
                *stored = cocktail.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn delete_cocktail(&self, id: &str) -> Result<(), Error> {
        self.0.write().await.cocktails.retain(|c| c.id != id);
        Ok(())
    }

    pub async fn search_cocktails(&self, terms: &[String]) -> Result<Vec<Cocktail>, Error> {
        let tables = self.0.read().await;
        Ok(tables
            .cocktails
            .iter()
            .filter(|c| {
                c.indexed_text()
                    .iter()
                    .flat_map(|field| util::search_terms(field))
                    .any(|word| terms.contains(&word))
            })
            .cloned()
            .collect())
    }
}

impl MemoryStore {
    pub async fn insert_category(&self, category: &Category) -> Result<(), Error> {
        self.0.write().await.categories.push(category.clone());
        Ok(())
    }

    pub async fn find_category(&self, id: &str) -> Result<Option<Category>, Error> {
        let tables = self.0.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        let mut categories = self.0.read().await.categories.clone();
        categories.sort_by(|a, b| a.category_name.cmp(&b.category_name));
        Ok(categories)
    }

    pub async fn update_category(&self, category: &Category) -> Result<bool, Error> {
        let mut tables = self.0.write().await;
        match tables.categories.iter_mut().find(|c| c.id == category.id) {
            Some(stored) => {
                *stored = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), Error> {
        self.0.write().await.categories.retain(|c| c.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CocktailForm, Role};

    fn cocktail(id: &str, name: &str, ingredients: &str, created_by: &str) -> Cocktail {
        Cocktail::new(
            id.to_string(),
            created_by.to_string(),
            CocktailForm {
                category_name: "Classic".to_string(),
                cocktail_name: name.to_string(),
                cocktail_ingredients: ingredients.to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn search_matches_whole_words_case_insensitively() {
        let store = MemoryStore::default();
        store
            .insert_cocktail(&cocktail("1", "Frozen Margarita", "tequila, lime", "alice"))
            .await
            .unwrap();
        store
            .insert_cocktail(&cocktail("2", "Mojito", "rum, mint, lime", "bob"))
            .await
            .unwrap();

        let found = store.search_cocktails(&["margarita".to_string()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");

        let found = store.search_cocktails(&["lime".to_string()]).await.unwrap();
        assert_eq!(found.len(), 2);

        let found = store.search_cocktails(&["marg".to_string()]).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn punctuation_separates_words() {
        let store = MemoryStore::default();
        store
            .insert_cocktail(&cocktail("1", "Gibson", "1.5 oz gin, onion@garnish.bar", "alice"))
            .await
            .unwrap();

        for term in &["1", "5", "oz", "onion", "garnish", "bar"] {
            let found = store.search_cocktails(&[term.to_string()]).await.unwrap();
            assert_eq!(found.len(), 1, "{} is a word of its own", term);
        }
    }

    #[tokio::test]
    async fn author_role_filter_follows_the_users_table() {
        let store = MemoryStore::default();
        for (username, role) in &[("admin", Role::Admin), ("alice", Role::User)] {
            store
                .insert_user(&User {
                    username: username.to_string(),
                    password_hash: String::new(),
                    role: *role,
                })
                .await
                .unwrap();
        }
        for i in 0..5 {
            store
                .insert_cocktail(&cocktail(&format!("a{}", i), "Negroni", "gin", "admin"))
                .await
                .unwrap();
        }
        store
            .insert_cocktail(&cocktail("u", "Negroni", "gin", "alice"))
            .await
            .unwrap();

        let filter = CocktailFilter {
            author_role: Some(Role::Admin),
            limit: Some(3),
            ..Default::default()
        };
        let ids = store
            .list_cocktails(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a0", "a1", "a2"]);
    }

    #[tokio::test]
    async fn duplicate_users_are_not_inserted() {
        let store = MemoryStore::default();
        let user = User {
            username: "alice".to_string(),
            password_hash: "x".to_string(),
            role: Role::User,
        };
        assert!(store.insert_user(&user).await.unwrap());
        assert!(!store.insert_user(&user).await.unwrap());
    }
}
