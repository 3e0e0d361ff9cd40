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

use std::{fmt, str::FromStr};

use mobc_postgres::tokio_postgres::row::Row;
use serde::{Deserialize, Serialize};

/// The capability level of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anonymous,
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anonymous => "anonymous",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Anonymous
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anonymous" => Ok(Role::Anonymous),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// A registered account. `password_hash` is in `method$salt$digest` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl<'a> From<&'a Row> for User {
    fn from(item: &'a Row) -> Self {
        let role: String = item.get("role");
        User {
            username: item.get("username"),
            password_hash: item.get("password_hash"),
            role: role.parse().unwrap_or(Role::User),
        }
    }
}

/// The submitted fields of the add and edit cocktail forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CocktailForm {
    pub category_name: String,
    pub cocktail_name: String,
    pub cocktail_description: String,
    pub cocktail_ingredients: String,
    pub cocktail_instructions: String,
    pub cocktail_serving: String,
    pub cocktail_img: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cocktail {
    pub id: String,
    pub category_name: String,
    pub cocktail_name: String,
    pub cocktail_description: String,
    pub cocktail_ingredients: String,
    pub cocktail_instructions: String,
    pub cocktail_serving: String,
    pub created_by: String,
    pub cocktail_img: String,
}

impl Cocktail {
    pub fn new(id: String, created_by: String, form: CocktailForm) -> Self {
        Cocktail {
            id,
            category_name: form.category_name,
            cocktail_name: form.cocktail_name,
            cocktail_description: form.cocktail_description,
            cocktail_ingredients: form.cocktail_ingredients,
            cocktail_instructions: form.cocktail_instructions,
            cocktail_serving: form.cocktail_serving,
            created_by,
            cocktail_img: form.cocktail_img,
        }
    }

    /// The fields covered by the text index.
    pub fn indexed_text(&self) -> [&str; 4] {
        [
            self.cocktail_name.as_str(),
            self.category_name.as_str(),
            self.cocktail_description.as_str(),
            self.cocktail_ingredients.as_str(),
        ]
    }
}

impl<'a> From<&'a Row> for Cocktail {
    fn from(item: &'a Row) -> Self {
        Cocktail {
            id: item.get("id"),
            category_name: item.get("category_name"),
            cocktail_name: item.get("cocktail_name"),
            cocktail_description: item.get("cocktail_description"),
            cocktail_ingredients: item.get("cocktail_ingredients"),
            cocktail_instructions: item.get("cocktail_instructions"),
            cocktail_serving: item.get("cocktail_serving"),
            created_by: item.get("created_by"),
            cocktail_img: item.get("cocktail_img"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub category_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub category_name: String,
}

impl<'a> From<&'a Row> for Category {
    fn from(item: &'a Row) -> Self {
        Category {
            id: item.get("id"),
            category_name: item.get("category_name"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub query: Option<String>,
}
