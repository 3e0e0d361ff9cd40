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

use std::{str::FromStr, time::Duration};

use mobc::Connection;
use mobc_postgres::{
    tokio_postgres::{Config, NoTls},
    PgConnectionManager,
};
use tracing::debug;

use crate::{
    models::{Category, Cocktail, User},
    store::CocktailFilter,
    Error,
};

pub type Conn = Connection<PgConnectionManager<NoTls>>;
pub type Pool = mobc::Pool<PgConnectionManager<NoTls>>;

const DB_POOL_MAX_OPEN: u64 = 32;
const DB_POOL_MAX_IDLE: u64 = 8;
const DB_POOL_TIMEOUT_SECONDS: u64 = 15;

const COCKTAIL_COLUMNS: &'static str = "id, category_name, cocktail_name, cocktail_description, \
     cocktail_ingredients, cocktail_instructions, cocktail_serving, created_by, cocktail_img";

/// Must stay identical to the expression of `cocktails_words_idx` in
/// `init.sql`, or searches stop using the index. Every run of
/// non-alphanumeric characters becomes a word break before parsing, so
/// `1.5` or `a@b.com` are split the same way `util::search_terms` splits
/// queries.
const COCKTAIL_DOCUMENT: &'static str = "to_tsvector('simple', regexp_replace(\
     cocktail_name || ' ' || category_name || ' ' || cocktail_description || ' ' || \
     cocktail_ingredients, '[^[:alnum:]]+', ' ', 'g'))";

#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn connect(db_url: &str) -> Result<Self, Error> {
        let config = Config::from_str(db_url)?;

        let manager = PgConnectionManager::new(config, NoTls);
        let pool = mobc::Pool::builder()
            .max_open(DB_POOL_MAX_OPEN)
            .max_idle(DB_POOL_MAX_IDLE)
            .get_timeout(Some(Duration::from_secs(DB_POOL_TIMEOUT_SECONDS)))
            .build(manager);
        Ok(PgStore { pool })
    }

    async fn conn(&self) -> Result<Conn, Error> {
        Ok(self.pool.get().await?)
    }

    /// Creates the tables and indexes. Safe to run on every start.
    pub async fn init(&self) -> Result<(), Error> {
        let conn = self.conn().await?;
        conn.batch_execute(include_str!("../init.sql")).await?;
        Ok(())
    }

    pub async fn uninit(&self) -> Result<(), Error> {
        let conn = self.conn().await?;
        conn.batch_execute(include_str!("../uninit.sql")).await?;
        Ok(())
    }
}

impl PgStore {
    pub async fn insert_user(&self, user: &User) -> Result<bool, Error> {
        let inserted = self
            .conn()
            .await?
            .execute(
                r#"
                INSERT INTO users (username, password_hash, role)
                VALUES ($1, $2, $3)
                ON CONFLICT (username) DO NOTHING
                "#,
                &[&user.username, &user.password_hash, &user.role.as_str()],
            )
            .await?;
        Ok(inserted == 1)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, Error> {
        let rows = self
            .conn()
            .await?
            .query(
                "SELECT username, password_hash, role FROM users WHERE username = $1",
                &[&username],
            )
            .await?;
        Ok(rows.first().map(User::from))
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), Error> {
        let deleted = self
            .conn()
            .await?
            .execute("DELETE FROM users WHERE username = $1", &[&username])
            .await?;
        debug!("deleted {} user rows for {}", deleted, username);
        Ok(())
    }
}

impl PgStore {
    pub async fn insert_cocktail(&self, cocktail: &Cocktail) -> Result<(), Error> {
        self.conn()
            .await?
            .execute(
                format!(
                    "INSERT INTO cocktails ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                    COCKTAIL_COLUMNS
                )
                .as_str(),
                &[
                    &cocktail.id,
                    &cocktail.category_name,
                    &cocktail.cocktail_name,
                    &cocktail.cocktail_description,
                    &cocktail.cocktail_ingredients,
                    &cocktail.cocktail_instructions,
                    &cocktail.cocktail_serving,
                    &cocktail.created_by,
                    &cocktail.cocktail_img,
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn find_cocktail(&self, id: &str) -> Result<Option<Cocktail>, Error> {
        let rows = self
            .conn()
            .await?
            .query(
                format!("SELECT {} FROM cocktails WHERE id = $1", COCKTAIL_COLUMNS).as_str(),
                &[&id],
            )
            .await?;
        Ok(rows.first().map(Cocktail::from))
    }

    pub async fn list_cocktails(&self, filter: &CocktailFilter) -> Result<Vec<Cocktail>, Error> {
        let author_role = filter.author_role.map(|role| role.as_str());
        let limit = filter.limit.map(|limit| limit as i64);
        let rows = self
            .conn()
            .await?
            .query(
                format!(
                    r#"
                    SELECT {} FROM cocktails
                    WHERE ($1::TEXT IS NULL OR created_by = $1)
                        AND ($2::TEXT IS NULL OR created_by IN (
                            SELECT username FROM users WHERE role = $2
                        ))
                    ORDER BY seq
                    LIMIT $3
                    "#,
                    COCKTAIL_COLUMNS
                )
                .as_str(),
                &[&filter.created_by, &author_role, &limit],
            )
            .await?;
        Ok(rows.iter().map(Cocktail::from).collect())
    }

    pub async fn update_cocktail(&self, cocktail: &Cocktail) -> Result<bool, Error> {
        let updated = self
            .conn()
            .await?
            .execute(
                r#"
                UPDATE cocktails
                SET category_name = $2,
                    cocktail_name = $3,
                    cocktail_description = $4,
                    cocktail_ingredients = $5,
                    cocktail_instructions = $6,
                    cocktail_serving = $7,
                    created_by = $8,
                    cocktail_img = $9
                WHERE id = $1
                "#,
                &[
                    &cocktail.id,
                    &cocktail.category_name,
                    &cocktail.cocktail_name,
                    &cocktail.cocktail_description,
                    &cocktail.cocktail_ingredients,
                    &cocktail.cocktail_instructions,
                    &cocktail.cocktail_serving,
                    &cocktail.created_by,
                    &cocktail.cocktail_img,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    pub async fn delete_cocktail(&self, id: &str) -> Result<(), Error> {
        self.conn()
            .await?
            .execute("DELETE FROM cocktails WHERE id = $1", &[&id])
            .await?;
        Ok(())
    }

    /// `terms` are alphanumeric, so joining them into a `to_tsquery`
    /// disjunction needs no further quoting.
    pub async fn search_cocktails(&self, terms: &[String]) -> Result<Vec<Cocktail>, Error> {
        let query = terms.join(" | ");
        let rows = self
            .conn()
            .await?
            .query(
                format!(
                    "SELECT {} FROM cocktails WHERE {} @@ to_tsquery('simple', $1) ORDER BY seq",
                    COCKTAIL_COLUMNS, COCKTAIL_DOCUMENT
                )
                .as_str(),
                &[&query],
            )
            .await?;
        Ok(rows.iter().map(Cocktail::from).collect())
    }
}

impl PgStore {
    pub async fn insert_category(&self, category: &Category) -> Result<(), Error> {
        self.conn()
            .await?
            .execute(
                "INSERT INTO categories (id, category_name) VALUES ($1, $2)",
                &[&category.id, &category.category_name],
            )
            .await?;
        Ok(())
    }

    pub async fn find_category(&self, id: &str) -> Result<Option<Category>, Error> {
        let rows = self
            .conn()
            .await?
            .query(
                "SELECT id, category_name FROM categories WHERE id = $1",
                &[&id],
            )
            .await?;
        Ok(rows.first().map(Category::from))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        let rows = self
            .conn()
            .await?
            .query(
                r#"SELECT id, category_name FROM categories ORDER BY category_name COLLATE "C", seq"#,
                &[],
            )
            .await?;
        Ok(rows.iter().map(Category::from).collect())
    }

    pub async fn update_category(&self, category: &Category) -> Result<bool, Error> {
        let updated = self
            .conn()
            .await?
            .execute(
                "UPDATE categories SET category_name = $2 WHERE id = $1",
                &[&category.id, &category.category_name],
            )
            .await?;
        Ok(updated > 0)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), Error> {
        self.conn()
            .await?
            .execute("DELETE FROM categories WHERE id = $1", &[&id])
            .await?;
        Ok(())
    }
}
