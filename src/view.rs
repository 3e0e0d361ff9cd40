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

//! HTML rendering. Every page shares [`page`] for its chrome: navigation
//! depending on who is logged in, and the pending flash messages.

use std::fmt::Write;

use warp::http::StatusCode;

use crate::{
    config::ImageHost,
    models::{Category, Cocktail},
};

/// What the page chrome needs to know about the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub user: Option<String>,
    pub admin: bool,
    pub flashes: Vec<String>,
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn page(layout: &Layout, title: &str, content: &str) -> String {
    let mut nav = String::from(
        r#"<a href="/">Home</a> <a href="/view_cocktails">Cocktails</a> "#,
    );
    match &layout.user {
        Some(user) => {
            let user = escape(user);
            let _ = write!(
                nav,
                r#"<a href="/add_cocktail">Add Cocktail</a> <a href="/profile/{0}">Profile</a> "#,
                user
            );
            if layout.admin {
                nav.push_str(r#"<a href="/get_categories">Manage Categories</a> "#);
            }
            nav.push_str(r#"<a href="/logout">Log Out</a>"#);
        }
        None => nav.push_str(r#"<a href="/login">Log In</a> <a href="/register">Register</a>"#),
    }

    let mut flashes = String::new();
    if !layout.flashes.is_empty() {
        flashes.push_str(r#"<ul class="flashes">"#);
        for message in &layout.flashes {
            let _ = write!(flashes, "<li>{}</li>", escape(message));
        }
        flashes.push_str("</ul>");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Cocktail Catalog</title>
</head>
<body>
<nav>{nav}</nav>
{flashes}
<main>
<h1>{title}</h1>
{content}
</main>
<script src="/static/js/script.js"></script>
</body>
</html>
"#,
        title = escape(title),
        nav = nav,
        flashes = flashes,
        content = content
    )
}

fn cocktail_cards(cocktails: &[Cocktail]) -> String {
    if cocktails.is_empty() {
        return String::from(r#"<p class="empty">No cocktails found.</p>"#);
    }
    let mut out = String::from(r#"<ul class="cocktails">"#);
    for c in cocktails {
        let _ = write!(
            out,
            r#"<li class="cocktail"><a href="/cocktail/{id}"><img src="{img}" alt="{name}"><h2>{name}</h2></a><p>{category}</p><p>{description}</p><p class="author">Created by {author}</p></li>"#,
            id = escape(&c.id),
            img = escape(&c.cocktail_img),
            name = escape(&c.cocktail_name),
            category = escape(&c.category_name),
            description = escape(&c.cocktail_description),
            author = escape(&c.created_by),
        );
    }
    out.push_str("</ul>");
    out
}

pub fn index(layout: &Layout, featured: &[Cocktail]) -> String {
    let content = format!(
        r#"<p>Recipes shared by our community.</p><h2>Featured</h2>{}<p><a href="/view_cocktails">See all cocktails</a></p>"#,
        cocktail_cards(featured)
    );
    page(layout, "Welcome", &content)
}

pub fn cocktails(layout: &Layout, cocktails: &[Cocktail]) -> String {
    let content = format!(
        r#"<form method="post" action="/search"><input type="text" name="query" placeholder="Search cocktails"><button type="submit">Search</button> <a href="/view_cocktails">Reset</a></form>{}"#,
        cocktail_cards(cocktails)
    );
    page(layout, "Cocktails", &content)
}

pub fn cocktail(layout: &Layout, cocktail: &Cocktail, can_modify: bool) -> String {
    let mut content = format!(
        r#"<article class="cocktail-detail"><img src="{img}" alt="{name}"><p class="category">{category}</p><p>{description}</p><h2>Ingredients</h2><p>{ingredients}</p><h2>Instructions</h2><p>{instructions}</p><h2>Serving</h2><p>{serving}</p><p class="author">Created by {author}</p></article>"#,
        img = escape(&cocktail.cocktail_img),
        name = escape(&cocktail.cocktail_name),
        category = escape(&cocktail.category_name),
        description = escape(&cocktail.cocktail_description),
        ingredients = escape(&cocktail.cocktail_ingredients),
        instructions = escape(&cocktail.cocktail_instructions),
        serving = escape(&cocktail.cocktail_serving),
        author = escape(&cocktail.created_by),
    );
    if can_modify {
        let id = escape(&cocktail.id);
        let _ = write!(
            content,
            r#"<p><a href="/edit_cocktail/{0}">Edit</a> <a href="/delete_cocktail/{0}">Delete</a></p>"#,
            id
        );
    }
    page(layout, &cocktail.cocktail_name, &content)
}

pub fn register(layout: &Layout) -> String {
    let content = r#"<form class="needs-validation" method="post" action="/register">
<label>Username <input type="text" name="username" required maxlength="32" pattern="[A-Za-z0-9._\-]+"></label>
<label>Password <input type="password" id="password" name="password" required></label>
<label>Confirm Password <input type="password" id="confirm_password" name="confirm_password" required></label>
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Log In</a></p>"#;
    page(layout, "Register", content)
}

pub fn login(layout: &Layout) -> String {
    let content = r#"<form class="needs-validation" method="post" action="/login">
<label>Username <input type="text" name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log In</button>
</form>
<p>New here? <a href="/register">Register</a></p>"#;
    page(layout, "Log In", content)
}

pub fn profile(layout: &Layout, username: &str, cocktails: &[Cocktail]) -> String {
    let user = escape(username);
    let content = format!(
        r#"<h2>{user}'s cocktails</h2>{cards}<p><a href="/add_cocktail">Add Cocktail</a></p><p><a class="danger" href="/delete_profile/{user}">Delete Profile</a></p>"#,
        user = user,
        cards = cocktail_cards(cocktails),
    );
    page(layout, "Profile", &content)
}

fn category_options(categories: &[Category], selected: &str) -> String {
    let mut out = String::new();
    for category in categories {
        let name = escape(&category.category_name);
        let _ = write!(
            out,
            r#"<option value="{0}"{1}>{0}</option>"#,
            name,
            if category.category_name == selected {
                " selected"
            } else {
                ""
            }
        );
    }
    out
}

fn image_widget(image_host: Option<&ImageHost>) -> String {
    match image_host.and_then(|host| serde_json::to_string(host).ok()) {
        Some(settings) => format!(
            r#"<button type="button" id="upload_widget">Upload Image</button>
<script>window.IMAGE_HOST = {};</script>
<script src="https://upload-widget.cloudinary.com/global/all.js"></script>"#,
            settings.replace("</", "<\\/")
        ),
        None => String::new(),
    }
}

/// The add form when `cocktail` is `None`, otherwise the pre-filled edit form.
pub fn cocktail_form(
    layout: &Layout,
    cocktail: Option<&Cocktail>,
    categories: &[Category],
    image_host: Option<&ImageHost>,
) -> String {
    let (title, action) = match cocktail {
        Some(c) => ("Edit Cocktail", format!("/edit_cocktail/{}", escape(&c.id))),
        None => ("Add Cocktail", String::from("/add_cocktail")),
    };
    let prefill = |value: Option<&String>| value.map(|v| escape(v)).unwrap_or_default();

    let content = format!(
        r#"<form class="needs-validation" method="post" action="{action}">
<label>Category <select name="category_name" required>{options}</select></label>
<label>Name <input type="text" name="cocktail_name" value="{name}" required></label>
<label>Description <textarea name="cocktail_description" required>{description}</textarea></label>
<label>Ingredients <textarea name="cocktail_ingredients" required>{ingredients}</textarea></label>
<label>Instructions <textarea name="cocktail_instructions" required>{instructions}</textarea></label>
<label>Serving <input type="text" name="cocktail_serving" value="{serving}"></label>
<label>Image URL <input type="url" id="cocktail_img_url" name="cocktail_img" value="{img}"></label>
{widget}
<button type="submit">{title}</button>
</form>"#,
        action = action,
        options = category_options(
            categories,
            cocktail.map(|c| c.category_name.as_str()).unwrap_or("")
        ),
        name = prefill(cocktail.map(|c| &c.cocktail_name)),
        description = prefill(cocktail.map(|c| &c.cocktail_description)),
        ingredients = prefill(cocktail.map(|c| &c.cocktail_ingredients)),
        instructions = prefill(cocktail.map(|c| &c.cocktail_instructions)),
        serving = prefill(cocktail.map(|c| &c.cocktail_serving)),
        img = prefill(cocktail.map(|c| &c.cocktail_img)),
        widget = image_widget(image_host),
        title = title,
    );
    page(layout, title, &content)
}

pub fn categories(layout: &Layout, categories: &[Category]) -> String {
    let mut content = String::from(r#"<p><a href="/add_category">Add Category</a></p><ul class="categories">"#);
    for category in categories {
        let id = escape(&category.id);
        let _ = write!(
            content,
            r#"<li class="category">{name} <a href="/edit_category/{id}">Edit</a> <a href="/delete_category/{id}">Delete</a></li>"#,
            name = escape(&category.category_name),
            id = id,
        );
    }
    content.push_str("</ul>");
    page(layout, "Manage Categories", &content)
}

pub fn category_form(layout: &Layout, category: Option<&Category>) -> String {
    let (title, action, value) = match category {
        Some(c) => (
            "Edit Category",
            format!("/edit_category/{}", escape(&c.id)),
            escape(&c.category_name),
        ),
        None => ("Add Category", String::from("/add_category"), String::new()),
    };
    let content = format!(
        r#"<form class="needs-validation" method="post" action="{}"><label>Category Name <input type="text" name="category_name" value="{}" required></label><button type="submit">{}</button></form>"#,
        action, value, title
    );
    page(layout, title, &content)
}

pub fn error_page(code: StatusCode) -> String {
    let (title, message) = match code {
        StatusCode::NOT_FOUND => ("Page Not Found", "The page you were looking for does not exist."),
        StatusCode::INTERNAL_SERVER_ERROR => (
            "Something Went Wrong",
            "The server ran into a problem. Please try again later.",
        ),
        _ => ("Request Failed", "The request could not be processed."),
    };
    let content = format!(
        r#"<p class="status">{}</p><p>{}</p><p><a href="/">Back to the home page</a></p>"#,
        code.as_u16(),
        message
    );
    page(&Layout::default(), title, &content)
}
