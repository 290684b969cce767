//! Markup emission for `Page` view-models.
//!
//! The only module that produces HTML. Everything upstream works in terms
//! of `Page`, so a template engine could replace this wholesale without
//! touching the workflows or the presentation adapter. Field values are
//! already HTML-escaped by the form pipeline before they reach the store.

use axum::response::{Html, IntoResponse, Response};
use serde_json::Value;

use crate::view::Page;

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        Html(render_page(&self)).into_response()
    }
}

pub fn render_page(page: &Page) -> String {
    let model = &page.model;
    let body = match page.template {
        "index" => index(model),
        "author_list" => author_list(model),
        "author_detail" => author_detail(model),
        "author_form" => author_form(model),
        "author_delete" => author_delete(model),
        "genre_list" => genre_list(model),
        "genre_detail" => genre_detail(model),
        "genre_form" => genre_form(model),
        "genre_delete" => genre_delete(model),
        "book_list" => book_list(model),
        "book_detail" => book_detail(model),
        "book_form" => book_form(model),
        "book_delete" => book_delete(model),
        "bookinstance_list" => instance_list(model),
        "bookinstance_detail" => instance_detail(model),
        "bookinstance_form" => instance_form(model),
        "bookinstance_delete" => instance_delete(model),
        _ => format!("<pre>{}</pre>", model),
    };
    layout(&page.title, &body)
}

// ----- value helpers -----

fn s<'a>(v: &'a Value, key: &str) -> &'a str {
    v[key].as_str().unwrap_or("")
}

fn arr<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v[key].as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn n(v: &Value, key: &str) -> i64 {
    v[key].as_i64().unwrap_or(0)
}

fn flag(v: &Value, key: &str) -> bool {
    v[key].as_bool().unwrap_or(false)
}

// ----- shared fragments -----

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\">\
         <title>{title}</title></head>\n<body>\n<nav><ul>\
         <li><a href=\"/catalog\">Home</a></li>\
         <li><a href=\"/catalog/books\">All books</a></li>\
         <li><a href=\"/catalog/authors\">All authors</a></li>\
         <li><a href=\"/catalog/genres\">All genres</a></li>\
         <li><a href=\"/catalog/bookinstances\">All book-instances</a></li>\
         <li><a href=\"/catalog/book/create\">Create new book</a></li>\
         <li><a href=\"/catalog/author/create\">Create new author</a></li>\
         <li><a href=\"/catalog/genre/create\">Create new genre</a></li>\
         <li><a href=\"/catalog/bookinstance/create\">Create new book instance</a></li>\
         </ul></nav>\n<main>\n<h1>{title}</h1>\n{body}\n</main>\n</body>\n</html>\n"
    )
}

fn errors_block(model: &Value) -> String {
    let errors = arr(model, "errors");
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", s(e, "message")))
        .collect();
    format!("<ul class=\"form-errors\">{items}</ul>")
}

fn link(url: &str, text: &str) -> String {
    format!("<a href=\"{url}\">{text}</a>")
}

fn summary_items(books: &[Value]) -> String {
    books
        .iter()
        .map(|b| {
            format!(
                "<li>{} <span>{}</span></li>",
                link(s(b, "url"), s(b, "title")),
                s(b, "summary")
            )
        })
        .collect()
}

// ----- templates -----

fn index(model: &Value) -> String {
    format!(
        "<p>Welcome to the local library. The catalog currently holds:</p>\n<ul>\
         <li>Books: {}</li>\
         <li>Copies: {}</li>\
         <li>Copies available: {}</li>\
         <li>Authors: {}</li>\
         <li>Genres: {}</li>\
         </ul>",
        n(model, "book_count"),
        n(model, "book_instance_count"),
        n(model, "book_instance_available_count"),
        n(model, "author_count"),
        n(model, "genre_count"),
    )
}

fn author_list(model: &Value) -> String {
    let items: String = arr(model, "author_list")
        .iter()
        .map(|a| {
            format!(
                "<li>{} ({})</li>",
                link(s(a, "url"), s(a, "name")),
                s(a, "lifespan_formatted")
            )
        })
        .collect();
    format!("<ul>{items}</ul>")
}

fn author_detail(model: &Value) -> String {
    let author = &model["author"];
    let books = summary_items(arr(model, "books_by_author"));
    format!(
        "<h2>{}</h2>\n<p>{}</p>\n<h3>Books</h3>\n<ul>{}</ul>\n\
         <p>{} {}</p>",
        s(author, "name"),
        s(author, "lifespan_formatted"),
        books,
        link(&format!("{}/update", s(author, "url")), "Update"),
        link(&format!("{}/delete", s(author, "url")), "Delete"),
    )
}

fn author_form(model: &Value) -> String {
    let author = &model["author"];
    format!(
        "{}<form method=\"post\">\
         <label>First Name: <input type=\"text\" name=\"first_name\" value=\"{}\"></label>\
         <label>Family Name: <input type=\"text\" name=\"family_name\" value=\"{}\"></label>\
         <label>Date of birth: <input type=\"date\" name=\"date_of_birth\" value=\"{}\"></label>\
         <label>Date of death: <input type=\"date\" name=\"date_of_death\" value=\"{}\"></label>\
         <button type=\"submit\">Submit</button>\
         </form>",
        errors_block(model),
        s(author, "first_name"),
        s(author, "family_name"),
        s(author, "date_of_birth"),
        s(author, "date_of_death"),
    )
}

fn author_delete(model: &Value) -> String {
    let author = &model["author"];
    let books = arr(model, "author_books");
    if books.is_empty() {
        format!(
            "<p>Do you really want to delete this author?</p>\
             <p>{}</p>\
             <form method=\"post\">\
             <input type=\"hidden\" name=\"authorid\" value=\"{}\">\
             <button type=\"submit\">Delete</button>\
             </form>",
            s(author, "name"),
            n(author, "id"),
        )
    } else {
        format!(
            "<p>Delete the following books before attempting to delete this author.</p>\
             <h3>Books</h3>\n<ul>{}</ul>",
            summary_items(books)
        )
    }
}

fn genre_list(model: &Value) -> String {
    let items: String = arr(model, "genre_list")
        .iter()
        .map(|g| format!("<li>{}</li>", link(s(g, "url"), s(g, "name"))))
        .collect();
    format!("<ul>{items}</ul>")
}

fn genre_detail(model: &Value) -> String {
    let genre = &model["genre"];
    format!(
        "<h2>{}</h2>\n<h3>Books in this genre</h3>\n<ul>{}</ul>\n\
         <p>{} {}</p>",
        s(genre, "name"),
        summary_items(arr(model, "books_in_genre")),
        link(&format!("{}/update", s(genre, "url")), "Update"),
        link(&format!("{}/delete", s(genre, "url")), "Delete"),
    )
}

fn genre_form(model: &Value) -> String {
    let genre = &model["genre"];
    format!(
        "{}<form method=\"post\">\
         <label>Genre: <input type=\"text\" name=\"name\" value=\"{}\"></label>\
         <button type=\"submit\">Submit</button>\
         </form>",
        errors_block(model),
        s(genre, "name"),
    )
}

fn genre_delete(model: &Value) -> String {
    let genre = &model["genre"];
    let books = arr(model, "genre_books");
    if books.is_empty() {
        format!(
            "<p>Do you really want to delete this genre?</p>\
             <p>{}</p>\
             <form method=\"post\">\
             <input type=\"hidden\" name=\"genreid\" value=\"{}\">\
             <button type=\"submit\">Delete</button>\
             </form>",
            s(genre, "name"),
            n(genre, "id"),
        )
    } else {
        format!(
            "<p>Delete the following books before attempting to delete this genre.</p>\
             <h3>Books</h3>\n<ul>{}</ul>",
            summary_items(books)
        )
    }
}

fn book_list(model: &Value) -> String {
    let items: String = arr(model, "book_list")
        .iter()
        .map(|b| {
            format!(
                "<li>{} ({})</li>",
                link(s(b, "url"), s(b, "title")),
                s(b, "author_name")
            )
        })
        .collect();
    format!("<ul>{items}</ul>")
}

fn book_detail(model: &Value) -> String {
    let book = &model["book"];
    let author = &model["author"];
    let genres: Vec<String> = arr(model, "genres")
        .iter()
        .map(|g| link(s(g, "url"), s(g, "name")))
        .collect();
    let copies: String = arr(model, "book_instances")
        .iter()
        .map(|i| {
            format!(
                "<li>{}: {} {} {}</li>",
                s(i, "imprint"),
                s(i, "status"),
                s(i, "due_back_formatted"),
                link(s(i, "url"), "details"),
            )
        })
        .collect();
    format!(
        "<p>Author: {}</p>\n<p>Summary: {}</p>\n<p>ISBN: {}</p>\n\
         <p>Genre: {}</p>\n<h3>Copies</h3>\n<ul>{}</ul>\n\
         <p>{} {}</p>",
        link(s(author, "url"), s(author, "name")),
        s(book, "summary"),
        s(book, "isbn"),
        genres.join(", "),
        copies,
        link(&format!("{}/update", s(book, "url")), "Update"),
        link(&format!("{}/delete", s(book, "url")), "Delete"),
    )
}

fn book_form(model: &Value) -> String {
    let book = &model["book"];
    let authors: String = arr(model, "authors")
        .iter()
        .map(|a| {
            format!(
                "<option value=\"{}\"{}>{}</option>",
                n(a, "id"),
                if flag(a, "selected") { " selected" } else { "" },
                s(a, "name"),
            )
        })
        .collect();
    let genres: String = arr(model, "genres")
        .iter()
        .map(|g| {
            format!(
                "<label><input type=\"checkbox\" name=\"genre\" value=\"{}\"{}> {}</label>",
                n(g, "id"),
                if flag(g, "checked") { " checked" } else { "" },
                s(g, "name"),
            )
        })
        .collect();
    format!(
        "{}<form method=\"post\">\
         <label>Title: <input type=\"text\" name=\"title\" value=\"{}\"></label>\
         <label>Author: <select name=\"author\"><option value=\"\">--select--</option>{}</select></label>\
         <label>Summary: <textarea name=\"summary\">{}</textarea></label>\
         <label>ISBN: <input type=\"text\" name=\"isbn\" value=\"{}\"></label>\
         <fieldset><legend>Genre</legend>{}</fieldset>\
         <button type=\"submit\">Submit</button>\
         </form>",
        errors_block(model),
        s(book, "title"),
        authors,
        s(book, "summary"),
        s(book, "isbn"),
        genres,
    )
}

fn book_delete(model: &Value) -> String {
    let book = &model["book"];
    let instances = arr(model, "book_instances");
    if instances.is_empty() {
        format!(
            "<p>Do you really want to delete this book?</p>\
             <p>{}</p>\
             <form method=\"post\">\
             <input type=\"hidden\" name=\"bookid\" value=\"{}\">\
             <button type=\"submit\">Delete</button>\
             </form>",
            s(book, "title"),
            n(book, "id"),
        )
    } else {
        let items: String = instances
            .iter()
            .map(|i| format!("<li>{} ({})</li>", s(i, "imprint"), s(i, "status")))
            .collect();
        format!(
            "<p>Delete the following copies before attempting to delete this book.</p>\
             <h3>Copies</h3>\n<ul>{items}</ul>"
        )
    }
}

fn instance_list(model: &Value) -> String {
    let items: String = arr(model, "bookinstance_list")
        .iter()
        .map(|i| {
            format!(
                "<li>{}: {} ({}) {}</li>",
                link(s(i, "url"), s(i, "book_title")),
                s(i, "imprint"),
                s(i, "status"),
                s(i, "due_back_formatted"),
            )
        })
        .collect();
    format!("<ul>{items}</ul>")
}

fn instance_detail(model: &Value) -> String {
    let instance = &model["book_instance"];
    let book = &model["book"];
    format!(
        "<p>Book: {}</p>\n<p>Imprint: {}</p>\n<p>Status: {}</p>\n<p>Due back: {}</p>\n\
         <p>{}</p>",
        link(s(book, "url"), s(book, "title")),
        s(instance, "imprint"),
        s(instance, "status"),
        s(instance, "due_back_formatted"),
        link(&format!("{}/delete", s(instance, "url")), "Delete"),
    )
}

fn instance_form(model: &Value) -> String {
    let instance = &model["bookinstance"];
    let books: String = arr(model, "book_list")
        .iter()
        .map(|b| {
            format!(
                "<option value=\"{}\"{}>{}</option>",
                n(b, "id"),
                if flag(b, "selected") { " selected" } else { "" },
                s(b, "title"),
            )
        })
        .collect();
    let current_status = s(instance, "status");
    let statuses: String = arr(model, "statuses")
        .iter()
        .map(|v| {
            let status = v.as_str().unwrap_or("");
            format!(
                "<option value=\"{}\"{}>{}</option>",
                status,
                if status == current_status { " selected" } else { "" },
                status,
            )
        })
        .collect();
    format!(
        "{}<form method=\"post\">\
         <label>Book: <select name=\"book\"><option value=\"\">--select--</option>{}</select></label>\
         <label>Imprint: <input type=\"text\" name=\"imprint\" value=\"{}\"></label>\
         <label>Date when book available: <input type=\"date\" name=\"due_back\" value=\"{}\"></label>\
         <label>Status: <select name=\"status\">{}</select></label>\
         <button type=\"submit\">Submit</button>\
         </form>",
        errors_block(model),
        books,
        s(instance, "imprint"),
        s(instance, "due_back"),
        statuses,
    )
}

fn instance_delete(model: &Value) -> String {
    let instance = &model["book_instance"];
    format!(
        "<p>Do you really want to delete this copy?</p>\
         <p>{} ({})</p>\
         <form method=\"post\">\
         <input type=\"hidden\" name=\"bookinstanceid\" value=\"{}\">\
         <button type=\"submit\">Delete</button>\
         </form>",
        s(instance, "imprint"),
        s(instance, "status"),
        n(instance, "id"),
    )
}
