use std::collections::HashMap;
use std::sync::Arc;

use rocket::form::Form;
use rocket::http::Status;
use rocket::response::content::{RawText, RawXml};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::error::CmsError;
use crate::models::form::{screen_submission, FormDefinition, Screened};
use crate::models::now;
use crate::models::page::Page;
use crate::security::auth::{self, ClientIp};
use crate::site::{self, paginate};
use crate::sitemap;
use crate::store::Store;

// ── Pages ──────────────────────────────────────────────

fn render_page(store: &dyn Store, page: &Page) -> Template {
    let path = site::page_path(store, page);
    let title = page.meta_title.clone().unwrap_or_else(|| page.title.clone());
    let context = site::context(
        store,
        &path,
        json!({
            "page": page,
            "title": title,
            "meta_description": page.meta_description,
            "page_type": "page",
        }),
    );
    Template::render("site/page", &context)
}

#[get("/")]
pub fn homepage(store: &State<Arc<dyn Store>>) -> Template {
    let store: &dyn Store = &**store.inner();
    match site::home_page(store) {
        Some(page) => render_page(store, &page),
        // No published pages: the blog index stands in
        None => blog_listing(store, "/", None, None),
    }
}

#[get("/<slug>", rank = 5)]
pub fn page_view(store: &State<Arc<dyn Store>>, slug: &str) -> Option<Template> {
    let store: &dyn Store = &**store.inner();
    let page = store.page_find_by_slug(slug).filter(Page::is_published)?;
    Some(render_page(store, &page))
}

// ── Blog ───────────────────────────────────────────────

fn blog_listing(
    store: &dyn Store,
    path: &str,
    category: Option<&str>,
    page: Option<usize>,
) -> Template {
    let per_page = store.setting_get_i64("posts_per_page").max(1) as usize;
    let posts = store.post_list(Some("published"), category);
    let pagination = paginate(posts.len(), per_page, page);
    let shown: Vec<_> = posts
        .into_iter()
        .skip(pagination.offset)
        .take(per_page)
        .collect();

    let published = store.post_list(Some("published"), None);
    let categories = crate::models::blog::category_counts(&store.category_list(), &published);

    let title = match category {
        Some(name) => name.to_string(),
        None => store.setting_get_or("blog_title", "Blog"),
    };
    let context = site::context(
        store,
        path,
        json!({
            "posts": shown,
            "pagination": pagination,
            "categories": categories,
            "category": category,
            "title": title,
            "page_type": "blog_list",
        }),
    );
    Template::render("site/blog_list", &context)
}

#[get("/blog?<page>")]
pub fn blog_list(store: &State<Arc<dyn Store>>, page: Option<usize>) -> Template {
    blog_listing(&**store.inner(), "/blog", None, page)
}

#[get("/blog/category/<slug>?<page>")]
pub fn blog_category(
    store: &State<Arc<dyn Store>>,
    slug: &str,
    page: Option<usize>,
) -> Option<Template> {
    let store: &dyn Store = &**store.inner();
    let name = match store.category_find_by_slug(slug) {
        Some(category) => category.name,
        // Free-text category that only exists on posts
        None => store
            .post_list(Some("published"), None)
            .into_iter()
            .map(|p| p.category)
            .find(|c| !c.is_empty() && slug::slugify(c) == slug)?,
    };
    let path = format!("/blog/category/{}", slug);
    Some(blog_listing(store, &path, Some(&name), page))
}

#[get("/blog/<slug>")]
pub fn blog_single(store: &State<Arc<dyn Store>>, slug: &str) -> Option<Template> {
    let store: &dyn Store = &**store.inner();
    let post = store.post_find_by_slug(slug).filter(|p| p.is_published())?;
    let category = store
        .category_list()
        .into_iter()
        .find(|c| post.in_category(&c.name));
    let path = format!("/blog/{}", post.slug);
    let context = site::context(
        store,
        &path,
        json!({
            "post": post,
            "category": category,
            "title": post.title,
            "meta_description": post.excerpt,
            "page_type": "blog_single",
        }),
    );
    Some(Template::render("site/blog_post", &context))
}

// ── Events ─────────────────────────────────────────────

#[get("/events")]
pub fn events_list(store: &State<Arc<dyn Store>>) -> Template {
    let store: &dyn Store = &**store.inner();
    let at = now();
    let upcoming = store.event_upcoming(at, usize::MAX);
    let mut past: Vec<_> = store
        .event_list()
        .into_iter()
        .filter(|e| e.status == "published" && !e.is_upcoming(at))
        .collect();
    past.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));

    let context = site::context(
        store,
        "/events",
        json!({
            "upcoming": upcoming,
            "past": past,
            "title": store.setting_get_or("events_title", "Events"),
            "page_type": "events",
        }),
    );
    Template::render("site/events", &context)
}

// ── Forms ──────────────────────────────────────────────

fn form_template(
    store: &dyn Store,
    form: &FormDefinition,
    values: &HashMap<String, String>,
    error: Option<&CmsError>,
    success: bool,
) -> Template {
    let path = format!("/forms/{}", form.slug);
    let invalid: Vec<String> = match error {
        Some(CmsError::Validation { fields, .. }) => fields.clone(),
        _ => Vec::new(),
    };
    // Every field gets an entry so templates can index without checks
    let values: HashMap<&str, &str> = form
        .fields
        .iter()
        .map(|f| {
            let v = values.get(&f.name).map(String::as_str).unwrap_or("");
            (f.name.as_str(), v)
        })
        .collect();
    let context = site::context(
        store,
        &path,
        json!({
            "form": form,
            "values": values,
            "error": error.map(|e| e.message().to_string()),
            "invalid": invalid,
            "success": success,
            "title": form.name,
            "page_type": "form",
        }),
    );
    Template::render("site/form", &context)
}

#[get("/forms/<slug>")]
pub fn form_view(store: &State<Arc<dyn Store>>, slug: &str) -> Option<Template> {
    let store: &dyn Store = &**store.inner();
    let form = store.form_find_by_slug(slug)?;
    Some(form_template(store, &form, &HashMap::new(), None, false))
}

#[post("/forms/<slug>", data = "<data>")]
pub fn form_submit(
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    slug: &str,
    data: Form<HashMap<String, String>>,
) -> Option<(Status, Template)> {
    let store: &dyn Store = &**store.inner();
    let form = store.form_find_by_slug(slug)?;
    let values = data.into_inner();

    let outcome = screen_submission(&form, &values).and_then(|screened| match screened {
        Screened::Accept(clean) => store
            .submission_create(form.id, clean, Some(&auth::hash_ip(&ip.0)))
            .map(|_| ()),
        Screened::Discard => {
            log::info!("Discarded honeypot submission to form '{}'", form.slug);
            Ok(())
        }
    });

    Some(match outcome {
        Ok(()) => (
            Status::Ok,
            form_template(store, &form, &HashMap::new(), None, true),
        ),
        Err(e) => (e.status(), form_template(store, &form, &values, Some(&e), false)),
    })
}

// ── Sitemap & robots ───────────────────────────────────

#[get("/sitemap.xml")]
pub fn sitemap_xml(store: &State<Arc<dyn Store>>) -> Option<RawXml<String>> {
    sitemap::generate_sitemap(&**store.inner()).map(RawXml)
}

#[get("/robots.txt")]
pub fn robots_txt(store: &State<Arc<dyn Store>>) -> RawText<String> {
    RawText(sitemap::generate_robots(&**store.inner()))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        homepage,
        page_view,
        blog_list,
        blog_category,
        blog_single,
        events_list,
        form_view,
        form_submit,
        sitemap_xml,
        robots_txt
    ]
}
