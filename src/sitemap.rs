use crate::site;
use crate::store::Store;

/// Generate sitemap.xml content.
/// Returns None if sitemap_enabled is false.
pub fn generate_sitemap(store: &dyn Store) -> Option<String> {
    if !store.setting_get_bool("sitemap_enabled") {
        return None;
    }

    let site_url = site_url(store);
    let home = site::home_page(store);
    let home_id = home.as_ref().map(|p| p.id);

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
"#,
    );

    // Homepage
    let home_lastmod = home
        .as_ref()
        .map(|p| format!("<lastmod>{}</lastmod>", p.updated_at.format("%Y-%m-%d")))
        .unwrap_or_default();
    xml.push_str(&format!(
        "  <url><loc>{}/</loc>{}<changefreq>daily</changefreq><priority>1.0</priority></url>\n",
        site_url, home_lastmod
    ));

    // Published pages; the home page is already listed as "/"
    for page in store
        .page_list(Some("published"))
        .iter()
        .filter(|p| Some(p.id) != home_id)
    {
        xml.push_str(&format!(
            "  <url><loc>{}/{}</loc><lastmod>{}</lastmod><priority>0.8</priority></url>\n",
            site_url,
            xml_escape(&page.slug),
            page.updated_at.format("%Y-%m-%d")
        ));
    }

    // Blog index
    xml.push_str(&format!(
        "  <url><loc>{}/blog</loc><changefreq>daily</changefreq><priority>0.7</priority></url>\n",
        site_url
    ));

    // Published posts
    for post in &store.post_list(Some("published"), None) {
        xml.push_str(&format!(
            "  <url><loc>{}/blog/{}</loc><lastmod>{}</lastmod><priority>0.6</priority></url>\n",
            site_url,
            xml_escape(&post.slug),
            post.updated_at.format("%Y-%m-%d")
        ));
    }

    // Events index
    xml.push_str(&format!(
        "  <url><loc>{}/events</loc><changefreq>weekly</changefreq><priority>0.5</priority></url>\n",
        site_url
    ));

    xml.push_str("</urlset>");
    Some(xml)
}

/// Generate robots.txt content with dynamic sitemap URL.
pub fn generate_robots(store: &dyn Store) -> String {
    let mut content = store.setting_get_or("robots_txt", "User-agent: *\nAllow: /");
    if store.setting_get_bool("sitemap_enabled") {
        content.push_str(&format!("\nSitemap: {}/sitemap.xml", site_url(store)));
    }
    content
}

fn site_url(store: &dyn Store) -> String {
    store
        .setting_get_or("site_url", "http://localhost:8000")
        .trim_end_matches('/')
        .to_string()
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
