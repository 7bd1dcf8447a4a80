//! Server-side HTML rendering: the layout shell shared by every page plus
//! the reusable fragments (pagination controls, form fields).

use crate::models::User;

/// Escape text content.
#[must_use]
pub fn esc(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

/// Escape a double-quoted attribute value.
#[must_use]
pub fn attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).into_owned()
}

const STYLE: &str = r#"
  body { font-family: sans-serif; margin: 0; display: flex; min-height: 100vh; }
  aside { width: 200px; background: #1f2937; color: #f9fafb; padding: 1rem; }
  aside a { display: block; color: #d1d5db; text-decoration: none; padding: .4rem 0; }
  main { flex: 1; padding: 1.5rem; }
  header { display: flex; justify-content: space-between; margin-bottom: 1rem; }
  table { border-collapse: collapse; width: 100%; }
  th, td { border-bottom: 1px solid #e5e7eb; padding: .5rem; text-align: left; }
  .chip { background: #e5e7eb; border-radius: 4px; padding: .1rem .4rem; font-size: .8rem; }
  .pagination a, .pagination span { margin-right: .3rem; padding: .2rem .6rem; border: 1px solid #d1d5db; }
  .pagination .current { background: #2563eb; color: white; }
  .pagination .disabled { opacity: .5; }
  .field-error { color: #dc2626; font-size: .85rem; margin: .2rem 0 0; }
  .banner-error { background: #fee2e2; color: #991b1b; padding: .6rem 1rem; margin-bottom: 1rem; }
  .state { text-align: center; padding: 2.5rem 0; color: #4b5563; }
  .poster-thumb { width: 64px; height: 96px; object-fit: cover; background: #e5e7eb; }
"#;

/// Wrap a page body in the dashboard shell. The sidebar and user-specific
/// header are only rendered for a signed-in operator; anonymous pages (the
/// login screen, error pages) get the bare shell.
#[must_use]
pub fn page(title: &str, user: Option<&User>, body: &str) -> String {
    let sidebar = match user {
        Some(_) => r#"<aside>
  <h2>Cinedeck</h2>
  <nav>
    <a href="/dashboard">Dashboard</a>
    <a href="/dashboard/movies">Movies</a>
    <a href="/dashboard/movies/create">Add movie</a>
    <a href="/auth/logout">Log out</a>
  </nav>
</aside>"#
            .to_string(),
        None => String::new(),
    };

    let header = match user {
        Some(user) => format!(
            r#"<header><h1>{}</h1><div>{} &middot; {}</div></header>"#,
            esc(title),
            esc(&user.name),
            esc(&user.role),
        ),
        None => format!("<header><h1>{}</h1></header>", esc(title)),
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Cinedeck</title>
<style>{STYLE}</style>
</head>
<body>
{sidebar}
<main>
{header}
{body}
</main>
</body>
</html>"#,
        title = esc(title),
    )
}

/// Link to the movies list preserving limit and search term.
#[must_use]
pub fn list_url(page: u32, limit: u32, search: Option<&str>) -> String {
    let mut url = format!("/dashboard/movies?page={page}&limit={limit}");
    if let Some(term) = search
        && !term.is_empty()
    {
        url.push_str(&format!("&search={}", urlencoding::encode(term)));
    }
    url
}

/// Pagination controls: one button per server-reported page, the current
/// page marked, Prev/Next disabled at the boundaries.
#[must_use]
pub fn pagination(page: u32, total_pages: u32, limit: u32, search: Option<&str>) -> String {
    let total_pages = total_pages.max(1);
    let page = page.clamp(1, total_pages);

    let mut out = String::from(r#"<nav class="pagination">"#);

    if page > 1 {
        out.push_str(&format!(
            r#"<a class="page-nav" href="{}">Prev</a>"#,
            attr(&list_url(page - 1, limit, search))
        ));
    } else {
        out.push_str(r#"<span class="page-nav disabled">Prev</span>"#);
    }

    for p in 1..=total_pages {
        if p == page {
            out.push_str(&format!(
                r#"<span class="page-btn current" aria-current="page">{p}</span>"#
            ));
        } else {
            out.push_str(&format!(
                r#"<a class="page-btn" href="{}">{p}</a>"#,
                attr(&list_url(p, limit, search))
            ));
        }
    }

    if page < total_pages {
        out.push_str(&format!(
            r#"<a class="page-nav" href="{}">Next</a>"#,
            attr(&list_url(page + 1, limit, search))
        ));
    } else {
        out.push_str(r#"<span class="page-nav disabled">Next</span>"#);
    }

    out.push_str("</nav>");
    out
}

/// A labelled text input with its validation message, if any.
#[must_use]
pub fn text_field(
    label: &str,
    name: &str,
    value: &str,
    input_type: &str,
    error: Option<&str>,
) -> String {
    let error_html = error.map_or(String::new(), |e| {
        format!(r#"<p class="field-error">{}</p>"#, esc(e))
    });

    format!(
        r#"<div class="field">
  <label for="{name}">{label}</label>
  <input type="{input_type}" id="{name}" name="{name}" value="{value}">
  {error_html}
</div>"#,
        name = attr(name),
        label = esc(label),
        input_type = attr(input_type),
        value = attr(value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_pagination_renders_one_button_per_page() {
        let html = pagination(1, 3, 10, None);
        assert_eq!(count(&html, r#"class="page-btn"#), 3);
    }

    #[test]
    fn test_pagination_marks_current_page() {
        let html = pagination(2, 3, 10, None);
        assert!(html.contains(r#"<span class="page-btn current" aria-current="page">2</span>"#));
        assert!(html.contains(r#">1</a>"#));
        assert!(html.contains(r#">3</a>"#));
    }

    #[test]
    fn test_pagination_disables_prev_on_first_page() {
        let html = pagination(1, 3, 10, None);
        assert!(html.contains(r#"<span class="page-nav disabled">Prev</span>"#));
        assert!(html.contains(r#">Next</a>"#));
    }

    #[test]
    fn test_pagination_disables_next_on_last_page() {
        let html = pagination(3, 3, 10, None);
        assert!(html.contains(r#"<span class="page-nav disabled">Next</span>"#));
        assert!(html.contains(r#">Prev</a>"#));
    }

    #[test]
    fn test_pagination_links_carry_search_term() {
        let html = pagination(1, 2, 10, Some("blade runner"));
        assert!(html.contains("search=blade%20runner"));
    }

    #[test]
    fn test_page_escapes_user_content() {
        let user = User {
            id: 1,
            name: "<script>alert(1)</script>".to_string(),
            email: "x@y.z".to_string(),
            role: "admin".to_string(),
            status: None,
        };
        let html = page("Home", Some(&user), "");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_anonymous_page_has_no_sidebar() {
        let html = page("Sign in", None, "<form></form>");
        assert!(!html.contains("<aside>"));
    }
}
