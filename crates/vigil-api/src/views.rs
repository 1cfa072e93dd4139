use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use vigil_types::jalali;

use crate::auth::{AppState, session_claims};
use crate::calendar::today;

const LOGIN_HTML: &str = include_str!("../assets/login.html");
const CALENDAR_HTML: &str = include_str!("../assets/calendar.html");
const DAY_HTML: &str = include_str!("../assets/day.html");
const CALENDAR_JS: &str = include_str!("../assets/calendar.js");
const STYLE_CSS: &str = include_str!("../assets/style.css");

pub const LOGIN_FAILED: &str = "نام کاربری یا رمز عبور اشتباه است";

/// 302 redirect.
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fills `{{name}}` placeholders; values are escaped.
fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |page, (name, value)| {
        page.replace(&format!("{{{{{}}}}}", name), &escape_html(value))
    })
}

pub fn login_form(error: Option<&str>) -> Response {
    let error = error
        .map(|msg| format!("<div class=\"error\">{}</div>", escape_html(msg)))
        .unwrap_or_default();
    Html(LOGIN_HTML.replace("{{error}}", &error)).into_response()
}

/// GET /
pub async fn index() -> Response {
    found("/calendar")
}

/// GET /login
pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if session_claims(&state, &jar).is_some() {
        return found("/calendar");
    }
    login_form(None)
}

/// GET /calendar
pub async fn calendar_page() -> Response {
    match today() {
        Ok(today) => Html(render(
            CALENDAR_HTML,
            &[
                ("year", today.year.to_string()),
                ("month", today.month.to_string()),
                ("day", today.day.to_string()),
            ],
        ))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /day/{year}/{month}/{day}
pub async fn day_page(Path((year, month, day)): Path<(i32, u32, u32)>) -> Response {
    Html(render(
        DAY_HTML,
        &[
            ("year", year.to_string()),
            ("month", month.to_string()),
            ("day", day.to_string()),
            ("month_name", jalali::month_name(month).unwrap_or_default().to_string()),
        ],
    ))
    .into_response()
}

pub async fn calendar_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript; charset=utf-8")], CALENDAR_JS)
}

pub async fn style_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_escapes_values() {
        let page = render("<p>{{name}}</p><p>{{name}}</p>", &[("name", "<b>&".to_string())]);
        assert_eq!(page, "<p>&lt;b&gt;&amp;</p><p>&lt;b&gt;&amp;</p>");
    }

    #[test]
    fn login_form_without_error_has_no_placeholder() {
        let response = login_form(None);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!LOGIN_HTML.replace("{{error}}", "").contains("{{"));
    }
}
