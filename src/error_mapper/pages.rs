//! Built-in pages used when the site provides none.

use axum::http::StatusCode;
use maud::{html, Markup, DOCTYPE};

use crate::error_mapper::context::ErrorContext;

/// Plain error page; diagnostics are shown only when `context` is given.
pub fn error_page(status: StatusCode, context: Option<&ErrorContext>) -> Markup {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                h1 { (title) }
                @if let Some(ctx) = context {
                    p { "Error " (ctx.code) ": " (ctx.message) }
                    dl {
                        dt { "URL" } dd { (ctx.url) }
                        dt { "Method" } dd { (ctx.method) }
                        dt { "Content type" } dd { (ctx.content_type) }
                        dt { "Canvas" } dd { (ctx.canvas.as_deref().unwrap_or("-")) }
                        dt { "Template" } dd { (ctx.template.as_deref().unwrap_or("-")) }
                        @if let Some(id) = &ctx.request_id {
                            dt { "Request" } dd { (id) }
                        }
                    }
                    @if !ctx.tried.is_empty() {
                        h2 { "Attempts" }
                        ol {
                            @for trial in &ctx.tried {
                                li {
                                    code { (trial.route) }
                                    " → "
                                    (trial.template.as_deref().unwrap_or("-"))
                                    " returned "
                                    (trial.returned.to_string())
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Sign-in prompt shown when a page was refused as forbidden.
pub fn signin_page() -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Sign in" }
            }
            body {
                h1 { "Sign in required" }
                p { "You need to sign in to view this page." }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_page_without_diagnostics() {
        let page = error_page(StatusCode::NOT_FOUND, None).into_string();
        assert!(page.contains("404 Not Found"));
        assert!(!page.contains("Attempts"));
    }

    #[test]
    fn test_signin_page() {
        assert!(signin_page().into_string().contains("Sign in required"));
    }
}
