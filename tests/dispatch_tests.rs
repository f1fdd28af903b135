//! End-to-end dispatch tests through `Site::handle`.

use axum::http::{Method, StatusCode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use canvas_router::render::{Registry, RenderPipeline, ResourceLocator, Sentinel, Verdict, DEFAULT_CONTENT_MARKER};
use canvas_router::routing::{
    DispatchDefaults, DispatchError, Dispatcher, MethodMask, RequestContext, RouteTable, ANY_SCOPE,
};
use canvas_router::{Site, SiteBuilder};

mod common;

fn get(site: &Site, path: &str) -> canvas_router::http::Reply {
    site.handle(RequestContext::new(Method::GET, path))
}

fn memory_site(bind: impl FnOnce(&mut RouteTable)) -> Site {
    let mut builder = SiteBuilder::new(common::memory_settings()).registry(common::registry());
    bind(builder.routes());
    builder.build()
}

#[test]
fn test_first_registered_pattern_wins() {
    let site = memory_site(|routes| {
        routes.get("page/:name", |s| s.set_template("ok")).unwrap();
        routes.get("page/about", |s| s.set_template("secret")).unwrap();
    });
    assert_eq!(get(&site, "/page/about").text(), "<html>ok page/about</html>");

    let site = memory_site(|routes| {
        routes.get("page/about", |s| s.set_template("secret")).unwrap();
        routes.get("page/:name", |s| s.set_template("ok")).unwrap();
    });
    assert_eq!(get(&site, "/page/about").text(), "<html>secret output</html>");
}

#[test]
fn test_get_falls_back_past_newer_post_binding() {
    let site = memory_site(|routes| {
        routes.get("x", |s| s.set_template("ok")).unwrap();
        routes.post("x", |s| s.set_template("secret")).unwrap();
    });

    let reply = get(&site, "/x");
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.text(), "<html>ok x</html>");

    let reply = site.handle(RequestContext::new(Method::POST, "/x"));
    assert_eq!(reply.text(), "<html>secret output</html>");

    // No binding accepts DELETE: a method error, not a missing route.
    let reply = site.handle(RequestContext::new(Method::DELETE, "/x"));
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_captures_reach_handlers() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let site = memory_site(move |routes| {
        let r1 = recorded.clone();
        routes
            .get("user/:id", move |s| {
                r1.lock().unwrap().push(s.params().clone());
                s.set_template("ok");
            })
            .unwrap();
        let r2 = recorded.clone();
        routes
            .get("files/:path+", move |s| {
                r2.lock().unwrap().push(s.params().clone());
                s.set_template("ok");
            })
            .unwrap();
        let r3 = recorded;
        routes
            .get("post(/:id)", move |s| {
                r3.lock().unwrap().push(s.params().clone());
                s.set_template("ok");
            })
            .unwrap();
    });

    for path in ["/user/42", "/files/a/b/c", "/post", "/post/5"] {
        assert_eq!(get(&site, path).status, StatusCode::OK, "{path}");
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], HashMap::from([("id".to_string(), "42".to_string())]));
    assert_eq!(seen[1], HashMap::from([("path".to_string(), "a/b/c".to_string())]));
    assert!(!seen[2].contains_key("id"));
    assert_eq!(seen[3]["id"], "5");
}

#[test]
fn test_rejected_template_falls_through_to_older_binding() {
    let site = memory_site(|routes| {
        routes.get("page", |s| s.set_template("ok")).unwrap();
        routes.get("page", |s| s.set_template("reject")).unwrap();
    });

    let reply = get(&site, "/page");
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.text(), "<html>ok page</html>");
}

#[test]
fn test_retry_exhaustion_records_every_attempt() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut table = RouteTable::new("main");
    for _ in 0..3 {
        let calls = calls.clone();
        table
            .route("loop", MethodMask::GET, move |s| {
                calls.fetch_add(1, Ordering::SeqCst);
                s.set_template("reject");
            })
            .unwrap();
    }
    table.get("loop/:tail", |s| s.set_template("ok")).unwrap();

    let locator = ResourceLocator::new().registry(common::registry());
    let defaults = DispatchDefaults {
        canvas: Some("html".into()),
        ..DispatchDefaults::default()
    };
    let mut dispatcher = Dispatcher::new(
        &table,
        RenderPipeline::new(&locator, DEFAULT_CONTENT_MARKER),
        &defaults,
    );

    let mut request = RequestContext::new(Method::GET, "/loop");
    let error = dispatcher.dispatch(&mut request).unwrap_err();

    assert!(matches!(error, DispatchError::RoutesExhausted { attempts: 3, .. }));
    assert_eq!(error.code().as_u8(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let tried = &dispatcher.state().tried_attempts;
    assert_eq!(tried.len(), 3);
    assert!(tried.iter().all(|t| t.returned == Sentinel::Code(0)));
}

#[test]
fn test_exhausted_route_renders_404() {
    let site = memory_site(|routes| {
        routes.get("gone", |s| s.set_template("reject")).unwrap();
    });
    let reply = get(&site, "/gone");
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(!reply.text().contains("rejected output"));
}

#[test]
fn test_forbidden_rejection_shows_signin() {
    let mut registry = Registry::new();
    registry.canvas("signin", |_, out| {
        out.push_str("<form>sign in</form>");
        canvas_router::render::CanvasVerdict::Accept
    });
    let mut builder = SiteBuilder::new(common::memory_settings())
        .registry(common::registry())
        .registry(registry);
    builder.routes().get("admin", |s| s.set_template("forbidden")).unwrap();
    let site = builder.build();

    let reply = get(&site, "/admin");
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.text(), "<form>sign in</form>");
}

#[test]
fn test_canvas_failure_discards_template_output() {
    let site = memory_site(|routes| {
        routes
            .get("boom", |s| {
                s.set_canvas("broken", true);
                s.set_template("secret");
            })
            .unwrap();
    });

    let reply = get(&site, "/boom");
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!reply.text().contains("secret output"));
    assert!(!reply.text().contains("<broken>"));
}

#[test]
fn test_raw_canvas_skips_template_stage() {
    let site = memory_site(|routes| {
        routes
            .get("api/ping", |s| {
                s.set_canvas("raw", false);
                s.set_template("reject");
                s.set_content_type("text/plain");
            })
            .unwrap();
    });

    let reply = get(&site, "/api/ping");
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type.as_deref(), Some("text/plain"));
    assert_eq!(reply.text(), "raw:api/ping");
}

#[test]
fn test_static_fallback_serves_module_css() {
    let dir = common::SiteDir::new();
    dir.module_asset("foo", "style.css", b"body { color: red }");
    let module = dir.module_dir("foo");
    let site = SiteBuilder::new(dir.settings())
        .module("foo", &module.to_string_lossy())
        .build();

    let reply = get(&site, "/module/foo/public/style.css");
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type.as_deref(), Some("text/css"));
    assert_eq!(reply.text(), "body { color: red }");
}

#[test]
fn test_static_fallback_refuses_traversal() {
    let dir = common::SiteDir::new();
    dir.module_asset("foo", "style.css", b"body {}");
    std::fs::write(dir.module_dir("foo").join("secret.txt"), "secret").unwrap();
    let module = dir.module_dir("foo");
    let site = SiteBuilder::new(dir.settings())
        .module("foo", &module.to_string_lossy())
        .build();

    for path in [
        "/module/foo/public/../secret.txt",
        "/module/foo/public/./../secret.txt",
        "/module/foo/secret.txt",
    ] {
        let reply = get(&site, path);
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{path}");
        assert!(!reply.text().contains("secret"), "{path}");
    }
}

#[test]
fn test_file_resources_from_site_directory() {
    let dir = common::SiteDir::new();
    dir.canvas("html", "<body>%content%</body>")
        .template("hello", "<p>Hello {{name}}</p>");
    let mut builder = SiteBuilder::new(dir.settings());
    builder.routes().get("hello/:name", |s| s.set_template("hello")).unwrap();
    let site = builder.build();

    let reply = get(&site, "/hello/<b>");
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.text(), "<body><p>Hello &lt;b&gt;</p></body>");
}

#[test]
fn test_site_error_template_on_missing_route() {
    let dir = common::SiteDir::new();
    dir.canvas("error", "<main>%content%</main>")
        .template("error/404", "missing {{path}} ({{status}})");
    let site = SiteBuilder::new(dir.settings()).build();

    let reply = get(&site, "/nowhere");
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.text(), "<main>missing nowhere (404)</main>");
}

#[test]
fn test_scoped_bindings_follow_base_path_key() {
    let mut builder = SiteBuilder::new(common::memory_settings()).registry(common::registry());
    let routes = builder.routes();
    assert!(!routes
        .bind("admin", "only-admin", None, &HashMap::new(), MethodMask::GET)
        .unwrap());
    assert!(routes
        .bind("main|admin", "shared", None, &HashMap::new(), MethodMask::GET)
        .unwrap());
    assert!(routes
        .bind(ANY_SCOPE, "everywhere", None, &HashMap::new(), MethodMask::GET)
        .unwrap());
    let site = builder.build();

    assert_eq!(site.table().len(), 2);
    assert_eq!(get(&site, "/only-admin").status, StatusCode::NOT_FOUND);
}

#[test]
fn test_handler_without_template_renders_empty_canvas() {
    let site = memory_site(|routes| {
        routes
            .bind(ANY_SCOPE, "blank", None, &HashMap::new(), MethodMask::GET)
            .unwrap();
    });
    assert_eq!(get(&site, "/blank").text(), "<html></html>");
}

#[test]
fn test_template_verdict_closures_are_per_request() {
    let mut registry = Registry::new();
    registry.template("member", |ctx, out| {
        if ctx.query.contains_key("token") {
            out.push_str("welcome");
            Verdict::Accept
        } else {
            Verdict::Reject(Sentinel::Forbidden)
        }
    });
    let mut builder = SiteBuilder::new(common::memory_settings())
        .registry(common::registry())
        .registry(registry);
    builder.routes().get("member", |s| s.set_template("member")).unwrap();
    let site = builder.build();

    assert_eq!(get(&site, "/member").status, StatusCode::FORBIDDEN);

    let request = RequestContext::new(Method::GET, "/member")
        .with_query(HashMap::from([("token".to_string(), "t".to_string())]));
    assert_eq!(site.handle(request).text(), "<html>welcome</html>");
}
