//! End-to-end behavior of the proxy in front of a mock site.

mod common;

use common::{client, config, header, start_backend, start_proxy};
use reqwest::header::{CONTENT_LENGTH, COOKIE, HOST, LOCATION, SET_COOKIE};

const PAGE: &str = r#"<html><body><a href="/fr/contact">fr</a><a href="/en/about">en</a></body></html>"#;

async fn page_backend() -> std::net::SocketAddr {
    start_backend(|_| ("text/html; charset=utf-8", PAGE.to_string())).await
}

#[tokio::test]
async fn test_explicit_language_redirects_to_its_domain() {
    let proxy = start_proxy(config(page_backend().await)).await;

    let res = client()
        .get(proxy.url("/fr/contact"))
        .header(HOST, "www.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 303);
    assert_eq!(res.headers()[LOCATION], "http://fr.example.com/fr/contact");
    let cookie = res.headers()[SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("language=; Max-Age=0"));
}

#[tokio::test]
async fn test_redirect_target_is_stable() {
    let proxy = start_proxy(config(page_backend().await)).await;

    let res = client()
        .get(proxy.url("/fr/contact"))
        .header(HOST, "fr.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_html_is_rewritten() {
    let proxy = start_proxy(config(page_backend().await)).await;

    let res = client()
        .get(proxy.url("/"))
        .header(HOST, "en.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let length: usize = res.headers()[CONTENT_LENGTH].to_str().unwrap().parse().unwrap();
    let body = res.text().await.unwrap();
    assert_eq!(body.len(), length);
    assert!(body.contains(r#"<a href="http://fr.example.com/contact">fr</a>"#));
    assert!(body.contains(r#"<a href="/about">en</a>"#));
}

#[tokio::test]
async fn test_https_primary_urls_from_forwarded_proto() {
    let proxy = start_proxy(config(page_backend().await)).await;

    let body = client()
        .get(proxy.url("/"))
        .header(HOST, "en.example.com")
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains(r#"href="https://fr.example.com/contact""#));
}

#[tokio::test]
async fn test_non_html_passes_through() {
    let backend = start_backend(|_| ("application/json", r#"{"url":"/fr/x"}"#.to_string())).await;
    let proxy = start_proxy(config(backend)).await;

    let body = client()
        .get(proxy.url("/api"))
        .header(HOST, "en.example.com")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(body, r#"{"url":"/fr/x"}"#);
}

#[tokio::test]
async fn test_ajax_and_post_are_never_redirected() {
    let proxy = start_proxy(config(page_backend().await)).await;

    let res = client()
        .get(proxy.url("/about?lang=fr"))
        .header(HOST, "en.example.com")
        .header("x-requested-with", "XMLHttpRequest")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client()
        .post(proxy.url("/fr/contact"))
        .header(HOST, "www.example.com")
        .body("name=x")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client()
        .get(proxy.url("/fr/feed?format=json"))
        .header(HOST, "www.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_secondary_domain_enforced() {
    let mut config = config(page_backend().await);
    config.language.enforce_domains = true;
    let proxy = start_proxy(config).await;

    let res = client()
        .get(proxy.url("/about"))
        .header(HOST, "m.en.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 303);
    assert_eq!(res.headers()[LOCATION], "http://en.example.com/about");
    assert!(res.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_secondary_domain_preserved_without_enforcement() {
    let backend = start_backend(|_| {
        (
            "text/html",
            r#"<a href="http://m.en.example.com/en/about">x</a>"#.to_string(),
        )
    })
    .await;
    let proxy = start_proxy(config(backend)).await;

    let res = client()
        .get(proxy.url("/"))
        .header(HOST, "m.en.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.text().await.unwrap(),
        r#"<a href="http://m.en.example.com/about">x</a>"#
    );
}

#[tokio::test]
async fn test_upstream_sees_forwarding_headers_without_language_cookie() {
    let backend = start_backend(|head| {
        let seen = format!(
            "lang={};host={};cookie={};encoding={}",
            header(head, "x-language-tag").unwrap_or("-"),
            header(head, "x-forwarded-host").unwrap_or("-"),
            header(head, "cookie").unwrap_or("-"),
            header(head, "accept-encoding").unwrap_or("-"),
        );
        ("text/plain", seen)
    })
    .await;
    let proxy = start_proxy(config(backend)).await;

    let res = client()
        .get(proxy.url("/"))
        .header(HOST, "fr.example.com")
        .header(COOKIE, "language=en-GB; sid=1")
        .header("accept-encoding", "gzip")
        .send()
        .await
        .unwrap();

    let expired = res.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(expired.starts_with("language=;"));
    assert_eq!(
        res.text().await.unwrap(),
        "lang=fr-FR;host=fr.example.com;cookie=sid=1;encoding=-"
    );
}

#[tokio::test]
async fn test_debug_trace_injected() {
    let mut config = config(page_backend().await);
    config.language.debug = true;
    let proxy = start_proxy(config).await;

    let body = client()
        .get(proxy.url("/"))
        .header(HOST, "en.example.com")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let script_at = body.find("<script>console.log(\"LANGUAGE DOMAINS: ").unwrap();
    assert!(script_at < body.rfind("</body>").unwrap());
}

#[tokio::test]
async fn test_empty_bindings_change_nothing() {
    let mut config = config(page_backend().await);
    config.language.bindings.clear();
    let proxy = start_proxy(config).await;

    let res = client()
        .get(proxy.url("/fr/contact?lang=fr"))
        .header(HOST, "www.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), PAGE);
}
