use std::sync::Arc;

use actix_csrf::CsrfMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::{header, Method, StatusCode};
use actix_web::{test, web, App};
use rand::prelude::StdRng;
use redb::{Database, ReadableTable};
use tempfile::TempDir;
use tera::Tera;

use devlog_backend::auth::FixedCredentials;
use devlog_backend::draft::DraftClient;
use devlog_backend::middleware::RequireAdmin;
use devlog_backend::models::db_operations::posts_db_operations::{self, POSTS_KEY, STORAGE};
use devlog_backend::routes;
use devlog_backend::AppState;

fn test_key() -> Key {
    Key::from(&[7u8; 64])
}

fn fixtures() -> (TempDir, web::Data<Database>, web::Data<AppState>, Tera) {
    let dir = TempDir::new().expect("temp dir");
    let db = Database::create(dir.path().join("devlog.redb")).expect("create db");
    posts_db_operations::initialize_store(&db).expect("seed");

    let state = AppState {
        credentials: Arc::new(FixedCredentials::new("admin", "admin")),
        // Unroutable endpoint: every draft call fails at the transport.
        draft_client: DraftClient::new("http://127.0.0.1:9", "test-key").expect("client"),
    };

    let tera = Tera::new("templates/**/*.html").expect("templates");

    (dir, web::Data::new(db), web::Data::new(state), tera)
}

// Mirrors the server's session/csrf/guard wiring from main.rs.
macro_rules! test_app {
    ($db:expr, $state:expr, $tera:expr) => {
        test::init_service(
            App::new()
                .app_data($db.clone())
                .app_data($state.clone())
                .app_data(web::Data::new($tera.clone()))
                .service(
                    web::scope("")
                        .wrap(
                            SessionMiddleware::builder(CookieSessionStore::default(), test_key())
                                .cookie_name("devlog_user".to_string())
                                .cookie_secure(false)
                                .build(),
                        )
                        .configure(routes::public::config_api)
                        .configure(routes::public::config_pages)
                        .service(
                            web::scope("/admin")
                                .wrap(
                                    CsrfMiddleware::<StdRng>::new()
                                        .set_cookie(Method::GET, "/admin/login"),
                                )
                                .configure(routes::admin::config_login)
                                .service(
                                    web::scope("")
                                        .wrap(RequireAdmin)
                                        .configure(routes::admin::config_dashboard),
                                ),
                        ),
                ),
        )
        .await
    };
}

fn extract_csrf_token(body: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = body.find(marker).expect("csrf token field in login page") + marker.len();
    let end = body[start..].find('"').expect("closing quote") + start;
    body[start..end].to_string()
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
}

/// Walks the real login flow and returns the cookies an authenticated
/// browser would hold (csrf cookie + devlog_user session cookie).
async fn login<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, String, Vec<Cookie<'static>>)
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let resp = test::call_service(app, test::TestRequest::get().uri("/admin/login").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let mut cookies: Vec<Cookie<'static>> =
        resp.response().cookies().map(|c| c.into_owned()).collect();
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8 body");
    let token = extract_csrf_token(&body);

    let form = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("csrf_token", &token)
        .append_pair("username", username)
        .append_pair("password", password)
        .finish();

    let mut req = test::TestRequest::post()
        .uri("/admin/login")
        .insert_header(header::ContentType::form_url_encoded())
        .set_payload(form);
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }

    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let redirect = location(&resp).to_string();
    for cookie in resp.response().cookies() {
        cookies.push(cookie.into_owned());
    }
    (status, redirect, cookies)
}

#[actix_web::test]
async fn anonymous_admin_pages_redirect_to_login() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    for uri in ["/admin/dashboard", "/admin/new", "/admin/edit/1"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri} must redirect");
        assert_eq!(location(&resp), "/admin/login", "{uri} must point at login");
    }
}

#[actix_web::test]
async fn valid_credentials_authenticate_and_open_the_dashboard() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let (status, redirect, cookies) = login(&app, "admin", "admin").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(redirect, "/admin/dashboard");
    assert!(
        cookies.iter().any(|c| c.name() == "devlog_user"),
        "login must persist the session record"
    );

    let mut req = test::TestRequest::get().uri("/admin/dashboard");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8 body");
    assert!(body.contains("Signed in as admin"));
}

#[actix_web::test]
async fn wrong_credentials_stay_anonymous_with_an_error() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let (status, redirect, cookies) = login(&app, "admin", "wrong").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(redirect, "/admin/login");

    // The session is still anonymous: admin pages keep redirecting.
    let mut req = test::TestRequest::get().uri("/admin/dashboard");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/admin/login");

    // And the login page surfaces the inline error.
    let mut req = test::TestRequest::get().uri("/admin/login");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8 body");
    assert!(body.contains("Invalid credentials."));
}

#[actix_web::test]
async fn authenticated_login_page_redirects_to_dashboard() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let (_, _, cookies) = login(&app, "admin", "admin").await;

    let mut req = test::TestRequest::get().uri("/admin/login");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/admin/dashboard");
}

#[actix_web::test]
async fn logout_clears_the_session_record() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let (_, _, cookies) = login(&app, "admin", "admin").await;

    let mut req = test::TestRequest::post().uri("/admin/logout");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    // The session cookie is replaced with a removal cookie.
    let removal = resp
        .response()
        .cookies()
        .find(|c| c.name() == "devlog_user")
        .expect("logout must rewrite the session cookie");
    assert!(removal.value().is_empty());

    // A browser honoring it is anonymous again.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/admin/dashboard").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/admin/login");
}

#[actix_web::test]
async fn failed_draft_call_leaves_store_and_session_untouched() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let (_, _, cookies) = login(&app, "admin", "admin").await;

    let blob_before = {
        let txn = db.begin_read().expect("read txn");
        let table = txn.open_table(STORAGE).expect("table");
        let blob = table.get(POSTS_KEY).expect("read").expect("present").value().to_string();
        blob
    };

    let mut req = test::TestRequest::post()
        .uri("/admin/api/draft")
        .set_json(serde_json::json!({ "title": "My Title", "notes": "rough notes" }));
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to generate draft.");

    // GenerationFailure is isolated: nothing was written.
    let blob_after = {
        let txn = db.begin_read().expect("read txn");
        let table = txn.open_table(STORAGE).expect("table");
        let blob = table.get(POSTS_KEY).expect("read").expect("present").value().to_string();
        blob
    };
    assert_eq!(blob_after, blob_before);

    // The session survives: the dashboard still renders.
    let mut req = test::TestRequest::get().uri("/admin/dashboard");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn empty_title_is_rejected_before_calling_the_model() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let (_, _, cookies) = login(&app, "admin", "admin").await;

    let mut req = test::TestRequest::post()
        .uri("/admin/api/draft")
        .set_json(serde_json::json!({ "title": "  ", "notes": "" }));
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn save_and_delete_round_trip_through_the_forms() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let (_, _, cookies) = login(&app, "admin", "admin").await;

    let form = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("id", "")
        .append_pair("title", "Posted via form")
        .append_pair("date", "2024-06-01")
        .append_pair("image_url", "")
        .append_pair("author", "")
        .append_pair("excerpt", "from the editor")
        .append_pair("content", "body text")
        .append_pair("tags", "Rust, Actix")
        .finish();

    let mut req = test::TestRequest::post()
        .uri("/admin/save_post")
        .insert_header(header::ContentType::form_url_encoded())
        .set_payload(form);
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/admin/dashboard");

    // Minted id, inserted at the front.
    let posts = posts_db_operations::read_all_posts(&db).expect("read");
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].title, "Posted via form");
    assert_eq!(posts[0].tags, vec!["Rust", "Actix"]);
    let minted_id = posts[0].id.clone();
    assert!(!minted_id.is_empty());

    let form = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("post_id", &minted_id)
        .finish();
    let mut req = test::TestRequest::post()
        .uri("/admin/delete_post")
        .insert_header(header::ContentType::form_url_encoded())
        .set_payload(form);
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let posts = posts_db_operations::read_all_posts(&db).expect("read");
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.id != minted_id));
}

#[actix_web::test]
async fn public_api_serves_posts_and_adjacency() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/posts/latest").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let posts: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(posts.as_array().expect("array").len(), 2);
    assert_eq!(posts[0]["id"], "1");
    assert!(posts[0]["imageUrl"].is_string());

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/posts/1/adjacent").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let adjacent: serde_json::Value = test::read_body_json(resp).await;
    assert!(adjacent["newer"].is_null());
    assert_eq!(adjacent["older"]["id"], "2");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/posts/missing").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn feed_and_detail_pages_render() {
    let (_dir, db, state, tera) = fixtures();
    let app = test_app!(db, state, tera);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8 body");
    assert!(body.contains("Deploying our first Kubernetes Cluster"));
    assert!(body.contains("React 19 Features Review"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/post/1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8 body");
    assert!(body.contains("Deploying our first Kubernetes Cluster"));
    // Positional neighbor, shown as the "older" link.
    assert!(body.contains("/post/2"));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/post/unknown").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8 body");
    assert!(body.contains("Post not found"));
}
