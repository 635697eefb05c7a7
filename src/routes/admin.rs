use crate::helper::{admin_helpers, form_helpers, public_helpers};
use crate::middleware::AuthenticatedAdmin;
use crate::models::Notification;
use crate::AppState;
use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use redb::Database;
use serde::Deserialize;
use serde_json::json;
use tera::{Context, Tera};

const LOGIN_URL: &str = "/admin/login";
const DASHBOARD_URL: &str = "/admin/dashboard";

#[derive(Deserialize)]
struct LoginForm {
    csrf_token: CsrfToken,
    username: String,
    password: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

#[derive(Deserialize)]
struct DraftRequest {
    title: String,
    notes: String,
}

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(show_admin_login_form))
        .route("/login", web::post().to(handle_admin_login))
        .route("/logout", web::post().to(handle_admin_logout));
}

pub fn config_dashboard(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(show_admin_dashboard))
        .route("/new", web::get().to(show_new_entry_form))
        .route("/edit/{id}", web::get().to(show_edit_entry_form))
        .route("/save_post", web::post().to(save_post_action))
        .route("/delete_post", web::post().to(delete_post_action))
        .route("/api/draft", web::post().to(generate_draft_action));
}

fn set_notification(session: &Session, message: &str, r#type: &str) {
    session
        .insert("notification", &Notification { message: message.to_string(), r#type: r#type.to_string() })
        .unwrap();
}

async fn show_admin_login_form(
    session: Session,
    tera: web::Data<Tera>,
    token: CsrfToken,
) -> impl Responder {
    // Already authenticated sessions have no business on the login page.
    if crate::middleware::admin_guard(&session) {
        return HttpResponse::Found().append_header(("location", DASHBOARD_URL)).finish();
    }

    let mut ctx = Context::new();
    ctx.insert("logged_in", &false);
    ctx.insert("csrf_token", token.get());

    if let Some(error) = session.get::<String>("error").unwrap() {
        ctx.insert("error", &error);
        session.remove("error");
    }

    match tera.render("admin/login.html", &ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error: {}", err);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

async fn handle_admin_login(
    session: Session,
    app_state: web::Data<AppState>,
    form: Csrf<web::Form<LoginForm>>,
) -> impl Responder {
    let login_data = form.into_inner();

    if app_state.credentials.verify(&login_data.username, &login_data.password) {
        session.insert("username", login_data.username.clone()).unwrap();
        session.insert("is_authenticated", true).unwrap();
        session.remove("error");
        HttpResponse::Found().append_header(("location", DASHBOARD_URL)).finish()
    } else {
        // Failed attempts leave the session anonymous; no lockout, no counting.
        session.insert("error", "Invalid credentials.").unwrap();
        HttpResponse::Found().append_header(("location", LOGIN_URL)).finish()
    }
}

async fn handle_admin_logout(session: Session) -> impl Responder {
    session.purge();
    HttpResponse::Found().append_header(("location", LOGIN_URL)).finish()
}

async fn show_admin_dashboard(
    auth_user: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    db: web::Data<Database>,
) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("logged_in", &true);
    ctx.insert("user", &auth_user);

    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }

    match public_helpers::fetch_feed(&db) {
        Ok(posts) => ctx.insert("posts", &posts),
        Err(e) => {
            log::error!("Failed to fetch posts for the dashboard: {}", e);
            return HttpResponse::InternalServerError().body("Error loading posts.");
        }
    }

    match tera.render("admin/dashboard.html", &ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error: {}", err);
            HttpResponse::InternalServerError().body("Error rendering admin dashboard.")
        }
    }
}

async fn show_new_entry_form(tera: web::Data<Tera>) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("logged_in", &true);
    ctx.insert("is_new", &true);
    ctx.insert("post", &json!({
        "id": "",
        "title": "",
        "excerpt": "",
        "content": "",
        "date": admin_helpers::today_iso(),
        "imageUrl": admin_helpers::DEFAULT_IMAGE_URL,
        "author": admin_helpers::DEFAULT_AUTHOR,
        "tags": [],
    }));

    render_editor(&tera, &ctx)
}

async fn show_edit_entry_form(
    id: web::Path<String>,
    session: Session,
    tera: web::Data<Tera>,
    db: web::Data<Database>,
) -> impl Responder {
    let post = match public_helpers::fetch_post_by_id(&id, &db) {
        Ok(Some(post)) => post,
        Ok(None) => {
            set_notification(&session, "Entry not found.", "error");
            return HttpResponse::Found().append_header(("location", DASHBOARD_URL)).finish();
        }
        Err(e) => {
            log::error!("Failed to load post '{}' for editing: {}", id, e);
            return HttpResponse::InternalServerError().body("Error loading the entry.");
        }
    };

    let mut ctx = Context::new();
    ctx.insert("logged_in", &true);
    ctx.insert("is_new", &false);
    ctx.insert("post", &post);

    render_editor(&tera, &ctx)
}

fn render_editor(tera: &Tera, ctx: &Context) -> HttpResponse {
    match tera.render("admin/editor.html", ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error: {}", err);
            HttpResponse::InternalServerError().body("Error rendering the editor.")
        }
    }
}

async fn save_post_action(
    session: Session,
    db: web::Data<Database>,
    form: web::Bytes,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let post = match admin_helpers::post_from_form(&parsed) {
        Some(post) => post,
        None => {
            set_notification(&session, "A title is required.", "error");
            return HttpResponse::Found().append_header(("location", "/admin/new")).finish();
        }
    };

    match admin_helpers::save_entry(&db, &post) {
        Ok(_) => set_notification(&session, "Entry published.", "success"),
        Err(e) => {
            log::error!("Failed to save entry '{}': {}", post.id, e);
            set_notification(&session, "Failed to save the entry.", "error");
        }
    }
    HttpResponse::Found().append_header(("location", DASHBOARD_URL)).finish()
}

async fn delete_post_action(
    session: Session,
    db: web::Data<Database>,
    form: web::Bytes,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let post_id = parsed.get("post_id").cloned().unwrap_or_default();

    // Deleting an unknown id is a silent no-op in the store.
    match admin_helpers::delete_entry(&db, &post_id) {
        Ok(_) => set_notification(&session, "Entry deleted.", "success"),
        Err(e) => {
            log::error!("Failed to delete entry '{}': {}", post_id, e);
            set_notification(&session, "Failed to delete the entry.", "error");
        }
    }
    HttpResponse::Found().append_header(("location", DASHBOARD_URL)).finish()
}

async fn generate_draft_action(
    app_state: web::Data<AppState>,
    payload: web::Json<DraftRequest>,
) -> impl Responder {
    let request = payload.into_inner();

    if request.title.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "A title is required before generating a draft." }));
    }

    let notes = if request.notes.trim().is_empty() {
        "A generic tech event update".to_string()
    } else {
        request.notes
    };

    match app_state.draft_client.generate_draft(&request.title, &notes).await {
        Ok(draft) => HttpResponse::Ok().json(json!({
            "success": true,
            "excerpt": draft.excerpt,
            "content": draft.content,
        })),
        Err(e) => {
            log::error!("Draft generation failed: {}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "Failed to generate draft." }))
        }
    }
}
