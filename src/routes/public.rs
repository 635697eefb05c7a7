use crate::helper::{public_helpers, sanitization_helpers};
use crate::middleware::admin_guard;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use redb::Database;
use tera::{Context, Tera};

pub fn config_pages(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(show_home_page))
        .route("/post/{id}", web::get().to(show_post_page));
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/is_server_active", web::get().to(is_server_active))
            .route("/posts/latest", web::get().to(get_latest_posts))
            .route("/posts/{id}/adjacent", web::get().to(get_adjacent_posts))
            .route("/posts/{id}", web::get().to(get_post_by_id)),
    );
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

async fn show_home_page(
    session: Session,
    tera: web::Data<Tera>,
    db: web::Data<Database>,
) -> impl Responder {
    let posts = match public_helpers::fetch_feed(&db) {
        Ok(posts) => posts,
        Err(e) => {
            log::error!("Failed to load the feed: {}", e);
            return HttpResponse::InternalServerError().body("Error loading posts.");
        }
    };

    let mut ctx = Context::new();
    ctx.insert("logged_in", &admin_guard(&session));
    ctx.insert("posts", &posts);

    match tera.render("home.html", &ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error: {}", err);
            HttpResponse::InternalServerError().body("Error rendering the feed.")
        }
    }
}

async fn show_post_page(
    id: web::Path<String>,
    session: Session,
    tera: web::Data<Tera>,
    db: web::Data<Database>,
) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("logged_in", &admin_guard(&session));

    match public_helpers::fetch_post_by_id(&id, &db) {
        Ok(Some(post)) => {
            // Neighbors come from list position, not from the date field.
            match public_helpers::fetch_adjacent_posts(&id, &db) {
                Ok(adjacent) => {
                    ctx.insert("newer", &adjacent.newer);
                    ctx.insert("older", &adjacent.older);
                }
                Err(e) => {
                    log::error!("Failed to load adjacent posts for '{}': {}", id, e);
                }
            }
            ctx.insert("content_html", &sanitization_helpers::render_markdown(&post.content));
            ctx.insert("post", &post);
        }
        Ok(None) => {
            // Absence is a page state, not an error.
        }
        Err(e) => {
            log::error!("Failed to load post '{}': {}", id, e);
            return HttpResponse::InternalServerError().body("Error loading the post.");
        }
    }

    match tera.render("post.html", &ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error: {}", err);
            HttpResponse::InternalServerError().body("Error rendering the post.")
        }
    }
}

async fn get_latest_posts(db: web::Data<Database>) -> impl Responder {
    match public_helpers::fetch_feed(&db) {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(e) => {
            log::error!("Failed to fetch posts: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn get_post_by_id(id: web::Path<String>, db: web::Data<Database>) -> impl Responder {
    match public_helpers::fetch_post_by_id(&id, &db) {
        Ok(Some(post)) => HttpResponse::Ok().json(post),
        Ok(None) => HttpResponse::NotFound().body("Post not found"),
        Err(e) => {
            log::error!("Failed to fetch post '{}': {}", id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn get_adjacent_posts(id: web::Path<String>, db: web::Data<Database>) -> impl Responder {
    match public_helpers::fetch_adjacent_posts(&id, &db) {
        Ok(adjacent) => HttpResponse::Ok().json(adjacent),
        Err(e) => {
            log::error!("Failed to fetch adjacent posts for '{}': {}", id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
