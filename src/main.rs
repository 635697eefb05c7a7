use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware::{Logger, DefaultHeaders}, cookie::Key};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_csrf::CsrfMiddleware;
use tera::Tera;
use devlog_backend::{
    auth::FixedCredentials,
    config::Config,
    draft::DraftClient,
    middleware::RequireAdmin,
    models::db_operations::posts_db_operations,
    routes,
    AppState,
};
use redb::Database;
use std::fs;
use std::sync::Arc;
use clap::Parser;
use std::path::PathBuf;
use rand::prelude::StdRng;
use std::convert::TryFrom;

#[derive(Parser, Debug)]
#[command(name = "devlog_server", author, version, about = "Starts the DevLog web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = Tera::new("templates/**/*.html").expect("Tera initialization failed");

    let db_path = config.posts_db_path();
    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Failed to create database directory");
    }

    // First run seeds the fixed two-entry collection; existing data is
    // never touched.
    let db = Database::create(&db_path)
        .expect("FATAL: could not open the posts database.");
    posts_db_operations::initialize_store(&db)
        .expect("FATAL: could not seed the posts store.");
    let db_data = web::Data::new(db);

    let draft_client = DraftClient::new(&config.gemini_api_url, &config.gemini_api_key)
        .expect("FATAL: GEMINI_API_URL is not a valid URL.");

    let app_state = web::Data::new(AppState {
        credentials: Arc::new(FixedCredentials::from_config(&config)),
        draft_client,
    });

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    println!("🚀 DevLog server starting at http://{}", server_address);

    HttpServer::new(move || {
        // A non-persistent cookie scopes the admin session to the
        // browser session, like the original's sessionStorage record.
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
            .cookie_name("devlog_user".to_string())
            .cookie_secure(config.use_secure_cookies)
            .cookie_http_only(true)
            .cookie_same_site(actix_web::cookie::SameSite::Lax)
            .build();

        let cors = {
            let allowed_origins_str = &config.allowed_origins;
            if allowed_origins_str.trim() == "*" {
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST"])
                    .allowed_headers(vec![actix_web::http::header::ACCEPT, actix_web::http::header::CONTENT_TYPE])
                    .supports_credentials()
                    .max_age(3600)
            } else {
                let mut cors = Cors::default();
                let origins: Vec<&str> = allowed_origins_str.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
                for origin in origins {
                    cors = cors.allowed_origin(origin);
                }
                cors.allowed_methods(vec!["GET", "POST"])
                    .allowed_headers(vec![actix_web::http::header::ACCEPT, actix_web::http::header::CONTENT_TYPE])
                    .supports_credentials()
                    .max_age(3600)
            }
        };

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block"))
            )
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(tera.clone()))
            .app_data(db_data.clone())
            .app_data(app_state.clone())

            .service(actix_files::Files::new("/static", "./static"))

            // Every page shares the session so the layout can reflect
            // the login state; only the admin scope is gated.
            .service(
                web::scope("")
                    .wrap(session_mw)
                    .configure(routes::public::config_api)
                    .configure(routes::public::config_pages)
                    .service(
                        web::scope("/admin")
                            .wrap(
                                CsrfMiddleware::<StdRng>::new()
                                    .set_cookie(actix_web::http::Method::GET, "/admin/login")
                            )
                            .configure(routes::admin::config_login)
                            .service(
                                web::scope("")
                                    .wrap(RequireAdmin)
                                    .configure(routes::admin::config_dashboard)
                            )
                    )
            )
    })
    .bind(server_address)?
    .run()
    .await
}
