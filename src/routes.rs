use crate::database::{MovieDb, MovieStore};
use crate::error::ApiError;
use crate::schema::{validate_movie, validate_partial_movie};
use actix_cors::Cors;
use actix_web::{
    guard::{self, GuardContext},
    http::header,
    middleware::DefaultHeaders,
    web, HttpRequest, HttpResponse,
};
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

type Movies = web::Data<MovieStore>;
type Body = web::Json<Value>;

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS, DELETE";

#[derive(Deserialize)]
struct ListParams {
    genre: Option<String>,
}

async fn list_movies(
    params: web::Query<ListParams>,
    movies: Movies,
) -> Result<HttpResponse, ApiError> {
    let genre = params.genre.as_deref().filter(|genre| !genre.is_empty());
    Ok(HttpResponse::Ok().json(movies.list(genre)?))
}

async fn get_movie(id: web::Path<String>, movies: Movies) -> Result<HttpResponse, ApiError> {
    let movie = movies.find(&id)?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(movie))
}

async fn movie_options() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Methods", ALLOWED_METHODS))
        .finish()
}

async fn create_movie(body: Body, movies: Movies) -> Result<HttpResponse, ApiError> {
    let movie = validate_movie(&body).map_err(|errors| {
        debug!("rejected new movie: {:?}", errors);
        ApiError::Validation(errors)
    })?;
    let movie = movies.insert(movie)?;
    Ok(HttpResponse::Created().json(movie))
}

async fn delete_movie(id: web::Path<String>, movies: Movies) -> Result<HttpResponse, ApiError> {
    if !movies.remove(&id)? {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Movie deleted" })))
}

async fn update_movie(
    id: web::Path<String>,
    body: Body,
    movies: Movies,
) -> Result<HttpResponse, ApiError> {
    // Fail closed: an invalid patch never reaches the lookup.
    let patch = validate_partial_movie(&body).map_err(|errors| {
        debug!("rejected patch for {}: {:?}", id, errors);
        ApiError::Validation(errors)
    })?;
    let movie = movies.replace(&id, patch)?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(movie))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req: &HttpRequest| ApiError::MalformedBody(err.to_string()).into())
}

/// Answers preflight requests on every route: any origin, method and header.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allow_any_method()
        .allow_any_header()
}

/// Adds the wildcard CORS origin to every response, including those to
/// requests that carry no `Origin` header.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*"))
}

fn is_preflight(ctx: &GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Plain `OPTIONS /movies/{id}` is answered by `movie_options`; preflights and
/// every other request go through the CORS middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::resource("/movies/{id}")
                .guard(guard::Options())
                .guard(guard::fn_guard(|ctx| !is_preflight(ctx)))
                .route(web::route().to(movie_options)),
        )
        .service(
            web::scope("")
                .wrap(cors())
                .route("/movies", web::get().to(list_movies))
                .route("/movies", web::post().to(create_movie))
                .route("/movies/{id}", web::get().to(get_movie))
                .route("/movies/{id}", web::delete().to(delete_movie))
                .route("/movies/{id}", web::patch().to(update_movie)),
        );
}
