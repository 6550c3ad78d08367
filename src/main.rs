mod config;
mod database;
mod error;
mod model;
mod routes;
mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use database::*;
use log::{debug, info};
use std::io;
use std::net::SocketAddr;

fn startup_error<E: std::fmt::Display>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

fn listening_on(addrs: &[SocketAddr]) -> String {
    let urls = addrs
        .iter()
        .map(|addr| format!("http://{}", addr))
        .collect::<Vec<_>>();
    format!("listening on {}", urls.join(", "))
}

fn load_movies(config: &Config) -> Result<MovieStore, StoreError> {
    match &config.seed_path {
        Some(path) => {
            debug!("loading movies from {}", path.display());
            MovieStore::from_seed_file(path)
        }
        None => MovieStore::from_seed_str(BUNDLED_SEED),
    }
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("movies_api=info,actix_web=info"),
    )
    .init();

    let config = Config::from_env().map_err(startup_error)?;
    let movies = web::Data::new(load_movies(&config).map_err(startup_error)?);
    debug!("{} movies loaded", movies.len().map_err(startup_error)?);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(routes::cors_headers())
            .app_data(movies.clone())
            .configure(routes::configure)
    })
    .bind(config.bind_addr())?;

    info!("{}", listening_on(&server.addrs()));
    server.run().await
}
