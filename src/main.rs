use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};

use handy2go::{build_state, config::Config, routes, tracking};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = Config::from_env();
    let state = build_state(&config)?;
    if !config.seed_demo {
        log::warn!("SEED_DEMO disabled; starting with an empty marketplace");
    }

    actix_web::rt::spawn(tracking::run(state.clone(), config.tracking_tick));

    let address = config.address();
    log::info!("Starting Handy2Go on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
