use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use proof_ledger::api::{self, AppState};
use proof_ledger::config::Settings;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let settings = Settings::from_env();
    let (host, port) = (settings.host.clone(), settings.port);

    let state = web::Data::new(AppState::new(settings));
    {
        let wallet = state.wallet.lock().expect("mutex poisoned");
        info!("Node wallet address: {}", wallet.public_key);
    }

    println!("⛓️ Starting ledger node at http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
