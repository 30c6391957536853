use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use todo_backend::bot::{Conversation, TelegramBot};
use todo_backend::config::{Config, StoreKind};
use todo_backend::routes;
use todo_backend::store::{MemoryStore, MySqlStore, Store};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    let store: Arc<dyn Store> = match config.store {
        StoreKind::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreKind::MySql => {
            let database_url = config.database_url.as_deref().unwrap_or_default();
            let mysql = MySqlStore::connect(database_url, config.max_connections)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            if config.apply_schema {
                mysql
                    .apply_schema()
                    .await
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            }
            Arc::new(mysql)
        }
    };

    match config.telegram_token.as_deref() {
        Some(token) => {
            let conversation = Conversation::new(Arc::clone(&store), config.history_limit);
            let bot = TelegramBot::new(token, conversation);
            actix_web::rt::spawn(bot.start_polling());
        }
        None => info!("TELEGRAM_BOT_TOKEN not set; Telegram bot disabled"),
    }

    let server_address = config.server_address.clone();
    info!("Server running at http://{}", server_address);

    let data = web::Data::from(store);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(routes::routes::configure)
    })
    .bind(server_address)?
    .run()
    .await
}
