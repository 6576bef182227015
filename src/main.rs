use multiverse::config::Settings;
use multiverse::fetch::HttpTransport;
use multiverse::server::{Views, router};
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("STARTUP_ERROR {err}");
            std::process::exit(1);
        }
    };
    let transport = match HttpTransport::new(settings.request_timeout()) {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("STARTUP_ERROR {err}");
            std::process::exit(1);
        }
    };

    let views = Views::new(transport, &settings.api_base, settings.page_size());
    let app = router(views);
    let listener = match tokio::net::TcpListener::bind(&settings.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("STARTUP_ERROR cannot bind {}: {err}", settings.bind_addr);
            std::process::exit(1);
        }
    };
    info!(addr = %settings.bind_addr, api = %settings.api_base, page_size = settings.page_size, "multiverse listening");
    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("SERVER_ERROR {err}");
        std::process::exit(1);
    }
}
