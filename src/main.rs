use std::net::TcpListener;
use blog_auth::auth::TokenAuthenticator;
use blog_auth::configuration::get_configuration;
use blog_auth::startup::run;
use blog_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(accounts = config.accounts.len(), "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // A missing signing secret is fatal before any request is served.
    let authenticator = TokenAuthenticator::new(&configuration.jwt.secret).map_err(|e| {
        tracing::error!("Failed to initialise token authenticator: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, configuration, authenticator)?;
    server.await
}
