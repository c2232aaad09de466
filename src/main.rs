use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use fleet_ops::build_app;
use fleet_ops::config::{DatabaseConfig, EnvironmentConfig, StorageBackend};
use fleet_ops::database::DatabaseConnection;
use fleet_ops::repositories::Repositories;
use fleet_ops::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    info!("🚚 Fleet Ops - API de operaciones de flota");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    let repositories = match config.storage {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let connection = DatabaseConnection::connect(&db_config).await?;
            connection.run_migrations().await?;
            info!("✅ Base de datos lista");
            Repositories::postgres(connection.pool().clone())
        }
        StorageBackend::Memory => {
            if config.is_production() {
                warn!("⚠️  STORAGE_BACKEND=memory en producción: los datos no se persisten");
            }
            info!("🧠 Usando store en memoria");
            Repositories::in_memory()
        }
    };

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .context("HOST/PORT do not form a valid socket address")?;
    let app = build_app(AppState::new(config, repositories));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("🚗 /api/v1/vehicles  GET, POST | /:id GET, PUT");
    info!("🧑‍✈️ /api/v1/drivers   GET, POST | /:id GET, PUT | /:id/complaint POST");
    info!("🗺️  /api/v1/trips     GET, POST | /:id/dispatch, /:id/complete, /:id/cancel POST");
    info!("💶 /api/v1/expenses  GET, POST");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Error abriendo el puerto {}", addr))?;

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
