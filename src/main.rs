use anyhow::Result;
use chrono::Utc;
use kia_uvo::bootstrap;
use kia_uvo::config::Config;
use kia_uvo::uvo::UvoHttpClient;
use kia_uvo::vehicle::VehicleClient;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let started_at = Utc::now();

    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    kia_uvo::logging::init_logging(&config.logging)?;
    info!("Kia UVO poller starting up");

    let client_config = config.client.clone();
    let components = bootstrap::setup(
        &config,
        |account| {
            let client = UvoHttpClient::new(&client_config, account)?;
            Ok(Box::new(client) as Box<dyn VehicleClient>)
        },
        started_at,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Setup failed: {}", e))?;

    let bootstrap::Components {
        sensors,
        mut service,
        handle,
        ..
    } = components;

    #[cfg(feature = "web")]
    let web_task = if config.web.enabled {
        let state = kia_uvo::web::AppState {
            sensors: sensors.clone(),
            service: handle.clone(),
        };
        let host = config.web.host.clone();
        let port = config.web.port;
        Some(tokio::spawn(async move {
            if let Err(e) = kia_uvo::web::serve(state, &host, port).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };
    #[cfg(not(feature = "web"))]
    let web_task: Option<tokio::task::JoinHandle<()>> = {
        let _ = &sensors;
        None
    };

    let signal_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_handle.shutdown();
        }
    });

    let outcome = service.run().await;

    if let Some(task) = web_task {
        task.abort();
    }

    match outcome {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Refresh loop failed: {}", e);
            Err(anyhow::anyhow!("Refresh loop error: {}", e))
        }
    }
}
