use anyhow::Result;
use irisfx::archive::SpecimenStore;
use irisfx::config::{Backend, Config};
use irisfx::console::{parse_command, ConsoleView, Reply, Session, HELP};
use irisfx::dispatch::DispatchOutcome;
use irisfx::logging::{log, log_system, obj, v_str, Domain, Level};
use irisfx::render::TerminalRenderer;
use irisfx::service::retry::{retry_async, RetryConfig};
use irisfx::service::{HttpPredictionService, PredictionService, SimulatedService};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

async fn build_service(cfg: &Config) -> Result<Arc<dyn PredictionService>> {
    match &cfg.backend {
        Backend::Http(url) => {
            let http = HttpPredictionService::new(url.clone(), cfg.request_timeout_ms)?;
            let retry_cfg = RetryConfig {
                max_retries: cfg.health_retries,
                ..Default::default()
            };
            // a backend that is down at startup may still come up later
            match retry_async(&retry_cfg, "health", || http.health()).await {
                Ok(health) => log_system("backend", &format!("{} ({})", health.status, url)),
                Err(err) => log(
                    Level::Warn,
                    Domain::System,
                    "backend_unreachable",
                    obj(&[("url", v_str(url.as_str())), ("error", v_str(&err.to_string()))]),
                ),
            }
            Ok(Arc::new(http))
        }
        Backend::Simulated => {
            log_system("backend", "simulated classifier");
            Ok(Arc::new(SimulatedService::new(cfg.sim_latency_ms)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env()?;
    let service = build_service(&cfg).await?;
    let mut store = SpecimenStore::new(&cfg.sqlite_path)?;
    store.init()?;

    let view = ConsoleView::new(TerminalRenderer::new(std::io::stdout()));
    let mut session = Session::new(service, view, store, cfg.cancel_superseded);
    println!("{}", HELP);
    session.sync();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = parse_command(&line).and_then(|cmd| session.handle(cmd));
        match reply {
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(Reply::Quit) => break,
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Input,
                    "rejected",
                    obj(&[("line", v_str(&line)), ("error", v_str(&err.to_string()))]),
                );
                println!("error: {:#}", err);
            }
        }
    }

    let outcomes = session.finish().await;
    if let Some(DispatchOutcome::Failed(token, reason)) = outcomes.last() {
        println!("last request {} failed: {}", token, reason);
    }
    log_system("shutdown", "console closed");
    Ok(())
}
