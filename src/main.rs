use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::watch;

use crate::commands::Command;
use crate::config::Strategy;
use crate::handlers::command_handler;
use crate::state::TenantState;

mod types;
mod commands;
mod handlers;
mod error;
mod state;
mod clock;
mod config;
mod store;
mod texts;
mod messenger;
mod trigger;
mod dispatch;
mod scheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting prayer reminder bot...");

    let tenants = config::load_tenants(Path::new("tenants.json"))?;
    log::info!("Loaded {} tenant(s)", tenants.len());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut workers = Vec::new();

    for cfg in &tenants {
        // a tenant that cannot start is skipped; the others continue
        let (state, bot) = match TenantState::build(cfg).await {
            Ok(built) => built,
            Err(e) => {
                log::error!("tenant {}: failed to start: {}", cfg.name, e);
                continue;
            }
        };
        log::info!("tenant {}: started ({:?} strategy)", cfg.name, cfg.strategy);

        match cfg.strategy {
            Strategy::Batch => {
                workers.push(tokio::spawn(scheduler::run_batch(
                    state.clone(),
                    shutdown_rx.clone(),
                )));
            }
            Strategy::Continuous => {
                workers.push(tokio::spawn(scheduler::run_prayer_loop(
                    state.clone(),
                    shutdown_rx.clone(),
                )));
                workers.push(tokio::spawn(scheduler::run_weekly_loop(
                    state.clone(),
                    shutdown_rx.clone(),
                )));
            }
        }

        let handler = dptree::entry().branch(
            Update::filter_message().filter_command::<Command>().endpoint(
                |bot: Bot, msg: Message, cmd: Command, state: Arc<TenantState>| async move {
                    command_handler(bot, msg, cmd, state).await
                },
            ),
        );

        let deps = state.clone();
        workers.push(tokio::spawn(async move {
            Dispatcher::builder(bot, handler)
                .dependencies(dptree::deps![deps])
                .enable_ctrlc_handler()
                .build()
                .dispatch()
                .await;
        }));
    }

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down...");
    let _ = shutdown_tx.send(true);

    // let in-flight sends finish rather than aborting them
    for worker in workers {
        let _ = worker.await;
    }
    Ok(())
}
