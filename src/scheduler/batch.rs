use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::interval;

use crate::error::StoreError;
use crate::state::TenantState;

/// Periodic batch evaluator: every tick, re-check every subscribed chat of
/// the tenant. A run joins all its per-chat tasks before the next tick fires.
pub async fn run_batch(state: Arc<TenantState>, mut shutdown: watch::Receiver<bool>) {
    log::info!("{}: batch scheduler started ({:?} tick)", state.name, state.tick);
    let mut ticker = interval(state.tick);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = run_batch_once(&state).await {
                    log::error!("{}: batch run failed: {}", state.name, e);
                }
            }
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    log::info!("{}: batch scheduler shutting down", state.name);
                    break;
                }
            }
        }
    }
}

/// One batch run: load the day's timetable once, fan the dispatcher out
/// concurrently across chats, and isolate per-chat failures.
pub async fn run_batch_once(state: &Arc<TenantState>) -> Result<(), StoreError> {
    let now = state.clock.now(state.tz);
    let day = match state.schedule.prayer_day(now.date_naive()) {
        Ok(day) => Arc::new(day),
        Err(StoreError::NotFound(what)) => {
            log::warn!("{}: {}; skipping tick", state.name, what);
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let chats = state.chats.subscribed_chats().await?;

    let mut tasks = JoinSet::new();
    for chat in chats {
        let dispatcher = state.dispatcher.clone();
        let day = day.clone();
        tasks.spawn(async move {
            let result = dispatcher.process(&chat, &day, now).await;
            (chat.id, result)
        });
    }

    // one chat's failure never aborts the rest of the batch
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((chat_id, Err(e))) => log::error!("chat {}: processing failed: {}", chat_id, e),
            Ok((_, Ok(()))) => {}
            Err(e) => log::error!("chat task panicked: {}", e),
        }
    }
    Ok(())
}
