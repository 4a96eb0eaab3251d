//! Periodic SLA scheduler.
//!
//! One tokio task owns the engine for the lifetime of a session. It is the
//! only place the engine is touched, so interval ticks and user commands are
//! applied one at a time in arrival order.
//!
//! The task stops when `shutdown()` is called or the handle is dropped.

use crate::{
    clock::DeskClock,
    command::DeskCommand,
    engine::DeskEngine,
    error::{DeskError, DeskResult},
    event::DeskEvent,
    selectors::SlaBoard,
    ticket::Ticket,
    types::Timestamp,
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::MissedTickBehavior,
};

const REQUEST_BUFFER: usize = 64;

/// Where the scheduler samples "now" on each tick.
pub trait NowSource: Send + 'static {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNow;

impl NowSource for SystemNow {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

impl<F> NowSource for F
where
    F: Fn() -> Timestamp + Send + 'static,
{
    fn now(&self) -> Timestamp {
        self()
    }
}

enum Request {
    Execute {
        command: DeskCommand,
        reply:   oneshot::Sender<DeskResult<Vec<DeskEvent>>>,
    },
    Board {
        reply: oneshot::Sender<SlaBoard>,
    },
    Ticket {
        id:    String,
        reply: oneshot::Sender<Option<Ticket>>,
    },
    Clock {
        reply: oneshot::Sender<DeskClock>,
    },
}

pub struct SlaScheduler;

impl SlaScheduler {
    /// Move the engine into a background task ticking every
    /// `engine.clock.period_secs`. Must be called inside a tokio runtime.
    pub fn spawn<N: NowSource>(engine: DeskEngine, now: N) -> SchedulerHandle {
        let (requests, rx) = mpsc::channel(REQUEST_BUFFER);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(engine, now, rx, shutdown_rx));
        SchedulerHandle {
            requests,
            shutdown: Some(shutdown),
            task:     Some(task),
        }
    }
}

async fn run<N: NowSource>(
    mut engine: DeskEngine,
    now: N,
    mut rx: mpsc::Receiver<Request>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> DeskEngine {
    let mut interval = tokio::time::interval(engine.clock.period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    log::info!(
        "scheduler started for session {} every {}s",
        engine.session_id,
        engine.clock.period_secs
    );

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            request = rx.recv() => match request {
                Some(request) => handle(&mut engine, &now, request),
                None => break,
            },
            _ = interval.tick() => {
                if let Err(e) = engine.tick(now.now()) {
                    log::error!("tick {} failed: {e}", engine.clock.current_tick);
                }
            }
        }
    }

    log::info!(
        "scheduler stopped for session {} at tick {}",
        engine.session_id,
        engine.clock.current_tick
    );
    engine
}

fn handle<N: NowSource>(engine: &mut DeskEngine, now: &N, request: Request) {
    // A dropped reply receiver just means the caller stopped waiting.
    match request {
        Request::Execute { command, reply } => {
            let _ = reply.send(engine.execute(command, now.now()));
        }
        Request::Board { reply } => {
            let _ = reply.send(engine.board());
        }
        Request::Ticket { id, reply } => {
            let _ = reply.send(engine.ticket(&id).cloned());
        }
        Request::Clock { reply } => {
            let _ = reply.send(engine.clock.clone());
        }
    }
}

/// Owner's handle on a running scheduler.
pub struct SchedulerHandle {
    requests: mpsc::Sender<Request>,
    shutdown: Option<oneshot::Sender<()>>,
    task:     Option<JoinHandle<DeskEngine>>,
}

impl SchedulerHandle {
    async fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request) -> DeskResult<T> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(build(reply))
            .await
            .map_err(|_| DeskError::SchedulerStopped)?;
        rx.await.map_err(|_| DeskError::SchedulerStopped)
    }

    /// Apply a command between ticks, in arrival order.
    pub async fn execute(&self, command: DeskCommand) -> DeskResult<Vec<DeskEvent>> {
        self.ask(|reply| Request::Execute { command, reply }).await?
    }

    pub async fn board(&self) -> DeskResult<SlaBoard> {
        self.ask(|reply| Request::Board { reply }).await
    }

    pub async fn ticket(&self, id: &str) -> DeskResult<Option<Ticket>> {
        let id = id.to_string();
        self.ask(|reply| Request::Ticket { id, reply }).await
    }

    pub async fn clock(&self) -> DeskResult<DeskClock> {
        self.ask(|reply| Request::Clock { reply }).await
    }

    /// Stop the timer and hand the engine back.
    pub async fn shutdown(mut self) -> DeskResult<DeskEngine> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let task = self.task.take().ok_or(DeskError::SchedulerStopped)?;
        task.await.map_err(|e| {
            log::error!("scheduler task failed: {e}");
            DeskError::SchedulerStopped
        })
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
