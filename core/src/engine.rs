//! The desk engine — single writer over the ticket book.
//!
//! TICK ORDER (fixed):
//!   1. Advance the clock with one wall-clock sample.
//!   2. Apply queued commands in submission order.
//!   3. Recompute the SLA reading of every active ticket and record
//!      label transitions.
//!   4. Snapshot every `snapshot_interval_ticks` ticks.
//!
//! RULES:
//!   - Only the engine holds `&mut TicketBook`.
//!   - Every applied or rejected command is recorded in the event log.
//!   - The SLA recompute never mutates a ticket.

use crate::{
    clock::DeskClock,
    command::{DeskCommand, QueuedCommand},
    config::DeskConfig,
    error::{DeskError, DeskResult},
    event::{DeskEvent, EventLogEntry},
    notification::{LogSink, NotificationSink},
    selectors::{self, SlaBoard},
    sla::{SlaReading, SlaStatus},
    snapshot::DeskSnapshot,
    store::DeskStore,
    ticket::Ticket,
    ticket_book::TicketBook,
    types::{SessionId, Tick, TicketId, Timestamp},
};
use std::collections::{HashMap, VecDeque};

pub struct DeskEngine {
    pub session_id: SessionId,
    pub clock:      DeskClock,
    config:         DeskConfig,
    book:           TicketBook,
    store:          DeskStore,
    sink:           Box<dyn NotificationSink>,
    queue:          VecDeque<QueuedCommand>,
    last_status:    HashMap<TicketId, SlaStatus>,
}

impl DeskEngine {
    pub fn new(
        session_id: SessionId,
        config: DeskConfig,
        store: DeskStore,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        Self {
            clock: DeskClock::new(session_id.clone(), config.tick_period_secs),
            session_id,
            config,
            book: TicketBook::new(),
            store,
            sink,
            queue: VecDeque::new(),
            last_status: HashMap::new(),
        }
    }

    /// Register the session, load the initial tickets and log both.
    pub fn build(
        session_id: SessionId,
        config: DeskConfig,
        store: DeskStore,
        sink: Box<dyn NotificationSink>,
        tickets: Vec<Ticket>,
        started_at: Timestamp,
    ) -> DeskResult<Self> {
        let mut engine = Self::new(session_id, config, store, sink);
        engine.register_session(started_at)?;
        engine.load_tickets(tickets)?;
        engine.record(
            "engine",
            &[DeskEvent::SessionInitialized {
                session_id: engine.session_id.clone(),
                tickets:    engine.book.len(),
            }],
        )?;
        Ok(engine)
    }

    /// In-memory store, default config, log sink, no tickets.
    pub fn build_test(session_id: SessionId) -> DeskResult<Self> {
        let store = DeskStore::in_memory()?;
        store.migrate()?;
        Self::build(
            session_id,
            DeskConfig::default_test(),
            store,
            Box::new(LogSink),
            Vec::new(),
            chrono::Utc::now(),
        )
    }

    /// Resume a session: clock from the latest snapshot, tickets from the
    /// ticket table (the snapshot's copy only when the table is empty).
    pub fn resume(
        session_id: SessionId,
        config: DeskConfig,
        store: DeskStore,
        sink: Box<dyn NotificationSink>,
    ) -> DeskResult<Self> {
        let snapshot = match store.latest_snapshot(&session_id)? {
            Some((_, json)) => Some(serde_json::from_str::<DeskSnapshot>(&json)?),
            None => None,
        };
        let mut engine = Self::new(session_id, config, store, sink);
        engine.register_session(chrono::Utc::now())?;
        // The ticket table is written on every applied command, so it is
        // never older than the snapshot.
        let stored = engine.store.load_tickets()?;
        match snapshot {
            Some(snap) => {
                log::info!("resuming session {} at tick {}", snap.session_id, snap.tick);
                engine.clock = snap.clock;
                let tickets = if stored.is_empty() { snap.tickets } else { stored };
                engine.book = TicketBook::from_tickets(tickets)?;
            }
            None => {
                log::info!("no snapshot for session {}; loading ticket table", engine.session_id);
                engine.book = TicketBook::from_tickets(stored)?;
            }
        }
        Ok(engine)
    }

    fn register_session(&self, started_at: Timestamp) -> DeskResult<()> {
        if !self.store.session_exists(&self.session_id)? {
            self.store.insert_session(
                &self.session_id,
                env!("CARGO_PKG_VERSION"),
                self.clock.period_secs,
                &started_at.to_rfc3339(),
            )?;
        }
        Ok(())
    }

    /// Add tickets to the book and mirror them to the store.
    pub fn load_tickets(&mut self, tickets: Vec<Ticket>) -> DeskResult<()> {
        let mut events = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let loaded = DeskEvent::TicketLoaded {
                ticket_id:    ticket.id.clone(),
                sla_deadline: ticket.sla_deadline,
            };
            let id = ticket.id.clone();
            self.book.insert(ticket)?;
            if let Some(stored) = self.book.get(&id) {
                self.store.upsert_ticket(stored)?;
            }
            events.push(loaded);
        }
        self.record("engine", &events)
    }

    // ── Commands ───────────────────────────────────────────────

    /// Queue a command for the next tick. Returns its command id.
    pub fn submit(&mut self, command: DeskCommand) -> String {
        let command_id = new_command_id();
        self.queue.push_back(QueuedCommand {
            session_id: self.session_id.clone(),
            queued_at:  self.clock.current_tick,
            command_id: command_id.clone(),
            command,
        });
        command_id
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Apply a command now. Rejections are logged and returned as errors;
    /// the ticket is left untouched.
    pub fn execute(&mut self, command: DeskCommand, now: Timestamp) -> DeskResult<Vec<DeskEvent>> {
        let command_id = new_command_id();
        self.apply(&command_id, command, now)
    }

    fn apply(&mut self, command_id: &str, command: DeskCommand, now: Timestamp) -> DeskResult<Vec<DeskEvent>> {
        match self.apply_inner(&command, now) {
            Ok(events) => {
                log::info!(
                    "applied {} on {} ({command_id})",
                    command.command_type(),
                    command.ticket_id()
                );
                Ok(events)
            }
            Err(e) if e.is_rejection() => {
                log::warn!(
                    "rejected {} on {} ({command_id}): {e}",
                    command.command_type(),
                    command.ticket_id()
                );
                self.record("tracker", &[rejection_event(command_id, &command, &e)])?;
                Err(e)
            }
            Err(e) => {
                log::error!(
                    "failed {} on {} ({command_id}): {e}",
                    command.command_type(),
                    command.ticket_id()
                );
                Err(e)
            }
        }
    }

    /// Stage the change on a copy, write the row and its event in one
    /// transaction, then commit the copy to the book.
    fn apply_inner(&mut self, command: &DeskCommand, now: Timestamp) -> DeskResult<Vec<DeskEvent>> {
        let (staged, event) = match command {
            DeskCommand::Escalate { ticket_id, level, reason } => {
                let staged = self.book.stage_escalation(
                    ticket_id,
                    *level,
                    reason,
                    now,
                    &self.config.escalation,
                    &self.config.thresholds,
                )?;
                let event = DeskEvent::TicketEscalated {
                    ticket_id: staged.id.clone(),
                    level:     *level,
                    reason:    reason.trim().to_string(),
                    at:        now,
                };
                (staged, event)
            }
            DeskCommand::Notify { ticket_id, message } => {
                let notification = self.book.notify(ticket_id, message, now)?;
                self.sink.dispatch(&notification)?;
                let events = vec![DeskEvent::NotificationDispatched {
                    notification_id: notification.notification_id,
                    ticket_id:       notification.ticket_id,
                    at:              now,
                }];
                self.record("tracker", &events)?;
                return Ok(events);
            }
            DeskCommand::Update { ticket_id, notes } => {
                let staged = self.book.stage_update(ticket_id, notes, now)?;
                let event = DeskEvent::TicketUpdated {
                    ticket_id: staged.id.clone(),
                    at:        now,
                };
                (staged, event)
            }
            DeskCommand::Resolve { ticket_id, notes } => {
                let staged = self.book.stage_resolution(ticket_id, notes, now)?;
                let event = DeskEvent::TicketResolved {
                    ticket_id: staged.id.clone(),
                    at:        now,
                };
                (staged, event)
            }
        };

        let events = vec![event];
        self.store.in_transaction(|| {
            self.store.upsert_ticket(&staged)?;
            self.record("tracker", &events)
        })?;

        if !staged.is_active() {
            self.last_status.remove(&staged.id);
        }
        self.book.commit(staged)?;
        Ok(events)
    }

    // ── Tick ───────────────────────────────────────────────────

    /// Advance one tick with a fresh wall-clock sample.
    pub fn tick(&mut self, sampled: Timestamp) -> DeskResult<Vec<DeskEvent>> {
        let tick = self.clock.advance(sampled);
        let now = self.clock.now.unwrap_or(sampled);

        let started = DeskEvent::TickStarted { tick, now };
        self.record("engine", std::slice::from_ref(&started))?;
        let mut tick_events = vec![started];

        // Queued commands, in submission order.
        while let Some(queued) = self.queue.pop_front() {
            match self.apply(&queued.command_id, queued.command.clone(), now) {
                Ok(events) => tick_events.extend(events),
                Err(e) if e.is_rejection() => {
                    tick_events.push(rejection_event(&queued.command_id, &queued.command, &e));
                }
                Err(e) => {
                    // Not applied; retried on the next tick.
                    self.queue.push_front(queued);
                    return Err(e);
                }
            }
        }

        let changes = self.recompute_statuses(tick, now);
        self.record("sla_clock", &changes)?;
        tick_events.extend(changes);

        let completed = DeskEvent::TickCompleted { tick };
        self.record("engine", std::slice::from_ref(&completed))?;
        tick_events.push(completed);

        let interval = self.config.snapshot_interval_ticks;
        if interval > 0 && tick % interval == 0 {
            self.take_snapshot(tick)?;
        }

        let summary = selectors::board(self.book.as_slice(), now, &self.config).summary;
        log::debug!(
            "tick={tick} active={} escalated={} overdue={} near={} compliance={}%",
            summary.active,
            summary.escalated,
            summary.overdue,
            summary.near_deadline,
            summary.compliance_pct,
        );

        Ok(tick_events)
    }

    /// Run `n` ticks, `period_secs` apart, starting one period after `start`.
    /// Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64, start: Timestamp) -> DeskResult<()> {
        let step = chrono::Duration::seconds(self.clock.period_secs as i64);
        let mut at = start;
        for _ in 0..n {
            at += step;
            self.tick(at)?;
        }
        Ok(())
    }

    fn recompute_statuses(&mut self, tick: Tick, now: Timestamp) -> Vec<DeskEvent> {
        let mut changes = Vec::new();
        for ticket in self.book.as_slice().iter().filter(|t| t.is_active()) {
            let reading = SlaReading::of(ticket, now, &self.config.thresholds);
            let previous = self.last_status.insert(ticket.id.clone(), reading.status);
            if let Some(from) = previous {
                if from != reading.status {
                    changes.push(DeskEvent::SlaStatusChanged {
                        tick,
                        ticket_id: ticket.id.clone(),
                        from,
                        to: reading.status,
                        progress: reading.progress,
                    });
                }
            }
        }
        changes
    }

    // ── Read side ──────────────────────────────────────────────

    /// The SLA board at the last sampled instant (or at `now` before the first tick).
    pub fn board(&self) -> SlaBoard {
        let now = self.clock.now.unwrap_or_else(chrono::Utc::now);
        self.board_at(now)
    }

    pub fn board_at(&self, now: Timestamp) -> SlaBoard {
        selectors::board(self.book.as_slice(), now, &self.config)
    }

    pub fn book(&self) -> &TicketBook {
        &self.book
    }

    pub fn ticket(&self, id: &str) -> Option<&Ticket> {
        self.book.get(id)
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn store(&self) -> &DeskStore {
        &self.store
    }

    /// Query events for a specific tick from the store.
    pub fn store_events_for_tick(&self, tick: Tick) -> DeskResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(&self.session_id, tick)
    }

    pub fn snapshot(&self) -> DeskSnapshot {
        DeskSnapshot {
            session_id: self.session_id.clone(),
            tick:       self.clock.current_tick,
            clock:      self.clock.clone(),
            tickets:    self.book.as_slice().to_vec(),
        }
    }

    fn take_snapshot(&self, tick: Tick) -> DeskResult<()> {
        let json = serde_json::to_string(&self.snapshot())?;
        self.store.save_snapshot(&self.session_id, tick, &json)?;
        log::debug!("Snapshot saved at tick {tick}");
        Ok(())
    }

    fn record(&self, source: &str, events: &[DeskEvent]) -> DeskResult<()> {
        for event in events {
            let entry = EventLogEntry {
                id:         None,
                session_id: self.session_id.clone(),
                tick:       self.clock.current_tick,
                source:     source.to_string(),
                event_type: event_type_name(event).to_string(),
                payload:    serde_json::to_string(event)?,
            };
            self.store.append_event(&entry)?;
        }
        Ok(())
    }
}

fn new_command_id() -> String {
    format!("cmd-{}", uuid::Uuid::new_v4().simple())
}

fn rejection_event(command_id: &str, command: &DeskCommand, err: &DeskError) -> DeskEvent {
    DeskEvent::CommandRejected {
        command_id: command_id.to_string(),
        ticket_id:  command.ticket_id().to_string(),
        reason:     err.to_string(),
    }
}

/// Extract a stable string name from a DeskEvent variant.
/// Used for the event_type column in event_log.
fn event_type_name(event: &DeskEvent) -> &'static str {
    match event {
        DeskEvent::SessionInitialized { .. }     => "session_initialized",
        DeskEvent::TickStarted { .. }            => "tick_started",
        DeskEvent::TickCompleted { .. }          => "tick_completed",
        DeskEvent::TicketLoaded { .. }           => "ticket_loaded",
        DeskEvent::TicketEscalated { .. }        => "ticket_escalated",
        DeskEvent::NotificationDispatched { .. } => "notification_dispatched",
        DeskEvent::TicketUpdated { .. }          => "ticket_updated",
        DeskEvent::TicketResolved { .. }         => "ticket_resolved",
        DeskEvent::CommandRejected { .. }        => "command_rejected",
        DeskEvent::SlaStatusChanged { .. }       => "sla_status_changed",
    }
}
