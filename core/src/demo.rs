//! Demo ticket data: a fixed fixture set and a seeded backlog generator.

use crate::{
    config::DeskConfig,
    name_generator::NameGenerator,
    rng::DeskRng,
    ticket::{EscalationRecord, Priority, Ticket, TicketStatus},
    types::Timestamp,
};
use chrono::{Duration, TimeZone, Utc};

/// Generate `count` tickets created within the 48 hours before `anchor`.
/// Same `(seed, count, anchor)` always yields the same backlog.
pub fn generate_backlog(seed: u64, count: usize, anchor: Timestamp, config: &DeskConfig) -> Vec<Ticket> {
    let mut rng = DeskRng::new(seed);
    (0..count)
        .map(|i| {
            let (category, title) = NameGenerator::ticket_subject(&mut rng);
            let priority = match rng.next_f64() {
                r if r < 0.25 => Priority::High,
                r if r < 0.70 => Priority::Medium,
                _ => Priority::Low,
            };
            let age_minutes = rng.next_u64_below(48 * 60) as i64;
            let created_at = anchor - Duration::minutes(age_minutes);
            let sla_deadline = config.deadline_for(category, priority, created_at);

            let mut status = match rng.next_f64() {
                r if r < 0.10 => TicketStatus::Resolved,
                r if r < 0.35 => TicketStatus::InProgress,
                _ => TicketStatus::Open,
            };
            let mut escalation = None;
            if status != TicketStatus::Resolved && rng.chance(0.08) {
                status = TicketStatus::Escalated;
                escalation = Some(EscalationRecord {
                    level:        1,
                    reason:       "Requester reported business impact".into(),
                    escalated_at: created_at + Duration::minutes(age_minutes / 2),
                });
            }

            Ticket {
                id: format!("TKT-{:03}", i + 1),
                title: title.to_string(),
                description: format!("{title} (reported via portal)"),
                user: NameGenerator::full_name(&mut rng),
                category: category.to_string(),
                priority,
                status,
                created_at,
                sla_deadline,
                assigned_to: NameGenerator::agent(&mut rng).to_string(),
                team: NameGenerator::team_for(category).to_string(),
                escalated: escalation.is_some(),
                escalation,
                resolution_notes: (status == TicketStatus::Resolved)
                    .then(|| "Resolved by support agent".to_string()),
                updated_at: None,
            }
        })
        .collect()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The three tickets of the SLA dashboard walkthrough.
pub fn fixture_tickets() -> Vec<Ticket> {
    vec![
        Ticket {
            id:               "TKT-001".into(),
            title:            "Laptop Screen Flickering".into(),
            description:      "My laptop screen has been flickering intermittently since this morning.".into(),
            user:             "Sarah Johnson".into(),
            category:         "Hardware".into(),
            priority:         Priority::High,
            status:           TicketStatus::Open,
            created_at:       at(2024, 1, 15, 0),
            sla_deadline:     at(2024, 1, 16, 14),
            assigned_to:      "John Smith".into(),
            team:             "Hardware Support".into(),
            escalated:        false,
            escalation:       None,
            resolution_notes: None,
            updated_at:       None,
        },
        Ticket {
            id:               "TKT-002".into(),
            title:            "WiFi Connection Issues".into(),
            description:      "Cannot connect to the office WiFi network from conference room B.".into(),
            user:             "Mike Chen".into(),
            category:         "Network".into(),
            priority:         Priority::Medium,
            status:           TicketStatus::InProgress,
            created_at:       at(2024, 1, 14, 0),
            sla_deadline:     at(2024, 1, 17, 10),
            assigned_to:      "Jane Doe".into(),
            team:             "Network Team".into(),
            escalated:        false,
            escalation:       None,
            resolution_notes: None,
            updated_at:       None,
        },
        Ticket {
            id:               "TKT-004".into(),
            title:            "Email Sync Problems".into(),
            description:      "Outlook is not syncing emails properly since the last update.".into(),
            user:             "Tom Wilson".into(),
            category:         "Email".into(),
            priority:         Priority::Medium,
            status:           TicketStatus::Escalated,
            created_at:       at(2024, 1, 12, 0),
            sla_deadline:     at(2024, 1, 15, 12),
            assigned_to:      "Alice Brown".into(),
            team:             "Software Support".into(),
            escalated:        true,
            escalation:       None,
            resolution_notes: None,
            updated_at:       None,
        },
    ]
}
