use crate::ticket::{Priority, Ticket};
use crate::types::{Tick, Timestamp};
use serde::{Deserialize, Serialize};

/// Progress percentages at which the SLA label changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SlaThresholds {
    pub warning_pct:  f64,
    pub critical_pct: f64,
}

impl Default for SlaThresholds {
    fn default() -> Self {
        Self {
            warning_pct:  60.0,
            critical_pct: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscalationPolicy {
    /// Reject escalations until the ticket has reached the critical threshold.
    /// Off by default: the dashboard only offers the action past that point,
    /// but the tracker accepts any reasoned escalation.
    #[serde(default)]
    pub require_critical: bool,
    pub max_level:        u8,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            require_critical: false,
            max_level:        3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationChannel {
    Email,
    Sms,
    InApp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscalationStep {
    pub level:                u8,
    /// Hours after creation at which this step applies.
    pub time_threshold_hours: u32,
    pub action:               String,
    pub recipients:           Vec<String>,
    pub notification_type:    NotificationChannel,
}

/// One row of the SLA rule table. Supplies deadlines at intake only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlaRule {
    pub id:                String,
    pub name:              String,
    pub category:          String,
    pub priority:          Priority,
    pub response_hours:    u32,
    pub resolution_hours:  u32,
    #[serde(default)]
    pub escalation_levels: Vec<EscalationStep>,
    pub enabled:           bool,
    #[serde(default)]
    pub description:       String,
}

impl SlaRule {
    pub fn matches(&self, category: &str, priority: Priority) -> bool {
        self.enabled && self.priority == priority && self.category.eq_ignore_ascii_case(category)
    }

    /// The escalation step due at `hours_open`, if any.
    pub fn step_due(&self, hours_open: u32) -> Option<&EscalationStep> {
        self.escalation_levels
            .iter()
            .filter(|s| s.time_threshold_hours <= hours_open)
            .max_by_key(|s| s.level)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    pub tick_period_secs:          u64,
    #[serde(default)]
    pub thresholds:                SlaThresholds,
    #[serde(default)]
    pub escalation:                EscalationPolicy,
    pub snapshot_interval_ticks:   Tick,
    pub fallback_resolution_hours: u32,
    #[serde(default)]
    pub sla_rules:                 Vec<SlaRule>,
}

impl DeskConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.thresholds.warning_pct > config.thresholds.critical_pct {
            anyhow::bail!(
                "{path}: warning threshold {} above critical threshold {}",
                config.thresholds.warning_pct,
                config.thresholds.critical_pct
            );
        }
        if config.tick_period_secs == 0 {
            anyhow::bail!("{path}: tick_period_secs must be positive");
        }
        if config.escalation.max_level == 0 {
            anyhow::bail!("{path}: escalation.max_level must be at least 1");
        }
        Ok(config)
    }

    /// First enabled rule for (category, priority), then by priority alone.
    pub fn rule_for(&self, category: &str, priority: Priority) -> Option<&SlaRule> {
        self.sla_rules
            .iter()
            .find(|r| r.matches(category, priority))
            .or_else(|| {
                self.sla_rules
                    .iter()
                    .find(|r| r.enabled && r.priority == priority)
            })
    }

    /// Deadline stamped on a ticket that arrives without one.
    pub fn deadline_for(&self, category: &str, priority: Priority, created_at: Timestamp) -> Timestamp {
        let hours = self
            .rule_for(category, priority)
            .map(|r| r.resolution_hours)
            .unwrap_or(self.fallback_resolution_hours);
        created_at + chrono::Duration::hours(i64::from(hours))
    }

    /// The escalation step of the ticket's rule due at `now`, if any.
    pub fn due_step(&self, ticket: &Ticket, now: Timestamp) -> Option<&EscalationStep> {
        let hours_open = u32::try_from((now - ticket.created_at).num_hours()).ok()?;
        self.rule_for(&ticket.category, ticket.priority)?
            .step_due(hours_open)
    }

    /// In-code defaults used by tests and when no config file is given.
    pub fn default_test() -> Self {
        let rules = vec![
            SlaRule {
                id:               "1".into(),
                name:             "Critical Hardware Issues".into(),
                category:         "Hardware".into(),
                priority:         Priority::High,
                response_hours:   1,
                resolution_hours: 4,
                escalation_levels: vec![
                    EscalationStep {
                        level:                1,
                        time_threshold_hours: 2,
                        action:               "Notify Team Lead".into(),
                        recipients:           vec!["team-lead@company.com".into()],
                        notification_type:    NotificationChannel::Email,
                    },
                    EscalationStep {
                        level:                2,
                        time_threshold_hours: 3,
                        action:               "Escalate to Manager".into(),
                        recipients:           vec!["manager@company.com".into()],
                        notification_type:    NotificationChannel::Email,
                    },
                ],
                enabled:     true,
                description: "Critical hardware failures requiring immediate attention".into(),
            },
            SlaRule {
                id:               "2".into(),
                name:             "Network Connectivity".into(),
                category:         "Network".into(),
                priority:         Priority::Medium,
                response_hours:   2,
                resolution_hours: 8,
                escalation_levels: vec![EscalationStep {
                    level:                1,
                    time_threshold_hours: 4,
                    action:               "Notify Network Team".into(),
                    recipients:           vec!["network-team@company.com".into()],
                    notification_type:    NotificationChannel::InApp,
                }],
                enabled:     true,
                description: "Network connectivity issues".into(),
            },
            SlaRule {
                id:               "3".into(),
                name:             "Software Support".into(),
                category:         "Software".into(),
                priority:         Priority::Low,
                response_hours:   4,
                resolution_hours: 24,
                escalation_levels: vec![EscalationStep {
                    level:                1,
                    time_threshold_hours: 12,
                    action:               "Notify Support Team".into(),
                    recipients:           vec!["support@company.com".into()],
                    notification_type:    NotificationChannel::Email,
                }],
                enabled:     true,
                description: "General software support requests".into(),
            },
        ];

        Self {
            tick_period_secs:          60,
            thresholds:                SlaThresholds::default(),
            escalation:                EscalationPolicy::default(),
            snapshot_interval_ticks:   60,
            fallback_resolution_hours: 24,
            sla_rules:                 rules,
        }
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self::default_test()
    }
}
