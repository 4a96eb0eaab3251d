//! Deterministic names and ticket titles from curated lists.

use crate::rng::DeskRng;

pub struct NameGenerator;

impl NameGenerator {
    pub fn full_name(rng: &mut DeskRng) -> String {
        format!("{} {}", rng.pick(FIRST_NAMES), rng.pick(LAST_NAMES))
    }

    /// A (category, title) pair.
    pub fn ticket_subject(rng: &mut DeskRng) -> (&'static str, &'static str) {
        let &(category, titles) = rng.pick(SUBJECTS);
        (category, *rng.pick(titles))
    }

    pub fn agent(rng: &mut DeskRng) -> &'static str {
        *rng.pick(AGENTS)
    }

    /// The team that usually owns a category.
    pub fn team_for(category: &str) -> &'static str {
        match category {
            "Hardware" => "Hardware Support",
            "Network"  => "Network Team",
            _          => "Software Support",
        }
    }
}

const FIRST_NAMES: &[&str] = &[
    "Sarah", "Mike", "Emily", "Tom", "Priya", "Carlos", "Aisha", "Kenji",
    "Laura", "Daniel", "Fatima", "Oliver", "Mei", "Samuel", "Ines", "Ravi",
];

const LAST_NAMES: &[&str] = &[
    "Johnson", "Chen", "Davis", "Wilson", "Patel", "Garcia", "Khan", "Tanaka",
    "Muller", "Okafor", "Rossi", "Nguyen", "Kowalski", "Silva", "Haddad", "Berg",
];

const AGENTS: &[&str] = &["John Smith", "Jane Doe", "Bob Wilson", "Alice Brown"];

const SUBJECTS: &[(&str, &[&str])] = &[
    ("Hardware", &[
        "Laptop Screen Flickering",
        "Docking station not detected",
        "Keyboard keys unresponsive",
        "Printer jams on every job",
    ]),
    ("Network", &[
        "WiFi Connection Issues",
        "VPN drops every few minutes",
        "Cannot reach shared drive",
    ]),
    ("Software", &[
        "Software Installation Request",
        "License expired for design suite",
        "Application crashes on startup",
    ]),
    ("Email", &[
        "Email Sync Problems",
        "Calendar invites not arriving",
    ]),
];
