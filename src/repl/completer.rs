use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::repl::commands::{COMMAND_NAMES, FIND_FLAGS};

pub static INDUSTRY_SUGGESTIONS: &[&str] = &[
    "Construction",
    "Mining",
    "Infrastructure",
    "Civil Engineering",
    "Transportation",
    "Urban Development",
    "Water and Wastewater Management",
    "Oil and Gas",
    "Environmental Services",
    "Railways",
    "Energy (Renewable and Non-Renewable)",
    "Geotechnical Engineering",
    "Government and Public Sector",
    "Heavy Machinery Manufacturing",
    "Road and Highway Construction",
    "Utilities (Power, Gas, Water)",
    "Tunneling and Subsurface Construction",
    "Maritime and Port Construction",
    "Building and Real Estate Development",
    "Smart Cities and Urban Planning",
];

pub static SIZE_SUGGESTIONS: &[&str] = &[
    "Micro (1-9 employees)",
    "Small (10-49 employees)",
    "Medium (50-249 employees)",
    "Large (250-999 employees)",
    "Enterprise (1000+ employees)",
];

pub static VIBE_SUGGESTIONS: &[&str] = &[
    "Professional",
    "Casual",
    "Friendly",
    "Concise",
    "Empathetic",
    "Optimistic",
    "Polite",
    "Enthusiastic",
];

fn suggestions_for(flag: &str) -> &'static [&'static str] {
    match flag {
        "--industry" | "-i" => INDUSTRY_SUGGESTIONS,
        "--size" | "-s" => SIZE_SUGGESTIONS,
        "--vibe" => VIBE_SUGGESTIONS,
        _ => &[],
    }
}

fn pairs(candidates: &[&str], prefix: &str) -> Vec<Pair> {
    let lower = prefix.to_lowercase();
    candidates
        .iter()
        .filter(|c| c.to_lowercase().starts_with(&lower))
        .map(|c| Pair {
            display: c.to_string(),
            replacement: c.to_string(),
        })
        .collect()
}

#[derive(Default)]
pub struct ReplHelper;

impl Helper for ReplHelper {}
impl Validator for ReplHelper {}
impl Highlighter for ReplHelper {}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let trimmed = line.trim();
        if !trimmed.starts_with('/') || trimmed.contains(' ') {
            return None;
        }
        for name in COMMAND_NAMES {
            if name.starts_with(trimmed) && *name != trimmed {
                return Some(name[trimmed.len()..].to_string());
            }
        }
        None
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let trimmed = prefix.trim_start();

        if !trimmed.starts_with('/') {
            return Ok((0, vec![]));
        }

        // Past the command name: only /find takes flags and values
        if let Some(space_idx) = trimmed.find(' ') {
            if &trimmed[..space_idx] != "/find" {
                return Ok((pos, vec![]));
            }
            let current_word = prefix.rsplit(' ').next().unwrap_or("");
            if current_word.starts_with('-') {
                return Ok((pos - current_word.len(), pairs(FIND_FLAGS, current_word)));
            }

            // Value after the last flag, which may already span several words
            let words: Vec<&str> = trimmed[space_idx..].split(' ').collect();
            let Some(flag_pos) = words.iter().rposition(|w| w.starts_with("--")) else {
                return Ok((pos, vec![]));
            };
            let value_prefix = words[flag_pos + 1..].join(" ");
            let value_prefix = value_prefix.trim_start();
            let start = pos - value_prefix.len();
            return Ok((start, pairs(suggestions_for(words[flag_pos]), value_prefix)));
        }

        let start = pos - trimmed.len();
        let matches: Vec<Pair> = COMMAND_NAMES
            .iter()
            .filter(|name| name.starts_with(trimmed))
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();

        Ok((start, matches))
    }
}
