//! # Instruction Formatter
//!
//! Turns steps into announcement text. Pure functions, no state.
//!
//! Two templates exist and they are not symmetric:
//!
//! - the opening announcement describes the current *and* the next step,
//! - every later announcement describes one step, with the wording
//!   "In {distance} meters, then in {instruction}".
//!
//! `InstructionTemplate::Unified` replaces the second wording with the
//! same "In {distance} meters, {instruction}" shape as the first.

use serde::{Deserialize, Serialize};

use crate::core::route::Step;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionTemplate {
    #[default]
    Original,
    Unified,
}

/// Opening announcement covering two steps.
pub fn format_pair(current: &Step, next: &Step) -> String {
    format!(
        "In {} meters, {}, then in {} meters, {}",
        current.distance_m, current.instruction, next.distance_m, next.instruction
    )
}

/// Single-step announcement.
pub fn format_single(step: &Step, template: InstructionTemplate) -> String {
    match template {
        InstructionTemplate::Original => {
            format!("In {} meters, then in {}", step.distance_m, step.instruction)
        }
        InstructionTemplate::Unified => {
            format!("In {} meters, {}", step.distance_m, step.instruction)
        }
    }
}

/// Opening announcement for a route: two-step lookahead when a second
/// step exists, single-step otherwise.
pub fn format_opening(steps: &[Step], template: InstructionTemplate) -> Option<String> {
    match steps {
        [] => None,
        [only] => Some(format_single(only, template)),
        [first, second, ..] => Some(format_pair(first, second)),
    }
}
