//! Colored terminal rendering of replay steps.

use colored::{ColoredString, Colorize};
use feedwatch::alarm::{Tier, format_timestamp};
use strum::IntoEnumIterator;

use crate::replay::Step;

fn tier_label(tier: Tier) -> ColoredString {
    let label = format!("{tier:<21}");
    match tier {
        Tier::User => label.yellow(),
        Tier::UserSnoozeOverride => label.yellow().bold(),
        Tier::Admin => label.magenta(),
        Tier::AdminSnoozeOverride => label.magenta().bold(),
    }
}

/// Print one step. Quiet steps are only shown with `verbose`.
pub fn print_step(step: &Step, verbose: bool) {
    let result = &step.result;
    let header = format!(
        "[{:>4}] {} entry={}",
        step.index,
        format_timestamp(step.at),
        step.last_entry_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    if result.is_empty() && result.events.is_empty() {
        if verbose {
            println!("{}", header.dimmed());
        }
        return;
    }

    println!("{}", header.bold());

    for tier in Tier::iter() {
        for line in result.tier(tier) {
            println!("    {} {}", tier_label(tier), line);
        }
    }

    // Raised but dropped by snooze or flood control
    let delivered = Tier::iter().map(|tier| result.tier(tier).len()).sum::<usize>();
    if result.events.len() > delivered {
        for event in &result.events {
            if !result.tier(event.tier).contains(&event.line()) {
                println!("    {} {}", "suppressed".dimmed(), event.line().dimmed());
            }
        }
    }

    if let Some(message) = &result.stale_feed {
        println!("    {}", message.red().bold());
    }
}

/// Totals across the whole replay.
#[derive(Debug, Default)]
pub struct Summary {
    pub steps: usize,
    pub raised: usize,
    pub delivered: usize,
    pub stale_alerts: usize,
}

impl Summary {
    pub fn record(&mut self, step: &Step) {
        self.steps += 1;
        self.raised += step.result.events.len();
        self.delivered += Tier::iter()
            .map(|tier| step.result.tier(tier).len())
            .sum::<usize>();
        if step.result.stale_feed.is_some() {
            self.stale_alerts += 1;
        }
    }

    pub fn print(&self) {
        println!();
        println!("{}", "Summary".bold());
        println!("  Snapshots:    {}", self.steps);
        println!("  Alarms:       {}", self.raised);
        println!("  Delivered:    {}", self.delivered.to_string().green());
        println!(
            "  Suppressed:   {}",
            self.raised.saturating_sub(self.delivered).to_string().dimmed()
        );
        println!("  Stale alerts: {}", self.stale_alerts.to_string().red());
    }
}
