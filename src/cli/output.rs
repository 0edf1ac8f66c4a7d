//! CLI output formatting.
//!
//! Formatting is split from printing so the tables can be tested.

use std::fmt::Write;

use crate::body::Body;
use crate::engine::{RunSummary, Snapshot};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fixed-width table of name, mass, position, speed and liveness.
#[must_use]
pub fn format_system_state(bodies: &[Body]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>12}{:>15}{:>15}{:>15}{:>15}{:>15}{:>10}",
        "Name", "Mass (kg)", "Position (x)", "Position (y)", "Position (z)", "Velocity (m/s)", "Active"
    );
    let _ = writeln!(out, "{}", "-".repeat(97));

    for body in bodies {
        let _ = writeln!(
            out,
            "{:>12}{:>15.2e}{:>15.2e}{:>15.2e}{:>15.2e}{:>15.2e}{:>10}",
            body.name,
            body.mass,
            body.position.x,
            body.position.y,
            body.position.z,
            body.velocity.magnitude(),
            if body.active { "Yes" } else { "No" }
        );
    }
    out
}

/// Print [`format_system_state`] under a title.
pub fn display_system_state(title: &str, bodies: &[Body]) {
    println!("\n{title}");
    print!("{}", format_system_state(bodies));
}

/// One-line live progress for real-time runs.
#[must_use]
pub fn format_progress(snapshot: &Snapshot) -> String {
    format!(
        "Iteration {} | Time: {:.2} days | Active bodies: {} | dt: {:.4} days | Energy error: {:.6}%",
        snapshot.iteration,
        snapshot.time / SECONDS_PER_DAY,
        snapshot.active_count(),
        snapshot.dt / SECONDS_PER_DAY,
        snapshot.energy.relative_error * 100.0,
    )
}

/// End-of-run report.
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let _ = writeln!(out, "Stop reason:        {}", summary.stop_reason);
    let _ = writeln!(out, "Iterations:         {}", summary.iterations);
    let _ = writeln!(
        out,
        "Simulated time:     {:.2} days",
        summary.simulated_time / SECONDS_PER_DAY
    );
    let _ = writeln!(out, "Active bodies:      {}", summary.active_bodies);
    let _ = writeln!(out, "Total collisions:   {}", summary.collisions);
    if summary.quarantined > 0 {
        let _ = writeln!(out, "Quarantined bodies: {}", summary.quarantined);
    }
    let _ = writeln!(
        out,
        "Final energy error: {:.6}%",
        summary.final_energy.relative_error * 100.0
    );
    let _ = writeln!(out, "Energy warnings:    {}", summary.energy_warnings);
    let _ = writeln!(
        out,
        "Completed in {} ms",
        summary.wall_clock.as_millis()
    );
    out
}

/// Print [`format_summary`].
pub fn print_summary(summary: &RunSummary) {
    print!("\n{}", format_summary(summary));
}

/// Print the run banner.
pub fn print_banner(title: &str) {
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║ {title:<61} ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
}
