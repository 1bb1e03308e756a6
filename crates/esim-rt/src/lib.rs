//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Runtime helpers supporting the simulation session."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
//! Heartbeat and task scheduling helpers for the esim runtime.

pub mod heartbeat;
pub mod tasks;

pub use heartbeat::HeartbeatClock;
pub use tasks::TaskGroup;
