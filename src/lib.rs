//! Careletter: a healthcare-communication backend.
//!
//! Clinicians upload discharge documents or record consultation audio;
//! the service produces patient-friendly summaries and clinical notes
//! through external AI providers, emails summaries to patients, and
//! collects anonymous feedback through a patient portal.

pub mod api;
pub mod config;
pub mod db;
pub mod extraction;
pub mod models;
pub mod prompts;
pub mod providers;
pub mod retention;
