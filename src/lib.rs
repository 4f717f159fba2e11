//! MIMS - Mine-Inspection Management System backend
//! Mission: Role-gated inspection planning and compliance scoring for minesites

pub mod app;
pub mod auth;
pub mod cache;
pub mod categories;
pub mod config;
pub mod features;
pub mod inspections;
pub mod inspectors;
pub mod middleware;
pub mod minesites;
pub mod response;
pub mod rmb_staff;
pub mod sections;
pub mod state;
