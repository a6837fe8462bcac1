//! Team Kanban board: projects, a three-column task board, checklists and
//! assignments over a hosted Postgres backend.

pub mod app;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod logging;
pub mod models;
pub mod service;
pub mod ui;
