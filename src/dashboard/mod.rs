//! Dashboard module
//!
//! The landing page for logged in users: totals, the add transaction form,
//! the bank link card and the income and expense lists, kept up to date over
//! server-sent events.

mod cards;
mod handlers;

pub use handlers::{DashboardState, get_dashboard_page, stream_dashboard};
