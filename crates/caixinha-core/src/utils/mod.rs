//! Utility functions for amounts and dates.

pub mod format;

pub use format::{
    current_month, format_cents, is_valid_date, is_valid_month, normalize_amount, parse_cents,
    today,
};
