//! Flutter bridge for the famtrail viewer core.

pub mod api;
