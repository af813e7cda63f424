//! Math utilities for the differential-drive bot.
//!
//! This module maps motion commands onto per-wheel setpoints for a two-wheeled
//! robot steered by reversing one side.

pub mod drive;
