//! relia: reliability block analysis
//!
//! Computes system reliability for a hierarchically decomposed architecture
//! from per-component failure rates, propagates rate uncertainty with Monte
//! Carlo trials and ranks components by their contribution to the spread.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod entities;
