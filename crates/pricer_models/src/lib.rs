//! # Pricer Models (L2: Reference Analytics)
//!
//! Closed-form option prices used to cross-check the sharded Monte Carlo
//! engine in `pricer_sharding`.
//!
//! This crate provides:
//! - Standard normal CDF and PDF accurate to double precision
//! - The Black-Scholes model for European calls and puts
//!
//! ## Design Principles
//!
//! - **Generic over `T: Float`** so the formulas work for `f32` and `f64`
//! - **Validated construction**: invalid market inputs are rejected up front

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
