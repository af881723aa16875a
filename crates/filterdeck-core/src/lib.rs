// Forbid unsafe in production; deny in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Core: geometry, frame-stepped animation, and the token model.
//!
//! # Role in filterdeck
//! `filterdeck-core` holds the leaf types every other crate builds on. It has
//! no notion of zones, sessions, or hosts; those live in `filterdeck-drag`.
//!
//! # Primary responsibilities
//! - **Geometry**: `Point` and `Rect` in window coordinates, point-in-rect
//!   containment for hit testing.
//! - **Animation**: the `Animation` trait, easing curves, the lerp/lean
//!   `Follower`, eased `Tween`s, and the fixed-rate `FrameTicker`.
//! - **Tokens**: the `Token` sum type (plain or container), ids, kinds, and
//!   deep duplication.

pub mod animation;
pub mod geometry;
pub mod token;
