//! Derivation engines for lane ordering, streaks and badges.
//!
//! # Responsibility
//! - Keep the order-sensitive and date-sensitive rules in pure, separately
//!   testable units; persistence stays in the repo layer.
//!
//! # Invariants
//! - `lane` accepts a move set only if applying it keeps every touched lane
//!   a dense, collision-free sequence.
//! - `streak` only ever moves the continuity count forward in time.
//! - `badges` awards each catalog entry at most once per user.

pub mod badges;
pub mod lane;
pub mod streak;
