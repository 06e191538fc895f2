//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Check results and rounds
//!
//! A round is assembled once by the orchestrator and never mutated after
//! that; the snapshot store shares it behind an `Arc`.

pub mod types;

// Re-export commonly used types
pub use types::{CheckFailure, CheckResult, CheckRound, Tier};
