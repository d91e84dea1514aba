// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed statements over the `messages` and `queue` tables.

pub mod messages;
pub mod queue;

