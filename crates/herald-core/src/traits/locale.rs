// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Active-locale service consumed by the dispatcher.

/// Process-wide active locale. The dispatcher saves and restores it around sends.
pub trait LocaleService: Send + Sync {
    /// Returns the currently active locale.
    fn active(&self) -> String;

    /// Makes `locale` the active locale.
    fn activate(&self, locale: &str);
}
