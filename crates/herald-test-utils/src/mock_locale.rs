// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locale service that remembers every activation.

use std::sync::Mutex;

use herald_core::LocaleService;

#[derive(Debug)]
pub struct MockLocale {
    active: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MockLocale {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            active: Mutex::new(initial.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every locale passed to `activate`, in order.
    pub fn activations(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl LocaleService for MockLocale {
    fn active(&self) -> String {
        self.active.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn activate(&self, locale: &str) {
        if let Ok(mut active) = self.active.lock() {
            *active = locale.to_string();
        }
        if let Ok(mut history) = self.history.lock() {
            history.push(locale.to_string());
        }
    }
}
