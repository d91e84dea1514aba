// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Active locale handling.

use arc_swap::ArcSwap;
use herald_core::LocaleService;
use std::sync::Arc;

/// Process-wide active locale backed by an atomic swap.
#[derive(Debug)]
pub struct ProcessLocale {
    active: ArcSwap<String>,
}

impl ProcessLocale {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            active: ArcSwap::from_pointee(initial.into()),
        }
    }
}

impl LocaleService for ProcessLocale {
    fn active(&self) -> String {
        self.active.load().as_ref().clone()
    }

    fn activate(&self, locale: &str) {
        self.active.store(Arc::new(locale.to_string()));
    }
}

/// Activates a locale for the lifetime of the guard, then restores the one
/// that was active before. Restoration also happens on early return and
/// unwinding.
pub struct LocaleScope<'a> {
    service: &'a dyn LocaleService,
    previous: String,
}

impl<'a> LocaleScope<'a> {
    pub fn enter(service: &'a dyn LocaleService, locale: &str) -> Self {
        let previous = service.active();
        service.activate(locale);
        Self { service, previous }
    }

    /// Locale that will be restored.
    pub fn previous(&self) -> &str {
        &self.previous
    }
}

impl Drop for LocaleScope<'_> {
    fn drop(&mut self) {
        self.service.activate(&self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_restores_previous_locale() {
        let locale = ProcessLocale::new("en");
        {
            let scope = LocaleScope::enter(&locale, "fr");
            assert_eq!(locale.active(), "fr");
            assert_eq!(scope.previous(), "en");
            {
                let _inner = LocaleScope::enter(&locale, "de");
                assert_eq!(locale.active(), "de");
            }
            assert_eq!(locale.active(), "fr");
        }
        assert_eq!(locale.active(), "en");
    }

    #[test]
    fn scope_restores_on_early_return() {
        fn fails(locale: &ProcessLocale) -> Result<(), String> {
            let _scope = LocaleScope::enter(locale, "ja");
            Err("boom".into())
        }

        let locale = ProcessLocale::new("en");
        assert!(fails(&locale).is_err());
        assert_eq!(locale.active(), "en");
    }
}
