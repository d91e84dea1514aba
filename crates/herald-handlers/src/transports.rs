// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the configured transport set.

use std::sync::Arc;

use herald_config::HeraldConfig;
use herald_core::{HeraldError, Transports};
use tracing::warn;

use crate::email::SmtpTransport;
use crate::ses::SesTransport;
use crate::sms::TwilioTransport;

/// Creates every transport whose section is configured.
///
/// A section is configured once its anchor key is set (`email.smtp_host`,
/// `ses.region`, `twilio.account_sid`). Handlers whose transport is missing
/// fail at send time with a configuration error.
pub fn transports_from_config(config: &HeraldConfig) -> Result<Transports, HeraldError> {
    let mut transports = Transports::new();

    if let Some(smtp) = SmtpTransport::from_config(&config.email)? {
        transports = transports.with_email(Arc::new(smtp));
    }
    if let Some(ses) = SesTransport::from_config(&config.ses, &config.email)? {
        transports = transports.with_bulk_email(Arc::new(ses));
    }
    if let Some(twilio) = TwilioTransport::from_config(&config.twilio)? {
        transports = transports.with_sms(Arc::new(twilio));
    }

    if config.msg.skip_send {
        warn!("skip_send is enabled; messages will not reach any transport");
    }
    Ok(transports)
}
