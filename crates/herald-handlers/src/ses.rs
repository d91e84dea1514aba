// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk cloud email handler family and an SES v2 HTTP transport.
//!
//! Requests are signed with AWS Signature Version 4.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_config::model::{EmailConfig, SesConfig};
use herald_core::traits::transport::{BULK_EMAIL_CHARSET, BulkEmail, BulkEmailTransport};
use herald_core::{
    Handler, HandlerDescriptor, HeraldError, MessageContext, MessageRecord, SendContext, Source,
};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::Url;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::email::{EmailTemplates, field};
use crate::matching::SourceParser;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "ses";
const SEND_EMAIL_PATH: &str = "/v2/email/outbound-emails";

/// Email handler sending through a bulk cloud email API.
///
/// Unlike [`crate::EmailHandler`], the HTML body is always rendered.
pub struct SesHandler<P> {
    name: Option<String>,
    templates: EmailTemplates,
    parser: P,
}

impl<P: SourceParser> SesHandler<P> {
    pub fn new(name: impl Into<String>, templates: EmailTemplates, parser: P) -> Self {
        Self {
            name: Some(name.into()),
            templates,
            parser,
        }
    }
}

#[async_trait]
impl<P: SourceParser> Handler for SesHandler<P> {
    fn descriptor(&self) -> HandlerDescriptor {
        let descriptor = self.templates.describe(HandlerDescriptor::new(self.name.clone()));
        self.parser.describe(descriptor)
    }

    fn matches(&self, source: &Source) -> bool {
        self.parser.matches(source)
    }

    fn parse(&self, source: &Source) -> Result<MessageContext, HeraldError> {
        self.parser.parse(source)
    }

    async fn send(&self, record: &MessageRecord, cx: &SendContext<'_>) -> Result<(), HeraldError> {
        let transport = cx.transports.bulk_email()?;
        let subject = field(&self.templates.subject, "subject")?;
        let text_template = field(&self.templates.template_text, "template_text")?;
        let html_template = field(&self.templates.template_html, "template_html")?;
        let text = cx.renderer.render(text_template, &record.context, cx.locale).await?;
        let html = cx.renderer.render(html_template, &record.context, cx.locale).await?;

        transport
            .send_bulk_email(BulkEmail {
                subject: subject.to_string(),
                to: record.recipients.clone(),
                text,
                html,
            })
            .await
    }
}

/// AWS credentials used for request signing.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// SES v2 `SendEmail` over HTTPS.
#[derive(Debug, Clone)]
pub struct SesTransport {
    client: reqwest::Client,
    endpoint: Url,
    region: String,
    sender: String,
    credentials: AwsCredentials,
}

impl SesTransport {
    /// Builds the transport, or returns `None` when no region is configured.
    ///
    /// The sender is `"{email.from} <{email.host_user}>"`; both must be set.
    /// Credentials come from `[ses]` or, failing that, `AWS_ACCESS_KEY_ID` and
    /// `AWS_SECRET_ACCESS_KEY`.
    pub fn from_config(ses: &SesConfig, email: &EmailConfig) -> Result<Option<Self>, HeraldError> {
        let Some(region) = ses.region.as_deref() else {
            return Ok(None);
        };
        let from = email
            .from
            .as_deref()
            .ok_or_else(|| HeraldError::Config("`email.from` is not set".into()))?;
        let host_user = email
            .host_user
            .as_deref()
            .ok_or_else(|| HeraldError::Config("`email.host_user` is not set".into()))?;

        let access_key_id = ses
            .access_key_id
            .clone()
            .or_else(|| std::env::var("AWS_ACCESS_KEY_ID").ok())
            .ok_or_else(|| HeraldError::Config("SES access key id is not set".into()))?;
        let secret_access_key = ses
            .secret_access_key
            .clone()
            .or_else(|| std::env::var("AWS_SECRET_ACCESS_KEY").ok())
            .ok_or_else(|| HeraldError::Config("SES secret access key is not set".into()))?;

        let endpoint = ses
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://email.{region}.amazonaws.com"));

        let transport = Self::new(
            &endpoint,
            region,
            format!("{from} <{host_user}>"),
            AwsCredentials {
                access_key_id,
                secret_access_key,
            },
        )?;
        info!(region, endpoint = %transport.endpoint, "SES transport configured");
        Ok(Some(transport))
    }

    pub fn new(
        endpoint: &str,
        region: &str,
        sender: String,
        credentials: AwsCredentials,
    ) -> Result<Self, HeraldError> {
        let endpoint = Url::parse(endpoint)
            .and_then(|base| base.join(SEND_EMAIL_PATH))
            .map_err(|e| HeraldError::Config(format!("invalid SES endpoint `{endpoint}`: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HeraldError::transport_with(SERVICE, "failed to build HTTP client", e))?;

        Ok(Self {
            client,
            endpoint,
            region: region.to_string(),
            sender,
            credentials,
        })
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    fn request_body(&self, email: &BulkEmail) -> serde_json::Value {
        json!({
            "FromEmailAddress": self.sender,
            "Destination": { "ToAddresses": email.to },
            "Content": {
                "Simple": {
                    "Subject": { "Data": email.subject, "Charset": BULK_EMAIL_CHARSET },
                    "Body": {
                        "Text": { "Data": email.text, "Charset": BULK_EMAIL_CHARSET },
                        "Html": { "Data": email.html, "Charset": BULK_EMAIL_CHARSET },
                    }
                }
            }
        })
    }
}

#[async_trait]
impl BulkEmailTransport for SesTransport {
    async fn send_bulk_email(&self, email: BulkEmail) -> Result<(), HeraldError> {
        let body = serde_json::to_vec(&self.request_body(&email))
            .map_err(|e| HeraldError::transport_with(SERVICE, "failed to encode request", e))?;
        let headers = sign_request(
            &self.endpoint,
            &body,
            &self.region,
            &self.credentials,
            Utc::now(),
        )?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| HeraldError::transport_with(SERVICE, "HTTP request failed", e))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, recipients = email.to.len(), "bulk email accepted");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "bulk email rejected");
        Err(HeraldError::transport(
            SERVICE,
            format!("API returned {status}: {body}"),
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>, HeraldError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| HeraldError::Internal(format!("HMAC key rejected: {e}")))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Signs a JSON POST with AWS Signature Version 4 and returns the headers to send.
pub fn sign_request(
    url: &Url,
    body: &[u8],
    region: &str,
    credentials: &AwsCredentials,
    now: DateTime<Utc>,
) -> Result<HeaderMap, HeraldError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => {
            return Err(HeraldError::Config(format!("SES endpoint `{url}` has no host")));
        }
    };
    let payload_hash = sha256_hex(body);

    let signed_headers = "content-type;host;x-amz-content-sha256;x-amz-date";
    let canonical_request = format!(
        "POST\n{path}\n\ncontent-type:application/json\nhost:{host}\n\
         x-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n\n\
         {signed_headers}\n{payload_hash}",
        path = url.path(),
    );

    let scope = format!("{date}/{region}/{SERVICE}/aws4_request");
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let k_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        &date,
    )?;
    let k_region = hmac_sha256(&k_date, region)?;
    let k_service = hmac_sha256(&k_region, SERVICE)?;
    let k_signing = hmac_sha256(&k_service, "aws4_request")?;
    let signature = hex::encode(hmac_sha256(&k_signing, &string_to_sign)?);

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    );

    let header = |value: &str| {
        HeaderValue::from_str(value)
            .map_err(|e| HeraldError::Config(format!("invalid signing header value: {e}")))
    };
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("x-amz-date", header(&amz_date)?);
    headers.insert("x-amz-content-sha256", header(&payload_hash)?);
    headers.insert(AUTHORIZATION, header(&authorization)?);
    Ok(headers)
}
