use crate::application::gate::FlowGuard;
use crate::domain::cashier::{CashierRequest, CashierResponse, FrameHeightMessage};
use crate::domain::ports::{CashierApiRef, CashierViewRef};
use crate::error::Result;
use crate::sync::lock;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// The provider frame currently embedded in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedFrame {
    pub url: String,
    pub height: Option<u32>,
    /// Whether height-update messages are being honoured.
    pub listening: bool,
}

/// Requests provider sessions and owns the embedded frame.
pub struct CashierSession {
    api: CashierApiRef,
    view: CashierViewRef,
    guard: FlowGuard,
    site_domain: String,
    default_height: u32,
    loading_grace: Duration,
    frame: Mutex<Option<EmbeddedFrame>>,
}

impl CashierSession {
    pub fn new(
        api: CashierApiRef,
        view: CashierViewRef,
        guard: FlowGuard,
        site_domain: impl Into<String>,
        default_height: u32,
        loading_grace: Duration,
    ) -> Self {
        Self {
            api,
            view,
            guard,
            site_domain: site_domain.into(),
            default_height,
            loading_grace,
            frame: Mutex::new(None),
        }
    }

    pub async fn request(&self, request: &CashierRequest) -> Result<CashierResponse> {
        debug!(
            cashier = %request.cashier_type,
            verified = request.verification_code.is_some(),
            provider = request.provider.as_deref(),
            "requesting cashier session"
        );
        self.api.cashier(request).await
    }

    /// Embeds the provider URL. Crypto cashiers get a fixed height; others
    /// resize from the frame's height messages until teardown.
    pub fn embed(&self, url: &str, is_crypto: bool) -> EmbeddedFrame {
        let frame = EmbeddedFrame {
            url: url.to_string(),
            height: is_crypto.then_some(self.default_height),
            listening: !is_crypto,
        };
        self.view.embed_frame(&frame.url, frame.height);
        *lock(&self.frame) = Some(frame.clone());
        info!(listening = frame.listening, "cashier frame embedded");

        // The frame needs a moment to load before the loading bar goes.
        let view = self.view.clone();
        let guard = self.guard.clone();
        let grace = self.loading_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if !guard.is_disposed() {
                view.hide_loading();
            }
        });

        frame
    }

    /// Applies a height message. Returns the new height when honoured.
    pub fn on_message(&self, message: &FrameHeightMessage) -> Option<u32> {
        if self.guard.is_disposed() || !is_foreign_origin(&message.origin, &self.site_domain) {
            return None;
        }
        let mut frame = lock(&self.frame);
        let frame = frame.as_mut().filter(|frame| frame.listening)?;
        let height = parse_height(&message.data, self.default_height);
        frame.height = Some(height);
        self.view.set_frame_height(height);
        Some(height)
    }

    pub fn remove_listener(&self) {
        if let Some(frame) = lock(&self.frame).as_mut() {
            frame.listening = false;
        }
    }

    pub fn frame(&self) -> Option<EmbeddedFrame> {
        lock(&self.frame).clone()
    }
}

/// Messages from the site's own `www.` host come from the page itself and
/// must never resize the provider frame.
pub fn is_foreign_origin(origin: &str, site_domain: &str) -> bool {
    let own_host = format!("www.{site_domain}").to_ascii_lowercase();
    !origin.to_ascii_lowercase().contains(&own_host)
}

/// Numeric payloads set the height; anything else (or a non-positive
/// number) restores the default.
pub fn parse_height(data: &str, default: u32) -> u32 {
    match data.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.round().min(u32::MAX as f64) as u32,
        _ => default,
    }
}
