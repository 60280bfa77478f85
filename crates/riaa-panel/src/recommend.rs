//! Recommendation backend client.
//!
//! The backend is an opaque HTTP JSON endpoint: one POST, camelCase bodies,
//! all response fields optional. Any non-2xx status is a uniform backend
//! failure; interpretation of absent fields (the fallback policy) belongs
//! to the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use riaa_protocols::error::RecommendError;
use riaa_protocols::selection::{BreakpointWidths, SelectionDescriptor};

use crate::widths::MeasuredWidths;

#[cfg(test)]
#[path = "recommend_tests.rs"]
mod tests;

/// Identity of the analyzed element, as the backend wants it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl From<&SelectionDescriptor> for ElementInfo {
    fn from(descriptor: &SelectionDescriptor) -> Self {
        Self {
            label: descriptor.label.clone(),
            tag_name: descriptor.tag_name.clone(),
            selector: descriptor.selector.clone(),
        }
    }
}

/// Measured widths body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WidthsBody {
    pub desktop: u32,
    pub mobile: u32,
}

impl From<MeasuredWidths> for WidthsBody {
    fn from(widths: MeasuredWidths) -> Self {
        Self {
            desktop: widths.desktop,
            mobile: widths.mobile,
        }
    }
}

/// Optional request metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "BreakpointWidths::is_empty")]
    pub computed_widths: BreakpointWidths,
}

/// POST body for the recommendation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub element: ElementInfo,
    pub widths: WidthsBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RequestMetadata>,
}

impl RecommendationRequest {
    /// Build a request from the analyzed descriptor and its derived widths.
    pub fn for_descriptor(descriptor: &SelectionDescriptor, widths: MeasuredWidths) -> Self {
        let source = if descriptor.dev_mock {
            "dev-mock"
        } else if descriptor.widths.is_empty() {
            "computed"
        } else {
            "host"
        };
        Self {
            element: ElementInfo::from(descriptor),
            widths: widths.into(),
            metadata: Some(RequestMetadata {
                source: Some(source.to_string()),
                computed_widths: descriptor.computed_widths,
            }),
        }
    }
}

/// 2xx response body; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal_upload_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_render_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_render_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// HTTP client for the recommendation endpoint.
#[derive(Debug, Clone)]
pub struct RecommendClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl RecommendClient {
    /// Build a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, RecommendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecommendError::Network(e.to_string()))?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST one analysis request.
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, RecommendError> {
        debug!(endpoint = %self.endpoint, "requesting upload recommendation");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| RecommendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecommendError::Status {
                status: status.as_u16(),
            });
        }
        response
            .json::<RecommendationResponse>()
            .await
            .map_err(|e| RecommendError::InvalidResponse(e.to_string()))
    }
}
