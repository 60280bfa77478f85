//! Deterministic dev-mock selection.
//!
//! When no usable host exists in a development environment, the bridge
//! synthesizes this fixed state so the rest of the pipeline stays
//! exercisable offline. The values are part of the protocol contract and
//! never vary.

use riaa_protocols::selection::{
    BreakpointWidths, MockReason, SelectionDescriptor, SelectionState,
};

pub const DEV_MOCK_DESKTOP_WIDTH: u32 = 640;
pub const DEV_MOCK_MOBILE_WIDTH: u32 = 320;

/// The fixed mock selection: one `img` at desktop 640 / mobile 320.
pub fn dev_mock_state(reason: MockReason) -> SelectionState {
    let descriptor = SelectionDescriptor::new()
        .with_id("riaa-dev-mock")
        .with_label("Sample image")
        .with_selector("body > img")
        .with_tag_name("img")
        .with_widths(BreakpointWidths {
            desktop: Some(DEV_MOCK_DESKTOP_WIDTH),
            tablet: None,
            mobile: Some(DEV_MOCK_MOBILE_WIDTH),
        });
    SelectionState::new(vec![descriptor], true).with_reason(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_state_shape() {
        let state = dev_mock_state(MockReason::HostUnavailable);
        assert!(state.is_dev_mock());
        assert_eq!(state.reason(), Some(MockReason::HostUnavailable));
        assert_eq!(state.elements().len(), 1);

        let primary = state.primary().unwrap();
        assert_eq!(primary.tag_name.as_deref(), Some("img"));
        assert_eq!(primary.widths.desktop, Some(640));
        assert_eq!(primary.widths.mobile, Some(320));
        assert!(primary.dev_mock);
    }

    #[test]
    fn test_mock_state_is_deterministic() {
        assert_eq!(
            dev_mock_state(MockReason::CapabilityGap),
            dev_mock_state(MockReason::CapabilityGap)
        );
    }
}
