// SPDX-License-Identifier: GPL-3.0-only

//! Preview surface: the sink half of the capture pipeline
//!
//! ```text
//! ghost sink ─▶ videoflip ─▶ [aspectratiocrop] ─▶ videoconvert ─▶ video sink
//! ```
//!
//! The surface is built once and outlives every input that is bound to it,
//! so the preview window stays open while cameras are switched.

use super::super::types::{BackendError, BackendResult, PreviewGravity, PreviewOptions};
use crate::constants::pipeline::PREVIEW_BIN_NAME;
use gstreamer::prelude::*;
use gstreamer_video::VideoOrientationMethod;
use tracing::{debug, info};

/// Rendering destination for a capture session
pub struct PreviewSurface {
    bin: gstreamer::Bin,
}

fn make_element(factory: &str) -> BackendResult<gstreamer::Element> {
    gstreamer::ElementFactory::make(factory)
        .build()
        .map_err(|e| BackendError::NotAvailable(format!("{}: {}", factory, e)))
}

/// Orientation applied by `videoflip`
pub fn orientation_for(mirror: bool) -> VideoOrientationMethod {
    if mirror {
        VideoOrientationMethod::Horiz
    } else {
        VideoOrientationMethod::Identity
    }
}

impl PreviewSurface {
    /// Build the preview bin for `options`
    pub fn new(options: &PreviewOptions) -> BackendResult<Self> {
        info!(
            mirror = options.mirror,
            gravity = ?options.gravity,
            sink = %options.video_sink,
            "Creating preview surface"
        );

        let bin = gstreamer::Bin::builder().name(PREVIEW_BIN_NAME).build();

        let flip = make_element("videoflip")?;
        flip.set_property("video-direction", orientation_for(options.mirror));

        let mut chain = vec![flip];

        if options.gravity == PreviewGravity::Fill {
            let crop = make_element("aspectratiocrop")?;
            let (num, den) = options.fill_aspect;
            crop.set_property("aspect-ratio", gstreamer::Fraction::new(num, den));
            chain.push(crop);
        }

        chain.push(make_element("videoconvert")?);

        let sink = make_element(&options.video_sink)?;
        if sink.find_property("force-aspect-ratio").is_some() {
            sink.set_property(
                "force-aspect-ratio",
                options.gravity != PreviewGravity::Stretch,
            );
        } else {
            debug!(sink = %options.video_sink, "Sink has no force-aspect-ratio property");
        }
        chain.push(sink);

        bin.add_many(&chain)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        gstreamer::Element::link_many(&chain)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let target = chain[0].static_pad("sink").ok_or_else(|| {
            BackendError::InitializationFailed("videoflip has no sink pad".to_string())
        })?;
        let ghost = gstreamer::GhostPad::with_target(&target)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        bin.add_pad(&ghost)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        Ok(Self { bin })
    }

    /// The bin to place in the session pipeline
    pub fn bin(&self) -> &gstreamer::Bin {
        &self.bin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_for_mirror_flag() {
        assert_eq!(orientation_for(true), VideoOrientationMethod::Horiz);
        assert_eq!(orientation_for(false), VideoOrientationMethod::Identity);
    }
}
