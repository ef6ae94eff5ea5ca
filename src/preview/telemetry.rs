//! Folds frame telemetry into [`PreviewState`](super::PreviewState).
//!
//! Only envelopes addressed to the preview's logical frame id count, so a
//! staging frame's reports never leak into the visible state.

use tokio::task::JoinHandle;

use super::state::SharedState;
use crate::protocol::{FrameEvent, FrameId, HostChannel};

pub(crate) fn spawn(channel: &HostChannel, frame_id: FrameId, state: SharedState) -> JoinHandle<()> {
    let mut sub = channel.subscribe();

    tokio::spawn(async move {
        while let Some(envelope) = sub.recv().await {
            if !envelope.is_for(&frame_id) {
                continue;
            }
            let Ok(event) = FrameEvent::from_envelope(&envelope) else {
                continue;
            };

            let mut state = state.write();
            match event {
                FrameEvent::Resize(size) => state.window.size = Some(size),
                FrameEvent::Scroll(position) => state.window.scroll = position,
                FrameEvent::MouseMove(data)
                | FrameEvent::MouseEnter(data)
                | FrameEvent::MouseLeave(data)
                | FrameEvent::Click(data) => state.mouse = data,
                _ => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::preview::PreviewState;
    use crate::protocol::{DocumentSize, PointerData, ScrollPosition};

    #[tokio::test]
    async fn test_folds_only_own_frame() {
        let channel = HostChannel::new();
        let state = SharedState::default();
        let mine = FrameId::new("frame-mine");
        let task = spawn(&channel, mine.clone(), Arc::clone(&state));

        let size = DocumentSize {
            height: 600.0,
            width: 800.0,
            scroll_height: 1200.0,
            scroll_width: 800.0,
            is_resizing: false,
        };
        channel.post(FrameEvent::Resize(size).into_envelope(&mine));
        channel.post(FrameEvent::Scroll(ScrollPosition::new(9.0, 0.0)).into_envelope(&mine.staging()));
        channel.post(FrameEvent::Scroll(ScrollPosition::new(40.0, 0.0)).into_envelope(&mine));
        channel.post(
            FrameEvent::Click(PointerData::click(Some("#btn".into()), 1.0, 2.0)).into_envelope(&mine),
        );
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let snapshot = state.read().clone();
        assert_eq!(snapshot.window.size, Some(size));
        assert_eq!(snapshot.window.scroll, ScrollPosition::new(40.0, 0.0));
        assert_eq!(snapshot.mouse.target.as_deref(), Some("#btn"));
        task.abort();
    }

    #[test]
    fn test_default_state_is_idle() {
        let state = PreviewState::default();
        assert!(!state.loading);
        assert_eq!(state.mouse, PointerData::left());
        assert_eq!(state.window.size, None);
    }
}
