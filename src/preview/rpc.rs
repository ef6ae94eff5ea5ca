//! Host side of remote calls into the active frame.

use std::time::Duration;

use serde_json::Value;

use crate::error::PreviewError;
use crate::frame::ActiveFrame;
use crate::protocol::{FrameEvent, HostChannel, HostCommand, RunId};

/// Call `function` in the active frame and wait for its reply.
///
/// With no frame the call resolves to `null` without sending anything. The
/// reply is matched on both the frame id and the run id, so concurrent
/// calls and other previews on the channel never cross.
pub(crate) async fn call(
    channel: &HostChannel,
    active: &ActiveFrame,
    function: &str,
    data: Value,
    timeout: Duration,
) -> Result<Value, PreviewError> {
    let Some(frame) = active.load() else {
        crate::debug!("rpc"; "no frame for `{}`, resolving empty", function);
        return Ok(Value::Null);
    };

    let run_id = RunId::generate();
    let frame_id = frame.frame_id();
    let mut replies = channel.subscribe();

    crate::debug!("rpc"; "call `{}` as {}", function, run_id);
    frame.publish(HostCommand::Call {
        function: function.to_string(),
        data,
        run_id: run_id.clone(),
    });

    let reply = async {
        while let Some(envelope) = replies.recv().await {
            if !envelope.is_for(&frame_id) || envelope.run_id.as_ref() != Some(&run_id) {
                continue;
            }
            match FrameEvent::from_envelope(&envelope) {
                Ok(FrameEvent::Resolve { value, .. }) => return Ok(value),
                Ok(FrameEvent::Reject { error, .. }) => return Err(PreviewError::Remote(error)),
                _ => continue,
            }
        }
        Err(PreviewError::ChannelClosed)
    };

    tokio::time::timeout(timeout, reply)
        .await
        .map_err(|_| PreviewError::CallTimeout {
            function: function.to_string(),
            timeout,
        })?
}
