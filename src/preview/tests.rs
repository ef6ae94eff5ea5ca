use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::sleep;

use super::*;
use crate::protocol::{Envelope, RemoteError, ScrollPosition, Subscription};
use crate::runtime::{NoScripts, ScriptStatus, scripts};
use crate::source::Mode;

const HI: &str = "<html><body>hi</body></html>";
const BYE: &str = "<html><body>bye</body></html>";

fn tall(marker: &str) -> String {
    format!(r#"<html><body><div style="height: 3000px">{marker}</div></body></html>"#)
}

fn config(title: &str, mode: Mode) -> PreviewConfig {
    PreviewConfig {
        title: title.into(),
        mode,
        ..PreviewConfig::default()
    }
}

/// Engine understanding a few marker words in script bodies.
fn marker_scripts() -> Arc<dyn ScriptEngine> {
    scripts(|source, scope| {
        if source.contains("define-echo") {
            scope.define("echo", |data| async move { Ok(data) })?;
        }
        if source.contains("define-fail") {
            scope.define("fail", |_| async {
                Err(RemoteError::named("TypeError", "bad input"))
            })?;
        }
        if source.contains("define-hang") {
            scope.define("hang", |_| std::future::pending::<Result<Value, RemoteError>>())?;
        }
        if source.contains("define-slow") {
            scope.define("slow", |_| async {
                sleep(Duration::from_secs(2)).await;
                Ok(json!("from-old-frame"))
            })?;
        }
        if source.contains("listen-tick") {
            let emitter = scope.emitter();
            scope.add_event_listener("tick", move |data| emitter.emit("tock", data.clone()));
        }
        if source.contains("suspend") {
            return Ok(ScriptStatus::Suspended);
        }
        Ok(ScriptStatus::Settled)
    })
}

fn scripted(markers: &str) -> String {
    format!("<html><body><script>{markers}</script>ok</body></html>")
}

async fn mount(channel: &HostChannel, config: PreviewConfig, source: Source) -> Preview {
    let preview = Preview::mount(channel, config, source, marker_scripts())
        .await
        .unwrap();
    preview.settle().await;
    preview
}

/// Let frame reports reach the telemetry task.
async fn quiesce() {
    sleep(Duration::from_millis(100)).await;
}

fn sent(traffic: &mut Subscription) -> Vec<Envelope> {
    traffic.drain()
}

fn order(envelopes: &[Envelope]) -> Vec<&str> {
    envelopes.iter().map(|e| e.name.as_str()).collect()
}

fn count(envelopes: &[Envelope], name: &str) -> usize {
    envelopes.iter().filter(|e| e.name == name).count()
}

fn drain_events(rx: &mut broadcast::Receiver<PreviewEvent>) -> Vec<PreviewEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// =============================================================================
// Mount and edits
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_mount_writes_once_then_loads() {
    let channel = HostChannel::new();
    let mut traffic = channel.traffic();
    let mut inbound = channel.subscribe();

    let preview = Preview::mount(
        &channel,
        config("mount", Mode::Auto),
        Source::new("a", HI),
        Arc::new(NoScripts),
    )
    .await
    .unwrap();
    let mut events = preview.events();
    preview.settle().await;

    let out = sent(&mut traffic);
    assert_eq!(order(&out), [names::SET_FRAME_ID, names::WRITE, names::SCROLL]);

    let frame_id = preview.frame_id().clone();
    let replies: Vec<_> = inbound
        .drain()
        .into_iter()
        .filter(|e| e.is_for(&frame_id))
        .map(|e| e.name)
        .collect();
    let dcl = replies.iter().position(|n| n == names::DOM_CONTENT_LOADED);
    let load = replies.iter().position(|n| n == names::LOAD);
    assert!(dcl.is_some_and(|dcl| load.is_some_and(|load| dcl < load)));

    let state = preview.state();
    assert!(!state.loading);
    assert_eq!(state.source_id.as_deref(), Some("a"));

    let events = drain_events(&mut events);
    assert_eq!(events.first(), Some(&PreviewEvent::LoadingChanged(true)));
    assert!(matches!(events[1], PreviewEvent::FrameLoaded { .. }));
    assert_eq!(events.last(), Some(&PreviewEvent::LoadingChanged(false)));
}

#[tokio::test(start_paused = true)]
async fn test_mount_rejects_invalid_config() {
    let channel = HostChannel::new();
    let mut bad = config("", Mode::Auto);
    bad.frame.sandbox = "allow-scripts allow-same-origin".into();

    let result = Preview::mount(&channel, bad, Source::new("a", HI), Arc::new(NoScripts)).await;
    assert!(matches!(result, Err(PreviewError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_same_id_edit_patches_without_swap() {
    let channel = HostChannel::new();
    let preview = mount(&channel, config("edit", Mode::Auto), Source::new("a", HI)).await;
    let before = preview.active_frame().unwrap().instance();
    let mut traffic = channel.traffic();

    preview.set_source(Source::new("a", BYE));
    preview.settle().await;

    let out = sent(&mut traffic);
    assert_eq!(order(&out), [names::HTML_UPDATE]);
    assert!(out[0].data.as_str().is_some_and(|html| html.contains("bye")));
    assert_eq!(preview.active_frame().unwrap().instance(), before);
    assert_eq!(preview.frames().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_edits_within_debounce_coalesce() {
    let channel = HostChannel::new();
    let preview = mount(&channel, config("coalesce", Mode::Auto), Source::new("a", HI)).await;
    let mut traffic = channel.traffic();

    for i in 1..=5 {
        preview.set_source(Source::new("a", format!("<html><body>edit {i}</body></html>")));
        sleep(Duration::from_millis(50)).await;
    }
    preview.settle().await;

    let out = sent(&mut traffic);
    assert_eq!(order(&out), [names::HTML_UPDATE]);
    assert!(out[0].data.as_str().is_some_and(|html| html.contains("edit 5")));
}

#[tokio::test(start_paused = true)]
async fn test_diff_patch_strategy_sends_update() {
    let channel = HostChannel::new();
    let mut config = config("diff", Mode::Instant);
    config.sync.strategy = crate::diff::StrategyKind::DiffPatch;
    let preview = mount(&channel, config, Source::new("a", "<p>one</p>")).await;
    let mut traffic = channel.traffic();

    preview.set_source(Source::new("a", "<p>two</p>"));
    preview.settle().await;

    assert_eq!(order(&sent(&mut traffic)), [names::UPDATE]);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_patch_failures_fall_back_to_html_update() {
    let channel = HostChannel::new();
    let mut config = config("heal", Mode::Instant);
    config.sync.strategy = crate::diff::StrategyKind::DiffPatch;
    let preview = mount(&channel, config, Source::new("a", "<div><p>x</p><p>0</p></div>")).await;

    // Desync the frame from the host's baseline.
    let frame = preview.active_frame().unwrap();
    frame.publish(HostCommand::HtmlUpdate("<html><body></body></html>".into()));
    let mut traffic = channel.traffic();

    for i in 1..=3 {
        preview.set_source(Source::new("a", format!("<div><p>x</p><p>{i}</p></div>")));
        preview.settle().await;
    }
    quiesce().await;
    preview.set_source(Source::new("a", "<div><p>x</p><p>4</p></div>"));
    preview.settle().await;

    assert_eq!(
        order(&sent(&mut traffic)),
        [names::UPDATE, names::UPDATE, names::UPDATE, names::HTML_UPDATE]
    );
}

// =============================================================================
// Navigation and swap
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_instant_navigation_writes_in_place() {
    let channel = HostChannel::new();
    let preview = mount(&channel, config("nav", Mode::Auto), Source::new("a", HI)).await;
    let before = preview.active_frame().unwrap().instance();
    let mut traffic = channel.traffic();

    preview.set_source(Source::new("b", BYE));
    preview.settle().await;

    assert_eq!(order(&sent(&mut traffic)), [names::WRITE, names::SCROLL]);
    assert_eq!(preview.active_frame().unwrap().instance(), before);
    assert_eq!(preview.state().source_id.as_deref(), Some("b"));
}

#[tokio::test(start_paused = true)]
async fn test_navigation_swaps_and_resets_scroll() {
    let channel = HostChannel::new();
    let preview = mount(&channel, config("swap", Mode::Refresh), Source::new("a", tall("a"))).await;
    let old = preview.active_frame().unwrap();

    preview.input(DomInput::Scroll(ScrollPosition::new(100.0, 0.0)));
    quiesce().await;
    assert_eq!(preview.state().window.scroll, ScrollPosition::new(100.0, 0.0));

    let mut traffic = channel.traffic();
    let mut events = preview.events();
    preview.set_source(Source::new("b", tall("b")));
    preview.settle().await;
    quiesce().await;

    let out = sent(&mut traffic);
    assert_eq!(order(&out), [names::WRITE, names::SET_FRAME_ID, names::SCROLL]);
    assert_eq!(out[0].frame_id, preview.frame_id().staging());
    assert_eq!(count(&out, names::SET_FRAME_ID), 1);

    let new = preview.active_frame().unwrap();
    assert_ne!(new.instance(), old.instance());
    assert!(!old.is_attached());
    assert_eq!(preview.frames().len(), 1);
    assert_eq!(preview.state().window.scroll, ScrollPosition::ORIGIN);
    assert_eq!(preview.state().source_id.as_deref(), Some("b"));

    let events = drain_events(&mut events);
    let loaded = events
        .iter()
        .position(|e| *e == PreviewEvent::FrameLoaded { instance: new.instance() });
    let discarded = events
        .iter()
        .position(|e| *e == PreviewEvent::FrameDiscarded { instance: old.instance() });
    assert!(loaded.is_some_and(|l| discarded.is_some_and(|d| l < d)));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_edit_replays_scroll() {
    let channel = HostChannel::new();
    let preview = mount(&channel, config("replay", Mode::Refresh), Source::new("a", tall("v1"))).await;

    preview.input(DomInput::Scroll(ScrollPosition::new(300.0, 0.0)));
    quiesce().await;
    let mut traffic = channel.traffic();

    preview.set_source(Source::new("a", tall("v2")));
    preview.settle().await;
    quiesce().await;

    let out = sent(&mut traffic);
    assert_eq!(order(&out), [names::WRITE, names::SCROLL, names::SET_FRAME_ID]);
    assert_eq!(out[1].frame_id, preview.frame_id().staging());
    assert_eq!(out[1].data["scrollTop"], json!(300.0));
    assert_eq!(preview.state().window.scroll, ScrollPosition::new(300.0, 0.0));
}

#[tokio::test(start_paused = true)]
async fn test_latest_source_wins_while_loading() {
    let channel = HostChannel::new();
    let preview = mount(&channel, config("latest", Mode::Refresh), Source::new("a", tall("a"))).await;
    let mut traffic = channel.traffic();

    for id in ["b", "c", "d"] {
        preview.set_source(Source::new(id, tall(&format!("doc-{id}"))));
    }
    preview.settle().await;

    let writes: Vec<_> = sent(&mut traffic)
        .into_iter()
        .filter(|e| e.name == names::WRITE)
        .collect();
    assert_eq!(writes.len(), 2);
    assert!(writes[0].data.as_str().is_some_and(|h| h.contains("doc-b")));
    assert!(writes[1].data.as_str().is_some_and(|h| h.contains("doc-d")));
    assert_eq!(preview.state().source_id.as_deref(), Some("d"));
    assert_eq!(preview.frames().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_cancels_pending_patch() {
    let channel = HostChannel::new();
    let preview = mount(&channel, config("cancel", Mode::Auto), Source::new("a", HI)).await;
    let mut traffic = channel.traffic();

    preview.set_source(Source::new("a", BYE));
    preview.set_source(Source::new("b", "<html><body>other</body></html>"));
    preview.settle().await;
    sleep(Duration::from_secs(1)).await;

    let out = sent(&mut traffic);
    assert_eq!(count(&out, names::HTML_UPDATE), 0);
    assert_eq!(count(&out, names::WRITE), 1);
    assert_eq!(preview.state().source_id.as_deref(), Some("b"));
}

#[tokio::test(start_paused = true)]
async fn test_load_timeout_keeps_old_frame() {
    let channel = HostChannel::new();
    let mut config = config("timeout", Mode::Refresh);
    config.frame.load_timeout_ms = 500;
    let preview = mount(&channel, config, Source::new("a", HI)).await;
    let old = preview.active_frame().unwrap().instance();
    let mut events = preview.events();

    preview.set_source(Source::new("b", scripted("suspend")));
    preview.settle().await;

    let state = preview.state();
    assert!(!state.loading);
    assert_eq!(state.source_id.as_deref(), Some("a"));
    assert!(state.last_error.is_some_and(|e| e.contains("load")));
    assert_eq!(preview.active_frame().unwrap().instance(), old);
    assert_eq!(preview.frames().len(), 1);
    assert!(drain_events(&mut events)
        .iter()
        .any(|e| matches!(e, PreviewEvent::Error(_))));
}

// =============================================================================
// RPC and events
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_call_round_trip() {
    let channel = HostChannel::new();
    let preview = mount(
        &channel,
        config("rpc", Mode::Auto),
        Source::new("a", scripted("define-echo define-fail")),
    )
    .await;

    let payload = json!({ "n": 1, "list": [1, 2] });
    assert_eq!(preview.call("echo", payload.clone()).await.unwrap(), payload);

    let err = preview.call("fail", Value::Null).await.unwrap_err();
    assert_eq!(err.remote().map(|e| e.name.as_str()), Some("TypeError"));

    let err = preview.call("missing", Value::Null).await.unwrap_err();
    assert!(err.remote().is_some_and(|e| e.message.contains("missing")));
}

#[tokio::test(start_paused = true)]
async fn test_call_times_out() {
    let channel = HostChannel::new();
    let mut config = config("hang", Mode::Auto);
    config.frame.call_timeout_ms = 1000;
    let preview = mount(&channel, config, Source::new("a", scripted("define-hang"))).await;

    let err = preview.call("hang", Value::Null).await.unwrap_err();
    assert!(matches!(err, PreviewError::CallTimeout { ref function, .. } if function == "hang"));
}

#[tokio::test(start_paused = true)]
async fn test_call_dies_with_discarded_frame() {
    let channel = HostChannel::new();
    let mut config = config("slow", Mode::Auto);
    config.frame.call_timeout_ms = 5000;
    let preview = mount(&channel, config, Source::new("a", scripted("define-slow"))).await;
    let old = preview.active_frame().unwrap();

    let (result, ()) = tokio::join!(preview.call("slow", Value::Null), async {
        sleep(Duration::from_millis(10)).await;
        preview.set_source(Source::new("b", scripted("define-slow")));
        preview.settle().await;
    });

    assert!(!old.is_attached());
    assert!(matches!(result, Err(PreviewError::CallTimeout { ref function, .. }) if function == "slow"));
}

#[tokio::test(start_paused = true)]
async fn test_call_without_frame_resolves_empty() {
    let channel = HostChannel::new();
    let preview = mount(&channel, config("gone", Mode::Auto), Source::new("a", scripted("define-echo"))).await;

    preview.shutdown().await;

    assert!(preview.frames().is_empty());
    assert_eq!(preview.call("echo", json!(1)).await.unwrap(), Value::Null);
}

#[tokio::test(start_paused = true)]
async fn test_previews_on_one_channel_are_isolated() {
    let channel = HostChannel::new();
    let html = scripted("listen-tick define-echo");
    let a = mount(&channel, config("A", Mode::Auto), Source::new("doc", html.clone())).await;
    let b = mount(&channel, config("B", Mode::Auto), Source::new("doc", html)).await;
    assert_ne!(a.frame_id(), b.frame_id());

    let a_tock = a.subscribe("tock");
    let mut b_tock = b.subscribe("tock");

    a.emit("tick", json!("from a"));
    assert_eq!(a_tock.wait(Duration::from_secs(1)).await.unwrap(), json!("from a"));
    quiesce().await;
    assert_eq!(b_tock.try_next(), None);

    let (ra, rb) = tokio::join!(a.call("echo", json!("a")), b.call("echo", json!("b")));
    assert_eq!(ra.unwrap(), json!("a"));
    assert_eq!(rb.unwrap(), json!("b"));
}

#[tokio::test(start_paused = true)]
async fn test_pointer_telemetry_reaches_state() {
    let channel = HostChannel::new();
    let preview = mount(
        &channel,
        config("mouse", Mode::Auto),
        Source::new("a", r#"<html><body><button id="go">go</button></body></html>"#),
    )
    .await;

    preview.input(DomInput::Click {
        target: vec![1, 0],
        x: 4.0,
        y: 6.0,
    });
    quiesce().await;

    let mouse = preview.state().mouse;
    assert_eq!(mouse.target.as_deref(), Some("#go"));
    assert_eq!(mouse.event.as_deref(), Some(names::CLICK));
    assert!(preview.state().window.size.is_some());
}
