//! Command-line interface module.

mod args;
pub mod replay;
pub mod watch;

pub use args::{Cli, Commands};

use boxcutter::HostChannel;
use boxcutter::protocol::Envelope;
use tokio::task::JoinHandle;

/// Print every envelope on `channel` to stdout as one JSON line.
///
/// `>` marks host-to-frame traffic, `<` frame-to-host.
pub fn print_traffic(channel: &HostChannel) -> JoinHandle<()> {
    let mut outbound = channel.traffic();
    let mut inbound = channel.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(envelope) = outbound.recv() => print_line('>', &envelope),
                Some(envelope) = inbound.recv() => print_line('<', &envelope),
                else => break,
            }
        }
    })
}

fn print_line(direction: char, envelope: &Envelope) {
    println!("{direction} {}", envelope.to_json());
}
