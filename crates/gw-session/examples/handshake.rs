//! Two in-process panes playing host and embedded guest.
//!
//! The guest announces itself, the host answers with an init payload,
//! and the guest acknowledges. Run with `RUST_LOG=trace` to watch the
//! envelopes move.

use serde_json::json;

use gw_bus::callback;
use gw_session::link::{link, Pane};
use gw_session::{EndpointConfig, Session};

fn main() {
    gw_telemetry::init_logging("debug");

    let host = Pane::new("https://host.example");
    let guest = Pane::new("https://guest.example");
    link(&host, &guest);

    let host_session = Session::open(
        host.clone(),
        vec![EndpointConfig::port(guest.port_for(&host)).from("https://guest.example")],
    )
    .expect("host session");
    let guest_session = Session::open(guest.clone(), vec![]).expect("guest session");

    host_session.on(
        "ready",
        callback(move |_| tracing::info!("host: guest is ready")),
        None,
    );
    guest_session.on(
        "init",
        callback(move |args| tracing::info!(payload = %args[0], "guest: initialized")),
        None,
    );

    guest_session.trigger("ready", &[]);
    host.pump();

    host_session.trigger("init", &[json!({"token": "abc123", "locale": "en"})]);
    guest.pump();

    tracing::info!(
        host_sent = host_session.stats().sent,
        guest_received = guest_session.stats().delivered,
        "handshake complete"
    );

    guest_session.end();
    host_session.end();
}
