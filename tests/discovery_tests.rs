// Discovery against a fake mixer answering `/xinfo` on a loopback port.
mod common;

use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use assert2::{assert, check};
use rosc::OscType;

use common::{FakeMixer, Reply};
use xair_osc::{DiscoveryOptions, MixerDiscoverer, MixerModel, OscError};

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn s(value: &str) -> OscType {
    OscType::String(value.to_string())
}

fn options(mixer: &FakeMixer, timeout_ms: u64) -> DiscoveryOptions {
    DiscoveryOptions {
        timeout: Duration::from_millis(timeout_ms),
        broadcast_address: LOOPBACK,
        port: mixer.addr.port(),
    }
}

#[test]
fn repeated_replies_from_one_mixer_are_merged() {
    let mixer = FakeMixer::start();
    let reply = vec![s("127.0.0.1"), s("XR18-5E-91-5A"), s("XR18"), s("1.22")];
    mixer.reply("/xinfo", Reply::With(vec![reply.clone(), reply]));

    let devices = MixerDiscoverer::new()
        .unwrap()
        .discover(options(&mixer, 300))
        .unwrap();

    assert!(devices.len() == 1);
    let device = &devices[0];
    check!(device.model == MixerModel::XR18);
    check!(device.name == "XR18-5E-91-5A");
    check!(device.firmware.as_deref() == Some("1.22"));
    check!(device.socket_addr() == mixer.addr);
}

#[test]
fn unknown_models_are_ignored() {
    let mixer = FakeMixer::start();
    mixer.value("/xinfo", vec![s("127.0.0.1"), s("X32-00-00-01"), s("X32"), s("4.06")]);

    let devices = MixerDiscoverer::new()
        .unwrap()
        .discover(options(&mixer, 200))
        .unwrap();
    check!(devices.is_empty());
}

#[test]
fn malformed_reply_fails_the_call() {
    let mixer = FakeMixer::start();
    mixer.value("/xinfo", vec![OscType::Int(18)]);

    let started = Instant::now();
    let result = MixerDiscoverer::new()
        .unwrap()
        .discover(options(&mixer, 2000));
    assert!(let Err(OscError::Schema(_)) = result);
    check!(started.elapsed() < Duration::from_millis(2000));
}

#[test]
fn silence_yields_an_empty_list_after_the_timeout() {
    let mixer = FakeMixer::start();
    mixer.reply("/xinfo", Reply::Silent);

    let started = Instant::now();
    let devices = MixerDiscoverer::new()
        .unwrap()
        .discover(options(&mixer, 150))
        .unwrap();
    check!(devices.is_empty());
    check!(started.elapsed() >= Duration::from_millis(150));
}

#[test]
fn probe_is_an_argument_less_xinfo() {
    let mixer = FakeMixer::start();
    mixer.reply("/xinfo", Reply::Silent);
    MixerDiscoverer::new()
        .unwrap()
        .discover(options(&mixer, 50))
        .unwrap();

    let (probe, _) = mixer.next_received();
    check!(probe.addr == "/xinfo");
    check!(probe.args.is_empty());
}
