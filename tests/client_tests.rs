// Query/set behaviour of OscClient against a scripted mixer on loopback.
mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use assert2::{assert, check, let_assert};
use crossbeam_channel::unbounded;
use float_cmp::approx_eq;
use rosc::OscType;

use common::{FakeMixer, Reply, msg};
use xair_osc::params::presets;
use xair_osc::traits::Bind;
use xair_osc::{OscClient, OscError, Parameter, UnitValue};

fn client_for(mixer: &FakeMixer) -> OscClient {
    OscClient::connect(mixer.addr)
        .unwrap()
        .with_query_timeout(Duration::from_millis(500))
}

#[test]
fn query_returns_the_reply() {
    let mixer = FakeMixer::start();
    mixer.value("/ch/01/mix/fader", vec![OscType::Float(0.75)]);
    let client = client_for(&mixer);

    let reply = client.query("/ch/01/mix/fader").unwrap();
    check!(reply.addr == "/ch/01/mix/fader");
    check!(reply.args == vec![OscType::Float(0.75)]);

    let (probe, _) = mixer.next_received();
    check!(probe.args.is_empty());
    check!(client.socket().listener_count("/ch/01/mix/fader") == 0);
}

#[test]
fn only_the_first_reply_is_observed() {
    let mixer = FakeMixer::start();
    mixer.reply(
        "/ch/03/mix/on",
        Reply::With(vec![vec![OscType::Int(1)], vec![OscType::Int(0)]]),
    );
    let client = client_for(&mixer);

    let reply = client.query("/ch/03/mix/on").unwrap();
    check!(reply.args == vec![OscType::Int(1)]);
    thread::sleep(Duration::from_millis(50));
    check!(client.socket().listener_count("/ch/03/mix/on") == 0);
}

#[test]
fn set_sends_without_waiting() {
    let mixer = FakeMixer::start();
    mixer.reply("/lr/mix/fader", Reply::Silent);
    let client = client_for(&mixer);

    client
        .set("/lr/mix/fader", vec![OscType::Float(0.25)])
        .unwrap();
    let (message, from) = mixer.next_received();
    check!(message == msg("/lr/mix/fader", vec![OscType::Float(0.25)]));
    check!(from.port() == client.socket().local_addr().unwrap().port());
}

#[test]
fn unanswered_query_times_out_and_cleans_up() {
    let mixer = FakeMixer::start();
    mixer.reply("/ch/01/mix/pan", Reply::Silent);
    let client = OscClient::connect(mixer.addr)
        .unwrap()
        .with_query_timeout(Duration::from_millis(100));

    let result = client.query("/ch/01/mix/pan");
    assert!(let Err(OscError::Timeout { .. }) = result);
    check!(client.socket().listener_count("/ch/01/mix/pan") == 0);
}

#[test]
fn concurrent_queries_resolve_independently() {
    let mixer = FakeMixer::start();
    mixer.value("/ch/01/mix/fader", vec![OscType::Float(0.1)]);
    mixer.value("/ch/02/mix/fader", vec![OscType::Float(0.2)]);
    let client = Arc::new(client_for(&mixer));

    let handles: Vec<_> = [("/ch/01/mix/fader", 0.1f32), ("/ch/02/mix/fader", 0.2f32)]
        .into_iter()
        .map(|(address, expected)| {
            let client = client.clone();
            thread::spawn(move || {
                let reply = client.query(address).unwrap();
                reply.args == vec![OscType::Float(expected)]
            })
        })
        .collect();
    for handle in handles {
        check!(handle.join().unwrap());
    }
}

#[test]
fn query_after_close_fails() {
    let mixer = FakeMixer::start();
    let client = client_for(&mixer);
    client.close().unwrap();
    let result = client.query("/ch/01/mix/fader");
    assert!(let Err(OscError::Closed) = result);
}

#[test]
fn linear_parameter_reads_in_decibels() {
    let mixer = FakeMixer::start();
    mixer.value("/ch/01/dyn/thr", vec![OscType::Float(0.5)]);
    let client = Arc::new(client_for(&mixer));
    let threshold = Parameter::new(client, "/ch/01/dyn/thr", presets::dyn_threshold());

    let value = threshold.fetch_unit(presets::DECIBELS).unwrap();
    let_assert!(UnitValue::Number(db) = value);
    check!(approx_eq!(f64, db, -30.0, epsilon = 1e-4));
}

#[test]
fn logarithmic_parameter_writes_the_normalised_value() {
    let mixer = FakeMixer::start();
    let client = Arc::new(client_for(&mixer));
    let mapper = Arc::new(
        xair_osc::params::LogarithmicMapper::new(0.02, 2000.0, presets::MILLISECONDS).unwrap(),
    );
    let attack = Parameter::new(client, "/ch/01/gate/attack", mapper);

    attack.update_unit(presets::MILLISECONDS, 120.0).unwrap();
    let (message, _) = mixer.next_received();
    let_assert!([OscType::Float(raw)] = message.args.as_slice());
    check!(approx_eq!(f32, *raw, 0.7556, epsilon = 1e-3));
}

#[test]
fn out_of_range_update_never_reaches_the_mixer() {
    let mixer = FakeMixer::start();
    let client = Arc::new(client_for(&mixer));
    let fader = Parameter::new(client, "/ch/01/mix/fader", presets::fader());

    let result = fader.update_raw(OscType::Float(1.5));
    assert!(let Err(OscError::Validation { .. }) = result);
    check!(mixer.nothing_received(Duration::from_millis(100)));
}

#[test]
fn bound_parameter_sees_pushed_values() {
    let mixer = FakeMixer::start();
    let client = Arc::new(client_for(&mixer));
    let fader = Parameter::new(client.clone(), "/ch/05/mix/fader", presets::fader());

    let (tx, rx) = unbounded();
    let id = fader
        .bind(move |raw| {
            tx.send(raw).unwrap();
        })
        .unwrap();
    client.xremote().unwrap();
    let (subscribe, from) = mixer.next_received();
    check!(subscribe.addr == "/xremote");

    mixer.push(from, &msg("/ch/05/mix/fader", vec![OscType::Float(0.6)]));
    check!(rx.recv_timeout(Duration::from_millis(500)).unwrap() == OscType::Float(0.6));

    fader.unbind(id);
    check!(client.socket().listener_count("/ch/05/mix/fader") == 0);
}

#[test]
fn closing_releases_a_query_without_timeout() {
    let mixer = FakeMixer::start();
    mixer.reply("/ch/09/mix/fader", Reply::Silent);
    let client = Arc::new(OscClient::connect(mixer.addr).unwrap());

    let waiting = {
        let client = client.clone();
        thread::spawn(move || client.query("/ch/09/mix/fader"))
    };
    mixer.next_received();
    client.close().unwrap();

    let result = waiting.join().unwrap();
    assert!(let Err(OscError::Closed) = result);
}

#[test]
fn concurrent_queries_on_one_address_both_resolve() {
    let mixer = FakeMixer::start();
    mixer.value("/lr/mix/fader", vec![OscType::Float(0.75)]);
    let client = Arc::new(client_for(&mixer));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let client = client.clone();
            thread::spawn(move || client.query("/lr/mix/fader"))
        })
        .collect();
    for handle in handles {
        let reply = handle.join().unwrap().unwrap();
        check!(reply.args == vec![OscType::Float(0.75)]);
    }
    check!(client.socket().listener_count("/lr/mix/fader") == 0);
}

#[test]
fn reply_dispatched_at_the_deadline_is_still_returned() {
    let mixer = FakeMixer::start();
    mixer.value("/ch/04/mix/fader", vec![OscType::Float(0.4)]);
    let client = OscClient::connect(mixer.addr)
        .unwrap()
        .with_query_timeout(Duration::from_millis(100));
    // Registered first, so it holds up dispatch of the reply past the timeout.
    client.on("/ch/04/mix/fader", |_, _| {
        thread::sleep(Duration::from_millis(300));
        Ok(())
    });

    let reply = client.query("/ch/04/mix/fader").unwrap();
    check!(reply.args == vec![OscType::Float(0.4)]);
}

#[test]
fn bad_pushed_value_keeps_the_client_alive() {
    let mixer = FakeMixer::start();
    mixer.value("/ch/01/mix/on", vec![OscType::Int(1)]);
    let client = Arc::new(client_for(&mixer));
    let fader = Parameter::new(client.clone(), "/ch/05/mix/fader", presets::fader());

    let (tx, rx) = unbounded();
    fader
        .bind(move |raw| {
            tx.send(raw).unwrap();
        })
        .unwrap();
    client.xremote().unwrap();
    let (_, from) = mixer.next_received();

    mixer.push(from, &msg("/ch/05/mix/fader", vec![OscType::Float(1.5)]));
    mixer.push(
        from,
        &msg("/ch/05/mix/fader", vec![OscType::Float(0.1), OscType::Float(0.2)]),
    );
    mixer.push(from, &msg("/ch/05/mix/fader", vec![OscType::Float(0.6)]));
    check!(rx.recv_timeout(Duration::from_millis(500)).unwrap() == OscType::Float(0.6));
    check!(rx.try_recv().is_err());

    check!(!client.socket().is_closed());
    let reply = client.query("/ch/01/mix/on").unwrap();
    check!(reply.args == vec![OscType::Int(1)]);
}
