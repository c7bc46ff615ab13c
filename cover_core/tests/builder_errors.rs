use std::sync::Arc;
use std::time::Duration;

use cover_core::error::BuildError;
use cover_core::mocks::{RecordingPublisher, RecordingStore};
use cover_core::{ControllerCfg, Cover, CoverError, CoverSet, CoverSpec};
use cover_traits::clock::test_clock::TestClock;
use rstest::rstest;

fn spec() -> CoverSpec {
    CoverSpec::new("garage", "garage/set", Duration::from_secs(20))
}

#[rstest]
fn builder_missing_spec_yields_typed_build_error() {
    let err = Cover::builder()
        // missing with_spec()
        .with_publisher(RecordingPublisher::new())
        .with_store(RecordingStore::new())
        .try_build()
        .expect_err("should fail with MissingSpec");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingSpec) => {}
        other => panic!("expected MissingSpec, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_store_yields_typed_build_error() {
    let err = Cover::builder()
        .with_spec(spec())
        .with_publisher(RecordingPublisher::new())
        .try_build()
        .expect_err("should fail with MissingStore");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingStore)
    ));
}

#[rstest]
#[case::empty_id(|s: &mut CoverSpec| s.id.clear(), "id")]
#[case::blank_topic(|s: &mut CoverSpec| s.command_topic = "  ".into(), "topic")]
#[case::empty_stop(|s: &mut CoverSpec| s.stop_payload.clear(), "payloads")]
fn builder_rejects_invalid_spec(#[case] mutate: fn(&mut CoverSpec), #[case] needle: &str) {
    let mut s = spec();
    mutate(&mut s);
    let err = Cover::builder()
        .with_spec(s)
        .with_publisher(RecordingPublisher::new())
        .with_store(RecordingStore::new())
        .build()
        .expect_err("invalid spec");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn builder_rejects_zero_tick() {
    let err = Cover::builder()
        .with_spec(spec())
        .with_timing(ControllerCfg {
            tick: Duration::ZERO,
            ..ControllerCfg::default()
        })
        .with_publisher(RecordingPublisher::new())
        .with_store(RecordingStore::new())
        .build()
        .expect_err("zero tick");
    assert!(format!("{err}").contains("tick"));
}

const TWO_COVERS: &str = r#"
[store]
path = "unused.json"

[covers.kitchen]
opening_time = 9000
mqtt_command_topic = "kitchen/set"
mqtt_payload_open = "OPEN"
mqtt_payload_close = "CLOSE"
mqtt_payload_stop = "STOP"

[covers.bedroom]
unique_id = "bed_1"
name = "Bedroom"
opening_time = 14000
closing_time = 12000
mqtt_command_topic = "bedroom/set"
mqtt_payload_open = "OPEN"
mqtt_payload_close = "CLOSE"
mqtt_payload_stop = "STOP"
"#;

#[rstest]
fn cover_set_builds_and_restores_every_cover() {
    let cfg = cover_config::load_toml(TWO_COVERS).expect("config");
    let store = RecordingStore::new().with_position("bed_1", 55);
    let set = CoverSet::load(
        &cfg,
        Arc::new(RecordingPublisher::new()),
        Arc::new(store),
        Arc::new(TestClock::new()),
    )
    .expect("cover set");

    assert_eq!(set.ids().collect::<Vec<_>>(), vec!["bed_1", "kitchen"]);
    let bedroom = set.cover("bed_1").expect("bedroom");
    assert_eq!(bedroom.name(), "Bedroom");
    assert_eq!(bedroom.position(), Some(55));
    assert_eq!(bedroom.spec().closing_time, Duration::from_secs(12));
    assert_eq!(set.cover("kitchen").expect("kitchen").position(), Some(0));
    assert!(set.states().iter().all(|st| st.position.is_some()));
}

#[rstest]
fn cover_set_reports_unknown_ids() {
    let cfg = cover_config::load_toml(TWO_COVERS).expect("config");
    let set = CoverSet::from_config(
        &cfg,
        Arc::new(RecordingPublisher::new()),
        Arc::new(RecordingStore::new()),
        Arc::new(TestClock::new()),
    )
    .expect("cover set");

    let err = set.cover("attic").expect_err("unknown");
    assert_eq!(
        err.downcast_ref::<CoverError>(),
        Some(&CoverError::UnknownCover("attic".into()))
    );
    assert!(set.get("kitchen").is_some());
    assert_eq!(set.len(), 2);
}

#[rstest]
fn covers_in_a_set_move_independently() {
    let cfg = cover_config::load_toml(TWO_COVERS).expect("config");
    let publisher = RecordingPublisher::new();
    let set = CoverSet::load(
        &cfg,
        Arc::new(publisher.clone()),
        Arc::new(RecordingStore::new()),
        Arc::new(TestClock::new()),
    )
    .expect("cover set");

    set.cover("kitchen").expect("kitchen").open();

    assert_eq!(set.cover("kitchen").expect("kitchen").position(), Some(100));
    assert_eq!(set.cover("bed_1").expect("bedroom").position(), Some(0));
    assert!(publisher.topics().iter().all(|t| t == "kitchen/set"));
}
