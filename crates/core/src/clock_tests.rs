use super::*;
use chrono::TimeZone;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance(Duration::seconds(90));
    assert_eq!(clock.now() - start, Duration::seconds(90));
}

#[test]
fn fake_clock_can_be_set() {
    let clock = FakeClock::new();
    let target = Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).single();
    let target = match target {
        Some(t) => t,
        None => panic!("invalid test timestamp"),
    };
    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::seconds(10));
    assert_eq!(clock.now(), other.now());
}

#[test]
fn iso_rendering_matches_export_format() {
    let time = Utc.with_ymd_and_hms(2021, 1, 1, 12, 30, 5).single();
    assert_eq!(
        utc_to_iso(time),
        Some("2021-01-01T12:30:05Z".to_string())
    );
    assert_eq!(utc_to_iso(None), None);
}
