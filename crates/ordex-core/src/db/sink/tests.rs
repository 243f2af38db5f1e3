use crate::{
    db::sink::{Collector, Counter, FnSink, Flow, Paginator, Sink},
    error::{ErrorOrigin, InternalError},
    test_support::Item,
    traits::EntityCodec,
};

fn payloads(n: usize) -> Vec<Vec<u8>> {
    (0..n)
        .map(|i| {
            Item::new(&format!("id{i}"), &format!("tag{i}"))
                .marshal()
                .expect("encode item")
        })
        .collect()
}

// Feed payloads until the sink stops; returns how many were offered.
fn drive(sink: &mut dyn Sink, payloads: &[Vec<u8>]) -> usize {
    let mut offered = 0;
    for raw in payloads {
        offered += 1;
        if sink.accept(raw).expect("accept").is_stop() {
            break;
        }
    }

    offered
}

#[test]
fn collector_decodes_in_arrival_order() {
    let mut collector = Collector::<Item>::new(1024);
    drive(&mut collector, &payloads(3));

    let ids: Vec<_> = collector.into_items().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec!["id0", "id1", "id2"]);
}

#[test]
fn collector_reports_decode_failures() {
    let mut collector = Collector::<Item>::new(1024);
    let err = collector.accept(b"not json").unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Serialize);
    assert!(err.message.starts_with("failed to unmarshal storable"));
}

#[test]
fn collector_enforces_payload_ceiling() {
    let mut collector = Collector::<Item>::new(4);
    let err = collector.accept(&payloads(1)[0]).unwrap_err();

    assert!(err.is_validation());
    assert!(collector.is_empty());
}

#[test]
fn counter_never_stops() {
    let mut counter = Counter::new();
    let offered = drive(&mut counter, &payloads(5));

    assert_eq!(offered, 5);
    assert_eq!(counter.count(), 5);
}

#[test]
fn paginator_skips_then_stops_once_limit_is_spent() {
    let mut paged = Paginator::new(Counter::new(), 2, 2);
    let offered = drive(&mut paged, &payloads(10));

    assert_eq!(offered, 4, "scan must halt right after the last forwarded row");
    assert_eq!(paged.into_inner().count(), 2);
}

#[test]
fn paginator_zero_zero_is_identity() {
    let mut paged = Paginator::new(Counter::new(), 0, 0);
    let offered = drive(&mut paged, &payloads(6));

    assert_eq!(offered, 6);
    assert_eq!(paged.into_inner().count(), 6);
}

#[test]
fn paginator_zero_limit_only_skips() {
    let mut paged = Paginator::new(Counter::new(), 4, 0);
    drive(&mut paged, &payloads(6));

    assert_eq!(paged.into_inner().count(), 2);
}

#[test]
fn paginator_propagates_inner_stop() {
    let mut calls = 0;
    let inner = FnSink(|_: &[u8]| -> Result<Flow, InternalError> {
        calls += 1;
        Ok(if calls == 2 { Flow::Stop } else { Flow::Continue })
    });
    let mut paged = Paginator::new(inner, 1, 10);
    let offered = drive(&mut paged, &payloads(10));

    assert_eq!(offered, 3);
}

#[test]
fn paginator_wraps_borrowed_sinks() {
    let mut collector = Collector::<Item>::new(1024);
    {
        let mut paged = Paginator::new(&mut collector as &mut dyn Sink, 1, 1);
        drive(&mut paged, &payloads(3));
    }

    assert_eq!(collector.into_items()[0].id, "id1");
}
