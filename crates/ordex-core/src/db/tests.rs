use crate::{
    config::DbConfig,
    db::{
        Db,
        query::Bound,
        sink::{Flow, FnSink},
        store::{MemoryStore, ReadTx, WriteTx},
    },
    error::{ErrorClass, InternalError},
    obs::{metrics_report, metrics_reset_all},
    test_support::{
        ACCOUNT_REGION, ACCOUNT_TIER, Account, ITEM_TAG, Item, item_db, item_ids, provisioned_db,
    },
    traits::EntityCodec,
};
use proptest::prelude::*;

fn list(db: &Db<MemoryStore>, bounds: &[Bound]) -> Result<Vec<Item>, InternalError> {
    db.view(|r| r.list::<Item>(bounds))
}

// ----------------------------------------------------------------------------
// Point lookups
// ----------------------------------------------------------------------------

#[test]
fn put_then_get_round_trips() {
    let db = provisioned_db();
    let account = Account::new("a1", "eu", Some("gold"));

    db.update(|w| w.put(&account)).expect("put");

    let loaded: Account = db.view(|r| r.get(b"a1")).expect("get");
    assert_eq!(loaded, account);
}

#[test]
fn get_reports_missing_and_empty_keys() {
    let db = item_db(&[("id1", "v1")]);

    let err = db.view(|r| r.get::<Item>(b"id9")).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message, "data key not found: id9");

    let err = db.view(|r| r.get::<Item>(b"")).unwrap_err();
    assert_eq!(err.class, ErrorClass::Validation);
}

#[test]
fn point_lookups_require_provisioning() {
    let db = Db::new(MemoryStore::new());

    assert!(db.view(|r| r.get::<Item>(b"id1")).unwrap_err().is_fatal());
    assert!(db.view(|r| r.first::<Item>()).unwrap_err().is_fatal());
    assert!(db.view(|r| r.master_record::<Item>(b"id1")).unwrap_err().is_fatal());
}

#[test]
fn first_and_last_follow_key_order() {
    let db = item_db(&[("id2", "v1"), ("id3", "v1"), ("id1", "v9")]);

    let first: Item = db.view(|r| r.first()).expect("first");
    let last: Item = db.view(|r| r.last()).expect("last");

    assert_eq!(first.id, "id1");
    assert_eq!(last.id, "id3");
}

#[test]
fn first_and_last_on_empty_namespace_are_not_found() {
    let db = provisioned_db();

    assert!(db.view(|r| r.first::<Item>()).unwrap_err().is_not_found());
    assert!(db.view(|r| r.last::<Item>()).unwrap_err().is_not_found());
}

#[test]
fn first_by_honours_bounds_and_page() {
    let db = item_db(&[("id1", "v1"), ("id2", "v2"), ("id3", "v2")]);

    let hit: Item = db
        .view(|r| r.first_by(&[Bound::exact(ITEM_TAG.value("v2"))]))
        .expect("first_by");
    assert_eq!(hit.id, "id2");

    let hit: Item = db
        .view(|r| r.first_by(&[Bound::exact(ITEM_TAG.value("v2")), Bound::page(1, 0)]))
        .expect("first_by");
    assert_eq!(hit.id, "id3");

    let err = db
        .view(|r| r.first_by::<Item>(&[Bound::exact(ITEM_TAG.value("v7"))]))
        .unwrap_err();
    assert!(err.is_not_found());
}

// ----------------------------------------------------------------------------
// Bounded reads
// ----------------------------------------------------------------------------

#[test]
fn full_scan_with_page_one_one_returns_the_middle_row() {
    let db = item_db(&[("id1", "v1"), ("id2", "v1"), ("id3", "v1")]);

    let items = list(&db, &[Bound::page(1, 1)]).expect("list");

    assert_eq!(item_ids(&items), ["id2"]);
}

#[test]
fn where_returns_members_in_key_order() {
    let db = item_db(&[("id3", "v2"), ("id1", "v1"), ("id2", "v2")]);

    let items = list(&db, &[Bound::exact(ITEM_TAG.value("v2"))]).expect("list");

    assert_eq!(item_ids(&items), ["id2", "id3"]);
}

#[test]
fn every_entity_appears_once_under_its_value() {
    let rows = [("id1", "v1"), ("id2", "v2"), ("id3", "v1"), ("id4", "v3")];
    let db = item_db(&rows);

    for (id, tag) in rows {
        let items = list(&db, &[Bound::exact(ITEM_TAG.value(tag))]).expect("list");
        assert_eq!(items.iter().filter(|i| i.id == id).count(), 1, "{id}");
    }
    assert_eq!(list(&db, &[Bound::by(&ITEM_TAG)]).expect("by").len(), rows.len());
}

#[test]
fn reindex_moves_the_entity_between_values() {
    let db = item_db(&[("id1", "v1")]);
    db.update(|w| w.put(&Item::new("id1", "v2"))).expect("reindex");

    assert!(list(&db, &[Bound::exact(ITEM_TAG.value("v1"))]).expect("v1").is_empty());
    assert_eq!(
        item_ids(&list(&db, &[Bound::exact(ITEM_TAG.value("v2"))]).expect("v2")),
        ["id1"]
    );

    let record = db
        .view(|r| r.master_record::<Item>(b"id1"))
        .expect("view")
        .expect("record");
    assert_eq!(record.get("item_tag"), Some(&b"v2".to_vec()));
}

#[test]
fn range_is_inclusive_and_to_only_matches_open_range() {
    let db = item_db(&[("id1", "v1"), ("id2", "v2"), ("id3", "v3"), ("id4", "v4")]);

    let between = list(
        &db,
        &[Bound::gte(ITEM_TAG.value("v2")), Bound::lte(ITEM_TAG.value("v3"))],
    )
    .expect("between");
    assert_eq!(item_ids(&between), ["id2", "id3"]);

    let to_only = list(&db, &[Bound::lte(ITEM_TAG.value("v2"))]).expect("to");
    let open_from = list(&db, &[Bound::range(&ITEM_TAG, None, Some(b"v2".to_vec()))])
        .expect("range");
    assert_eq!(to_only, open_from);
    assert_eq!(item_ids(&to_only), ["id1", "id2"]);

    let from_only = list(&db, &[Bound::gte(ITEM_TAG.value("v3"))]).expect("from");
    assert_eq!(item_ids(&from_only), ["id3", "id4"]);
}

#[test]
fn sideless_range_lists_like_by() {
    let db = item_db(&[("id1", "v2"), ("id2", "v1"), ("id3", "v2")]);

    let by = list(&db, &[Bound::by(&ITEM_TAG)]).expect("by");
    let range = list(&db, &[Bound::range(&ITEM_TAG, None, None)]).expect("range");

    assert_eq!(by, range);
    assert_eq!(item_ids(&by), ["id2", "id1", "id3"]);
}

#[test]
fn absent_member_set_is_empty_and_missing_index_is_an_error() {
    let db = item_db(&[("id1", "v1")]);

    assert!(list(&db, &[Bound::exact(ITEM_TAG.value("v9"))]).expect("list").is_empty());

    db.update(|w| w.tx_mut().delete_namespace(&[b"item_tag"]))
        .expect("drop index");
    let err = list(&db, &[Bound::exact(ITEM_TAG.value("v1"))]).unwrap_err();
    assert!(err.is_index_not_found());
}

#[test]
fn invalid_bounds_surface_as_query_errors() {
    let db = item_db(&[("id1", "v1")]);

    let err = list(
        &db,
        &[Bound::exact(ITEM_TAG.value("v1")), Bound::by(&ITEM_TAG)],
    )
    .unwrap_err();

    assert_eq!(err.class, ErrorClass::Unsupported);
}

#[test]
fn bounds_only_see_their_own_entity_kind() {
    let db = provisioned_db();
    db.update(|w| {
        w.put(&Account::new("a1", "eu", Some("gold")))?;
        w.put(&Account::new("a2", "us", None))?;
        w.put(&Account::new("a3", "eu", None))?;
        w.put(&Item::new("i1", "eu"))
    })
    .expect("seed");

    let eu: Vec<Account> = db
        .view(|r| r.list(&[Bound::exact(ACCOUNT_REGION.value("eu"))]))
        .expect("list");
    let gold: Vec<Account> = db
        .view(|r| r.list(&[Bound::by(&ACCOUNT_TIER)]))
        .expect("list");

    assert_eq!(eu.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), ["a1", "a3"]);
    assert_eq!(gold.len(), 1);
    assert_eq!(db.view(|r| r.count::<Account>(&[])).expect("count"), 3);
}

#[test]
fn count_applies_the_page() {
    let db = item_db(&[("id1", "v1"), ("id2", "v1"), ("id3", "v1"), ("id4", "v2")]);

    let count = db
        .view(|r| r.count::<Item>(&[Bound::exact(ITEM_TAG.value("v1")), Bound::page(1, 0)]))
        .expect("count");

    assert_eq!(count, 2);
}

#[test]
fn scan_drives_a_caller_sink_until_it_stops() {
    let db = item_db(&[("id1", "v1"), ("id2", "v1"), ("id3", "v1")]);

    let mut seen = Vec::new();
    let forwarded = db
        .view(|r| {
            let mut sink = FnSink(|raw: &[u8]| -> Result<Flow, InternalError> {
                seen.push(Item::unmarshal(raw)?.id);
                Ok(if seen.len() == 2 { Flow::Stop } else { Flow::Continue })
            });
            r.scan::<Item>(&[], &mut sink)
        })
        .expect("scan");

    assert_eq!(forwarded, 2);
    assert_eq!(seen, ["id1", "id2"]);
}

// ----------------------------------------------------------------------------
// Transactions
// ----------------------------------------------------------------------------

#[test]
fn writer_reader_sees_uncommitted_rows() {
    let db = provisioned_db();

    db.update(|w| {
        w.put(&Item::new("id1", "v1"))?;
        let inside: Item = w.reader().get(b"id1")?;
        assert_eq!(inside.tag, "v1");

        Ok(())
    })
    .expect("update");
}

#[test]
fn failed_update_is_invisible() {
    let db = item_db(&[("id1", "v1")]);

    let err = db
        .update(|w| {
            w.put(&Item::new("id1", "v2"))?;
            w.put(&Item::new("id2", "v2"))?;
            Err::<(), _>(InternalError::store_internal("caller abort"))
        })
        .unwrap_err();
    assert_eq!(err.message, "caller abort");

    let items = list(&db, &[]).expect("list");
    assert_eq!(items, vec![Item::new("id1", "v1")]);
}

#[test]
fn oversized_stored_payload_is_rejected_on_read() {
    let db = item_db(&[("id1", "a much longer tag value than the ceiling allows")]);
    let small = Db::with_config(
        MemoryStore::new(),
        DbConfig::default().max_payload_bytes(16),
    )
    .expect("config");
    let raw = db
        .view(|r| r.tx().get(&[b"item"], b"id1"))
        .expect("view")
        .expect("row");
    small.provision::<Item>().expect("provision");
    small
        .update(|w| w.tx_mut().put(&[b"item"], b"id1", &raw))
        .expect("seed raw");

    let err = small.view(|r| r.list::<Item>(&[])).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn provision_is_idempotent() {
    let db = item_db(&[("id1", "v1")]);
    db.provision::<Item>().expect("provision again");

    assert_eq!(list(&db, &[]).expect("list").len(), 1);
}

#[test]
fn debug_handle_behaves_the_same() {
    let db = Db::new(MemoryStore::new()).debug();
    assert!(db.config().debug);
    db.provision::<Item>().expect("provision");
    db.update(|w| w.put(&Item::new("id1", "v1"))).expect("put");

    assert_eq!(list(&db, &[Bound::by(&ITEM_TAG)]).expect("list").len(), 1);
}

// ----------------------------------------------------------------------------
// Metrics
// ----------------------------------------------------------------------------

#[test]
fn executors_feed_metrics() {
    let db = item_db(&[("id1", "v1"), ("id2", "v1"), ("id3", "v2")]);
    metrics_reset_all();

    db.update(|w| w.put(&Item::new("id1", "v2"))).expect("put");
    let _ = list(&db, &[Bound::exact(ITEM_TAG.value("v1")), Bound::page(0, 1)]).expect("list");

    let counters = metrics_report().counters.expect("counters");
    assert_eq!(counters.ops.save_calls, 1);
    assert_eq!(counters.ops.index_inserts, 1);
    assert_eq!(counters.ops.index_removes, 1);
    assert_eq!(counters.ops.master_index_inserts, 1);
    assert_eq!(counters.ops.master_index_removes, 1);
    assert_eq!(counters.ops.load_calls, 1);
    assert_eq!(counters.ops.plan_where, 1);
    assert_eq!(counters.ops.rows_scanned, 1);
    assert_eq!(counters.ops.rows_loaded, 1);
}

#[test]
fn disabled_metrics_record_nothing() {
    let db = Db::with_config(MemoryStore::new(), DbConfig::default().metrics(false))
        .expect("config");
    db.provision::<Item>().expect("provision");
    metrics_reset_all();

    db.update(|w| w.put(&Item::new("id1", "v1"))).expect("put");
    let _ = list(&db, &[]).expect("list");

    let counters = metrics_report().counters.expect("counters");
    assert_eq!(counters.ops.save_calls, 0);
    assert_eq!(counters.ops.load_calls, 0);
    assert!(counters.entities.is_empty());
}

// ----------------------------------------------------------------------------
// Pagination composition
// ----------------------------------------------------------------------------

// Expected window of `all` under `Page::new(skip, limit)`.
fn window<T>(all: &[T], skip: usize, limit: usize) -> &[T] {
    let start = skip.min(all.len());
    let end = if limit == 0 {
        all.len()
    } else {
        (start + limit).min(all.len())
    };

    &all[start..end]
}

// Every scan strategy over `item_tag`, each paired with its unpaged form.
fn strategies() -> Vec<Vec<Bound>> {
    vec![
        vec![],
        vec![Bound::by(&ITEM_TAG)],
        vec![Bound::exact(ITEM_TAG.value("t1"))],
        vec![Bound::gte(ITEM_TAG.value("t1"))],
        vec![Bound::lte(ITEM_TAG.value("t2"))],
        vec![
            Bound::gte(ITEM_TAG.value("t1")),
            Bound::lte(ITEM_TAG.value("t2")),
        ],
        vec![Bound::range(&ITEM_TAG, Some(b"t1".to_vec()), Some(b"t2".to_vec()))],
    ]
}

#[test]
fn pages_cross_member_set_boundaries() {
    let db = item_db(&[
        ("id1", "a"),
        ("id2", "b"),
        ("id3", "a"),
        ("id4", "c"),
        ("id5", "b"),
    ]);

    let by = list(&db, &[Bound::by(&ITEM_TAG), Bound::page(1, 2)]).expect("by");
    assert_eq!(item_ids(&by), ["id3", "id2"]);

    let range = list(
        &db,
        &[
            Bound::range(&ITEM_TAG, Some(b"a".to_vec()), Some(b"b".to_vec())),
            Bound::page(1, 2),
        ],
    )
    .expect("range");
    assert_eq!(item_ids(&range), ["id3", "id2"]);

    let tail = list(&db, &[Bound::gte(ITEM_TAG.value("b")), Bound::page(1, 0)]).expect("tail");
    assert_eq!(item_ids(&tail), ["id5", "id4"]);

    let member = list(&db, &[Bound::exact(ITEM_TAG.value("b")), Bound::page(1, 1)]).expect("where");
    assert_eq!(item_ids(&member), ["id5"]);
}

proptest! {
    #[test]
    fn page_selects_the_matching_slice_of_every_scan(
        tags in prop::collection::vec(0u8..4, 0..12),
        skip in 0usize..15,
        limit in 0usize..15,
    ) {
        let seed: Vec<(String, String)> = tags
            .iter()
            .enumerate()
            .map(|(i, tag)| (format!("id{i:02}"), format!("t{tag}")))
            .collect();
        let rows: Vec<(&str, &str)> = seed.iter().map(|(id, tag)| (id.as_str(), tag.as_str())).collect();
        let db = item_db(&rows);

        for bounds in strategies() {
            let all = list(&db, &bounds).expect("unpaged");
            let mut paged_bounds = bounds.clone();
            paged_bounds.push(Bound::page(skip, limit));
            let paged = list(&db, &paged_bounds).expect("paged");

            prop_assert_eq!(&paged[..], window(&all, skip, limit), "{:?}", bounds);
        }
    }
}
