#![allow(clippy::unwrap_used, clippy::doc_markdown)]
//! Tests for the update path.

use chrono::TimeDelta;
use sked_rrule::{Frequency, RecurringRule};
use sked_service::error::{ServiceError, StoreError};
use sked_service::model::{EventDates, EventUpdate};
use sked_service::notify::NotificationKind;
use sked_service::ports::EventStore;
use sked_test::{Harness, MemoryStore, draft_at};

use super::helpers::*;

/// ## Summary
/// Removing the rule from occurrence #2 of 5 detaches it and spikes #3 to #5.
#[test_log::test]
fn update_without_rule_spikes_later_members() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 5);
    let second = &members[1];

    let updates = EventUpdate::default()
        .with_dates(second.dates.clone())
        .with_field("name", "One-off briefing");
    let outcome = harness
        .service()
        .update(second, &updates, Some(&editor()))
        .unwrap();

    assert_eq!(outcome.event.recurrence_id, None);
    assert_eq!(outcome.event.dates.recurring_rule, None);
    assert_eq!(outcome.event.fields["name"], "One-off briefing");
    assert_eq!(outcome.event.version_creator, Some(editor()));
    assert_eq!(
        outcome.spiked,
        members[2..].iter().map(|m| m.id.clone()).collect::<Vec<_>>()
    );
    assert_eq!(harness.spikes.spiked, outcome.spiked);
    assert!(outcome.created.is_empty() && outcome.deleted.is_empty());

    let first = harness.store.get(&members[0].id).unwrap();
    assert_eq!(first, &members[0]);
    assert_eq!(first.recurrence_id.as_ref(), Some(&recurrence_id));

    let updated = harness.notifier.of_kind(NotificationKind::Updated);
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].item, second.id.as_str());
    assert_eq!(updated[0].user, Some(editor()));
}

/// ## Summary
/// An edit without any dates still detaches a series member and spikes the later ones.
#[test_log::test]
fn update_without_dates_detaches_series_member() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 5);
    let second = &members[1];

    let updates = EventUpdate::default().with_field("name", "Press call");
    let outcome = harness
        .service()
        .update(second, &updates, Some(&editor()))
        .unwrap();

    assert_eq!(outcome.event.recurrence_id, None);
    assert_eq!(outcome.event.dates, second.dates);
    assert_eq!(outcome.event.fields["name"], "Press call");
    assert_eq!(
        outcome.spiked,
        members[2..].iter().map(|m| m.id.clone()).collect::<Vec<_>>()
    );
    assert_eq!(harness.store.get(&members[0].id), Some(&members[0]));
    assert_eq!(harness.store.series(&recurrence_id).len(), 5);
    assert_eq!(harness.notifier.of_kind(NotificationKind::Updated).len(), 1);
}

/// ## Summary
/// Editing a standalone event without a rule touches nothing else.
#[test_log::test]
fn update_single_event_without_rule() {
    let mut harness = Harness::new();
    let outcome = harness
        .service()
        .create(&[draft_at(utc(2024, 1, 1, 9, 0))], None)
        .unwrap();
    let event = outcome.events[0].clone();

    let updates = EventUpdate::default().with_field("name", "Renamed");
    let outcome = harness.service().update(&event, &updates, None).unwrap();

    assert_eq!(outcome.event.dates, event.dates);
    assert!(outcome.spiked.is_empty());
    assert_eq!(harness.notifier.of_kind(NotificationKind::Updated).len(), 1);
}

/// ## Summary
/// Growing a 3-occurrence series to 5 from #1 creates two members and shifts the rest.
#[test_log::test]
fn update_growing_count_creates_members() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 3);
    let first = &members[0];

    let updates = rule_edit(first.dates.start, weekly(5));
    let outcome = harness
        .service()
        .update(first, &updates, Some(&editor()))
        .unwrap();
    persist(&mut harness, &outcome.event);

    assert_eq!(outcome.created.len(), 2);
    assert!(outcome.deleted.is_empty());
    assert_eq!(outcome.updated, vec![members[1].id.clone(), members[2].id.clone()]);
    assert_eq!(outcome.event.dates.start, first.dates.start);
    assert_eq!(outcome.event.dates.recurring_rule, None);
    assert_eq!(outcome.recurrence_id.as_ref(), Some(&recurrence_id));

    let series = harness.store.series(&recurrence_id);
    assert_eq!(series.len(), 5);
    for (index, member) in series.iter().enumerate() {
        let weeks = i64::try_from(index).unwrap();
        assert_eq!(member.dates.start, utc(2024, 1, 1, 9, 0) + TimeDelta::weeks(weeks));
        assert_eq!(member.dates.recurring_rule, None);
        assert_eq!(member.expiry, Some(member.dates.end));
    }

    let notifications = harness.notifier.of_kind(NotificationKind::UpdatedRecurring);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].item, first.id.as_str());
    assert_eq!(notifications[0].recurrence_id.as_ref(), Some(&recurrence_id));
    assert_eq!(harness.history.created.len(), 3 + 2);
}

/// ## Summary
/// Shrinking a 5-occurrence series to 2 from #1 deletes #3 to #5.
#[test_log::test]
fn update_shrinking_count_deletes_members() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 5);

    let updates = rule_edit(members[0].dates.start, weekly(2));
    let outcome = harness
        .service()
        .update(&members[0], &updates, Some(&editor()))
        .unwrap();
    persist(&mut harness, &outcome.event);

    let tail: Vec<_> = members[2..].iter().map(|m| m.id.clone()).collect();
    assert_eq!(outcome.deleted, tail);
    assert_eq!(harness.history.deleted, tail);
    assert_eq!(outcome.updated, vec![members[1].id.clone()]);
    assert!(outcome.created.is_empty());
    assert_eq!(harness.store.series(&recurrence_id).len(), 2);
}

/// ## Summary
/// Reconciling with the unchanged rule from the first member keeps the series as it is.
#[test_log::test]
fn update_with_same_rule_round_trips() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 4);

    let updates = rule_edit(members[0].dates.start, weekly(4));
    let outcome = harness
        .service()
        .update(&members[0], &updates, None)
        .unwrap();
    persist(&mut harness, &outcome.event);

    assert!(outcome.created.is_empty());
    assert!(outcome.deleted.is_empty());
    assert_eq!(outcome.updated.len(), 3);

    let series = harness.store.series(&recurrence_id);
    assert_eq!(
        series.iter().map(|m| (&m.id, m.dates.start)).collect::<Vec<_>>(),
        members.iter().map(|m| (&m.id, m.dates.start)).collect::<Vec<_>>()
    );
}

/// ## Summary
/// Re-deriving from the middle of a series leaves earlier members alone.
#[test_log::test]
fn update_from_middle_keeps_earlier_members() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 5);
    let third = &members[2];

    let daily = RecurringRule::new(Frequency::Daily).with_count(2);
    let updates = rule_edit(third.dates.start, daily).with_field("name", "Daily stand-up");
    let outcome = harness.service().update(third, &updates, None).unwrap();
    persist(&mut harness, &outcome.event);

    assert_eq!(outcome.updated, vec![members[3].id.clone()]);
    assert_eq!(outcome.deleted, vec![members[4].id.clone()]);

    let series = harness.store.series(&recurrence_id);
    assert_eq!(series.len(), 4);
    assert_eq!(&series[0], &members[0]);
    assert_eq!(&series[1], &members[1]);

    let shifted = harness.store.get(&members[3].id).unwrap();
    assert_eq!(shifted.dates.start, third.dates.start + TimeDelta::days(1));
    assert_eq!(shifted.fields["name"], "Daily stand-up");
    assert_eq!(shifted.dates.recurring_rule, None);
    assert_eq!(shifted.recurrence_id.as_ref(), Some(&recurrence_id));
}

/// ## Summary
/// Adding a rule to a standalone event starts a new series around it.
#[test_log::test]
fn update_adding_rule_starts_series() {
    let mut harness = Harness::new();
    let created = harness
        .service()
        .create(&[draft_at(utc(2024, 1, 1, 9, 0))], None)
        .unwrap();
    let event = created.events[0].clone();

    let updates = rule_edit(event.dates.start, weekly(3));
    let outcome = harness.service().update(&event, &updates, None).unwrap();
    persist(&mut harness, &outcome.event);

    let recurrence_id = outcome.event.recurrence_id.clone().unwrap();
    assert_eq!(outcome.created.len(), 2);
    assert!(outcome.updated.is_empty());

    let series = harness.store.series(&recurrence_id);
    assert_eq!(series.len(), 3);
    assert_eq!(series[0].id, event.id);
    assert!(series.iter().all(|m| m.fields["name"] == "Editorial meeting"));
}

/// ## Summary
/// Moving the start shifts every member while keeping the new duration.
#[test_log::test]
fn update_moves_series_with_new_duration() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 3);

    let start = utc(2024, 1, 2, 15, 30);
    let updates = EventUpdate::default().with_dates(
        EventDates::new(start, start + TimeDelta::minutes(30)).with_rule(weekly(3)),
    );
    let outcome = harness.service().update(&members[0], &updates, None).unwrap();
    persist(&mut harness, &outcome.event);

    for (index, member) in harness.store.series(&recurrence_id).iter().enumerate() {
        let weeks = i64::try_from(index).unwrap();
        assert_eq!(member.dates.start, start + TimeDelta::weeks(weeks));
        assert_eq!(member.dates.duration(), TimeDelta::minutes(30));
    }
}

/// ## Summary
/// An edited occurrence the store no longer returns is still aligned first.
#[test_log::test]
fn update_aligns_occurrence_missing_from_store() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 3);
    harness.store.delete(&members[0].id).unwrap();

    let updates = rule_edit(members[0].dates.start, weekly(3));
    let outcome = harness.service().update(&members[0], &updates, None).unwrap();

    assert_eq!(outcome.event.id, members[0].id);
    assert_eq!(outcome.event.dates.start, members[0].dates.start);
    assert!(outcome.created.is_empty());
    assert!(outcome.deleted.is_empty());
    assert_eq!(outcome.updated, vec![members[1].id.clone(), members[2].id.clone()]);

    persist(&mut harness, &outcome.event);
    assert_eq!(harness.store.series(&recurrence_id).len(), 3);
}

/// ## Summary
/// An edit whose rule yields nothing is rejected before any write.
#[test_log::test]
fn update_rejects_empty_series() {
    let mut harness = Harness::new();
    let (recurrence_id, members) = create_weekly_series(&mut harness, 3);
    let before = harness.store.series(&recurrence_id);

    let rule = RecurringRule::new(Frequency::Weekly).with_count(0);
    let updates = rule_edit(members[0].dates.start, rule);
    let result = harness.service().update(&members[0], &updates, None);

    assert!(matches!(result, Err(ServiceError::EmptySeries { .. })));
    assert_eq!(harness.store.series(&recurrence_id), before);
    assert!(harness.notifier.of_kind(NotificationKind::UpdatedRecurring).is_empty());
}

/// ## Summary
/// A storage failure stops reconciliation; earlier writes stay applied.
#[test_log::test]
fn update_stops_at_first_storage_failure() {
    let mut harness = Harness::new().with_store(MemoryStore::new().failing_after(2));
    let (recurrence_id, members) = create_weekly_series(&mut harness, 5);

    let updates = rule_edit(members[0].dates.start, weekly(2));
    let result = harness.service().update(&members[0], &updates, None);

    assert!(matches!(
        result,
        Err(ServiceError::StoreError(StoreError::Backend(_)))
    ));
    assert_eq!(harness.store.series(&recurrence_id).len(), 5);
    assert!(harness.history.deleted.is_empty());
    assert!(harness.notifier.of_kind(NotificationKind::UpdatedRecurring).is_empty());
}
