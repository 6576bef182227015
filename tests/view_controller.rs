mod common;

use std::num::NonZeroUsize;

use common::*;
use multiverse::error::MultiverseError;
use multiverse::fetch::Constraints;
use multiverse::filter::FilterSpec;
use multiverse::record::Character;
use multiverse::view::{Action, ApplyOutcome, LoadStatus, View, ViewInputs, plan};

fn size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn family_transport() -> FakeTransport {
    let transport = FakeTransport::new();
    let mut family = vec![
        character(1, "Rick Sanchez", "Alive", "Human"),
        character(2, "Morty Smith", "Alive", "Human"),
        character(3, "Summer Smith", "Alive", "Human"),
        character(4, "Beth Smith", "Alive", "Human"),
        character(5, "Jerry Smith", "Alive", "Human"),
    ];
    family.extend(characters(6, 12));
    transport.route(&page_url("character", 1), page_body(family, None));
    transport
}

async fn loaded_view(transport: &FakeTransport, page_size: usize) -> View<Character, FakeTransport> {
    let mut view = View::new(transport.clone(), BASE, size(page_size));
    assert_eq!(view.refresh().await.expect("aggregation ok"), ApplyOutcome::Applied);
    view
}

#[test]
fn plan_picks_the_strongest_required_action() {
    let current = ViewInputs::new(size(8));

    assert_eq!(plan(&current, &current.clone(), true), Action::FetchAll);
    assert_eq!(plan(&current, &current.clone(), false), Action::Nothing);

    let constrained = ViewInputs { constraints: Constraints::new().with("name", "rick"), ..current.clone() };
    assert_eq!(plan(&current, &constrained, false), Action::FetchAll);

    let filtered = ViewInputs { filter: FilterSpec::new().with("name", "smith"), ..current.clone() };
    assert_eq!(plan(&current, &filtered, false), Action::Reapply);

    let filtered_and_paged = ViewInputs { pagination: current.pagination.with_page(2), ..filtered.clone() };
    assert_eq!(plan(&current, &filtered_and_paged, false), Action::Reapply);

    let paged = ViewInputs { pagination: current.pagination.with_page(2), ..current.clone() };
    assert_eq!(plan(&current, &paged, false), Action::Repaginate);
}

#[tokio::test]
async fn first_update_requires_an_aggregation() {
    let transport = family_transport();
    let mut view: View<Character, _> = View::new(transport, BASE, size(8));
    assert_eq!(view.status(), LoadStatus::Idle);
    let pending = view.set_page(1).expect("valid input").expect("nothing loaded yet");
    assert_eq!(view.status(), LoadStatus::Loading);
    let done = pending.run().await;
    assert_eq!(view.apply(done).expect("aggregation ok"), ApplyOutcome::Applied);
    assert_eq!(view.status(), LoadStatus::Ready);
    assert_eq!(view.page().total_count, 17);
}

#[tokio::test]
async fn filter_change_resets_to_first_page() {
    let transport = family_transport();
    let mut view = loaded_view(&transport, 2).await;

    assert!(view.set_page(3).expect("valid input").is_none());
    assert_eq!(view.page().page, 3);

    assert!(view.set_filter(FilterSpec::new().with("name", "smith")).expect("valid input").is_none());
    let page = view.page();
    assert_eq!(page.page, 1);
    assert_eq!(page.total_count, 4);
    assert_eq!(page.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(transport.requests().len(), 1, "filtering never refetches");
}

#[tokio::test]
async fn page_requests_are_clamped() {
    let transport = family_transport();
    let mut view = loaded_view(&transport, 8).await;
    view.set_page(40).expect("valid input");
    assert_eq!(view.inputs().pagination.current_page(), 3);
    assert_eq!(view.page().items.len(), 1);

    view.set_page_size(size(20)).expect("valid input");
    assert_eq!(view.page().page, 1);
    assert_eq!(view.page().total_pages, 1);
}

#[tokio::test]
async fn unknown_filter_field_is_rejected_and_state_kept() {
    let transport = family_transport();
    let mut view = loaded_view(&transport, 8).await;
    let err = view.set_filter(FilterSpec::new().with("dimension", "c-137")).err().expect("rejected");
    assert!(matches!(err, MultiverseError::UnknownField { .. }));
    assert!(view.inputs().filter.is_empty());
}

#[tokio::test]
async fn stale_aggregation_is_discarded() {
    let transport = FakeTransport::new();
    transport.route(&page_url("character", 1), page_body(characters(1, 20), None));
    transport.route(
        &format!("{BASE}/character?page=1&name=rick"),
        page_body(vec![character(1, "Rick Sanchez", "Alive", "Human"), character(8, "Adjudicator Rick", "Dead", "Human")], None),
    );
    let mut view: View<Character, _> = View::new(transport, BASE, size(8));

    // aggregation A under epoch 1
    let a = view.reload();
    assert_eq!(a.epoch().value(), 1);

    // constraint change bumps the epoch and starts B
    let b = view.set_constraints(Constraints::new().with("name", "rick")).expect("valid input").expect("constraints changed");
    assert_eq!(b.epoch().value(), 2);
    assert_eq!(view.epoch().value(), 2);

    // B finishes first, A afterwards
    let done_b = b.run().await;
    let done_a = a.run().await;
    assert!(done_a.is_ok());

    assert_eq!(view.apply(done_b).expect("b ok"), ApplyOutcome::Applied);
    assert_eq!(view.apply(done_a).expect("stale is silent"), ApplyOutcome::Discarded);

    let ids: Vec<u64> = view.dataset().records().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 8]);
    assert_eq!(view.status(), LoadStatus::Ready);
}

#[tokio::test]
async fn stale_failure_does_not_touch_the_view() {
    let transport = family_transport();
    let mut view = loaded_view(&transport, 8).await;

    let a = view.reload();
    let b = view.reload();

    transport.route(&page_url("character", 1), page_body(characters(1, 3), None));
    let done_b = b.run().await;
    assert_eq!(view.apply(done_b).expect("b ok"), ApplyOutcome::Applied);

    transport.route_failure(&page_url("character", 1), "timeout");
    let done_a = a.run().await;
    assert!(!done_a.is_ok());
    assert_eq!(view.apply(done_a).expect("stale is silent"), ApplyOutcome::Discarded);
    assert_eq!(view.dataset().len(), 3);
    assert_eq!(view.status(), LoadStatus::Ready);
}

#[tokio::test]
async fn failed_aggregation_empties_the_view() {
    let transport = family_transport();
    let mut view = loaded_view(&transport, 8).await;
    assert_eq!(view.page().total_count, 17);

    transport.route_failure(&page_url("character", 1), "connection reset");
    let err = view.refresh().await.unwrap_err();
    assert!(err.is_transport());

    assert_eq!(view.status(), LoadStatus::Failed);
    assert!(view.last_error().is_some());
    assert!(view.dataset().is_empty());
    let page = view.page();
    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn empty_result_is_not_a_failure() {
    let transport = FakeTransport::new();
    transport.route(&page_url("character", 1), page_body(vec![], None));
    let mut view: View<Character, _> = View::new(transport, BASE, size(8));
    assert_eq!(view.refresh().await.expect("empty is fine"), ApplyOutcome::Applied);
    assert_eq!(view.status(), LoadStatus::Empty);
    assert!(view.last_error().is_none());
    assert!(view.page().items.is_empty());
}

#[tokio::test]
async fn input_change_after_failure_fetches_again() {
    let transport = FakeTransport::new();
    transport.route_failure(&page_url("character", 1), "connection reset");
    let mut view: View<Character, _> = View::new(transport.clone(), BASE, size(8));
    assert!(view.refresh().await.is_err());

    transport.route(&page_url("character", 1), page_body(characters(1, 2), None));
    let pending = view.set_page(1).expect("valid input").expect("failed view refetches");
    let done = pending.run().await;
    assert_eq!(view.apply(done).expect("recovered"), ApplyOutcome::Applied);
    assert_eq!(view.dataset().len(), 2);
}

#[tokio::test]
async fn new_dataset_resets_the_cursor() {
    let transport = family_transport();
    let mut view = loaded_view(&transport, 4).await;
    view.set_page(3).expect("valid input");
    assert_eq!(view.page().page, 3);
    view.refresh().await.expect("aggregation ok");
    assert_eq!(view.page().page, 1);
}

#[tokio::test]
async fn filter_and_page_changes_during_a_load_apply_when_it_lands() {
    let transport = family_transport();
    let mut view: View<Character, _> = View::new(transport.clone(), BASE, size(2));
    let pending = view.reload();

    assert!(view.set_filter(FilterSpec::new().with("name", "smith")).expect("valid input").is_none());
    assert!(view.set_page(2).expect("valid input").is_none(), "a load is already under way");
    assert!(view.filtered().is_empty());

    let done = pending.run().await;
    assert_eq!(view.apply(done).expect("aggregation ok"), ApplyOutcome::Applied);
    let names: Vec<&str> = view.filtered().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Morty Smith", "Summer Smith", "Beth Smith", "Jerry Smith"]);
    assert_eq!(view.page().page, 1);
    assert_eq!(view.page().total_pages, 2);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn dropped_aggregation_lets_the_next_input_refetch() {
    let transport = family_transport();
    let mut view: View<Character, _> = View::new(transport.clone(), BASE, size(8));

    let pending = view.set_page(1).expect("valid input").expect("nothing loaded yet");
    assert_eq!(view.status(), LoadStatus::Loading);
    drop(pending);
    assert_eq!(view.status(), LoadStatus::Idle);

    let pending = view.set_filter(FilterSpec::new().with("name", "rick")).expect("valid input").expect("refetch after abandon");
    let done = pending.run().await;
    assert_eq!(view.apply(done).expect("aggregation ok"), ApplyOutcome::Applied);
    assert_eq!(view.status(), LoadStatus::Ready);
    assert_eq!(view.filtered().len(), 1);
}

#[tokio::test]
async fn dropped_stale_aggregation_leaves_the_live_one_alone() {
    let transport = family_transport();
    let mut view: View<Character, _> = View::new(transport, BASE, size(8));
    let stale = view.reload();
    let live = view.reload();
    drop(stale);
    assert_eq!(view.status(), LoadStatus::Loading);
    assert!(view.set_page(1).expect("valid input").is_none());

    let done = live.run().await;
    assert_eq!(view.apply(done).expect("aggregation ok"), ApplyOutcome::Applied);
    assert_eq!(view.page().total_count, 17);
}
