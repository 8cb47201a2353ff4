use countrysign::{
    CityCatalog, MapStyle, SessionPhase, SessionState, demo_dataset, render_map, session_map,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn only(dataset: &countrysign::Dataset, number: u32) -> CityCatalog {
    let city = dataset.city(number).expect("demo city exists").clone();
    CityCatalog::new(vec![city]).expect("single city")
}

fn small_style() -> MapStyle {
    MapStyle {
        resolution: 300,
        ..MapStyle::default()
    }
}

/// Centre pixel of the first polygon named `name`.
fn centre_colour(
    render: &countrysign::MapRender,
    region: &countrysign::RegionMap,
    name: &str,
) -> [u8; 4] {
    use geo::BoundingRect;

    let bounds = region.bounds().expect("bounds exist");
    let projection = countrysign::map::Projection::fit(bounds, small_style().resolution);
    let polygon = region.polygons_named(name).next().expect("polygon exists");
    let centre = polygon.geometry.bounding_rect().expect("polygon has bounds").center();
    let (x, y) = projection.project(centre.x, centre.y);

    render.pixel(x as u32, y as u32).expect("centre is on canvas")
}

#[test]
fn repeated_current_city_is_red_and_other_visits_orange() {
    let dataset = demo_dataset();
    let mut rng = StdRng::seed_from_u64(0);
    let mut session = SessionState::new();

    for number in [4, 5, 4] {
        session
            .pick_next(&mut rng, &only(&dataset, number))
            .expect("pool is not empty");
    }

    assert_eq!(session.history(), &[4, 5, 4]);
    assert_eq!(
        session.visited_names(dataset.catalog()),
        vec![" 小樽市".to_string(), "旭川市".to_string()]
    );
    assert_eq!(
        session.current_city(dataset.catalog()).map(|city| city.trimmed_name()),
        Some("小樽市")
    );

    let render = session_map(&dataset, &session, &small_style())
        .expect("map should render")
        .expect("a city is selected");

    assert_eq!(centre_colour(&render, dataset.region(), "小樽市"), [255, 0, 0, 255]);
    assert_eq!(centre_colour(&render, dataset.region(), "旭川市"), [255, 165, 0, 255]);
    assert_eq!(centre_colour(&render, dataset.region(), "札幌市"), [255, 255, 153, 255]);
    assert!(render.missing.is_empty());
}

#[test]
fn pick_reveal_pick_masks_the_new_city() {
    let dataset = demo_dataset();
    let mut rng = StdRng::seed_from_u64(21);
    let mut session = SessionState::new();

    let first = session.pick_next(&mut rng, dataset.catalog()).expect("pool is not empty");
    session.reveal().expect("selection exists");
    assert_eq!(session.phase(), SessionPhase::Revealed);

    session.pick_next(&mut rng, dataset.catalog()).expect("pool is not empty");

    assert_eq!(session.phase(), SessionPhase::Masked);
    assert_eq!(
        session.visited_names(dataset.catalog()),
        vec![dataset.city(first).expect("picked from catalog").name.clone()]
    );
}

#[test]
fn visited_names_track_history_minus_last() {
    let dataset = demo_dataset();
    let mut rng = StdRng::seed_from_u64(77);
    let mut session = SessionState::new();

    for _ in 0..25 {
        session.pick_next(&mut rng, dataset.catalog()).expect("pool is not empty");

        let history = session.history();
        let expected: Vec<String> = history[..history.len() - 1]
            .iter()
            .map(|number| dataset.city(*number).expect("valid id").name.clone())
            .collect();
        assert_eq!(session.visited_names(dataset.catalog()), expected);
    }
}

#[test]
fn trail_joins_visited_names_with_arrows() {
    let dataset = demo_dataset();
    let mut rng = StdRng::seed_from_u64(0);
    let mut session = SessionState::new();

    for number in [1, 2, 39] {
        session
            .pick_next(&mut rng, &only(&dataset, number))
            .expect("pool is not empty");
    }

    assert_eq!(session.trail(dataset.catalog()), "札幌市 -> 函館市");
}

#[test]
fn clearing_returns_to_no_selection_and_blank_map() {
    let dataset = demo_dataset();
    let mut rng = StdRng::seed_from_u64(5);
    let mut session = SessionState::new();
    session.pick_next(&mut rng, dataset.catalog()).expect("pool is not empty");

    session.set_clear_confirmation(true);
    session.clear_history().expect("confirmed clear succeeds");

    assert_eq!(session.phase(), SessionPhase::NoSelection);
    assert!(
        session_map(&dataset, &session, &small_style())
            .expect("nothing to render")
            .is_none()
    );

    let plain = render_map(dataset.region(), None, &[], &small_style()).expect("map renders");
    assert_eq!(centre_colour(&plain, dataset.region(), "小樽市"), [255, 255, 153, 255]);
}
