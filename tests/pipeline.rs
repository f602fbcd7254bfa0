// End-to-end pipeline tests over an in-memory data pack: round selection,
// geometry + statistics loading, drill-down, persistence, and rendering.

use std::sync::Arc;

use electomap::{
    Dashboard, MemSource, MemStore, Metric, NavOutcome, RegionLevel, RoundState, ViewStore,
    Viewport,
};

const COUNTIES: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","properties":{"code":"AB","name":"Alba"},
     "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
    {"type":"Feature","properties":{"code":"CJ","name":"Cluj"},
     "geometry":{"type":"Polygon","coordinates":[[[2,0],[3,0],[3,1],[2,1],[2,0]]]}},
    {"type":"Feature","properties":{"code":"B","name":"Bucuresti"},
     "geometry":{"type":"Polygon","coordinates":[[[4,0],[5,0],[5,1],[4,1],[4,0]]]}}]}"#;

const UATS_CJ: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","properties":{"code":"CJ-APA","name":"Apahida"},
     "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
    {"type":"Feature","properties":{"name":"Unresolved"},
     "geometry":{"type":"Polygon","coordinates":[[[2,0],[3,0],[3,1],[2,1],[2,0]]]}}]}"#;

const TSV: &str = "Region\tStationNo\tRegistered\tLP\tLS\tLSC\tUM\n\
                   AB\t1\t1000\t400\t50\t10\t5\n\
                   CJ\t10\t2000\t700\t100\t0\t0\n\
                   CJ\t11\t1000\t300\t0\t0\t0\n\
                   B\t90\t9000\t4000\t400\t20\t10";

fn fixture_source() -> Arc<MemSource> {
    let source = Arc::new(MemSource::new());
    source.insert("geo/county.json", COUNTIES.as_bytes().to_vec());
    source.insert("geo/uat/CJ.json", UATS_CJ.as_bytes().to_vec());
    source.insert("stats/tur1/county.tsv", TSV.as_bytes().to_vec());
    source.insert(
        "api/tur1/summary.json",
        br#"{"AB":{"registeredVoters":1100}}"#.to_vec(),
    );
    source.insert(
        "api/tur1/uat/CJ.json",
        br#"{"CJ-APA":{"registeredVoters":4000,"permanentListVoters":1500,"pollingStationCount":6}}"#
            .to_vec(),
    );
    source
}

fn dashboard(source: Arc<MemSource>, store: MemStore) -> Dashboard {
    Dashboard::new(
        source,
        Box::new(store),
        RoundState::preloaded("tur1", true),
        Viewport::with_margin(640.0, 480.0, 10.0),
    )
}

#[tokio::test]
async fn country_view_renders_merged_statistics() {
    let mut dash = dashboard(fixture_source(), MemStore::new());
    dash.select_round(RoundState::preloaded("tur1", true)).await.unwrap();

    let svg = dash.render_svg().unwrap();
    for code in ["AB", "CJ", "B"] {
        assert!(svg.contains(&format!(r#"data-code="{code}""#)), "missing {code}");
    }

    // Hover over AB (lon 0.5, lat 0.5): bounds [0,5]x[0,1] in a 620x460
    // inner box give scale 124, so AB's center lands at (72, 240).
    let tooltip = dash.hover(72.0, 240.0).expect("AB under pointer");
    assert_eq!(&*tooltip.code, "AB");
    assert_eq!(&*tooltip.name, "Alba");
    // Summary overrides the row registration: 465 / 1100.
    assert_eq!(tooltip.stats.registered_voters, 1100);
    assert_eq!(tooltip.stats.total_voters, 465);
    assert_eq!(tooltip.stats.turnout, "42.27");

    // CJ aggregates two station rows.
    let tooltip = dash.hover(320.0, 240.0).expect("CJ under pointer");
    assert_eq!(&*tooltip.code, "CJ");
    assert_eq!(tooltip.stats.polling_station_count, 2);
    assert_eq!(tooltip.stats.registered_voters, 3000);

    // Pointer in the gap between counties clears the tooltip.
    assert!(dash.hover(196.0, 240.0).is_none());
}

#[tokio::test]
async fn click_drill_down_loads_subcounty_units_and_persists() {
    let store = MemStore::new();
    let mut dash = dashboard(fixture_source(), store.clone());
    dash.select_round(RoundState::preloaded("tur1", true)).await.unwrap();

    // Click CJ twice: Country -> County -> SubCounty.
    assert_eq!(dash.click(320.0, 240.0).await.unwrap(), NavOutcome::Changed);
    assert_eq!(dash.view().level, RegionLevel::County);
    assert_eq!(dash.click(320.0, 240.0).await.unwrap(), NavOutcome::Changed);
    assert_eq!(dash.view().level, RegionLevel::SubCounty);

    let svg = dash.render_svg().unwrap();
    assert!(svg.contains("CJ-APA"));
    // The feature without a code got a deterministic placeholder.
    assert!(svg.contains("CJ-002"));

    // The shareable parameters were persisted on entry.
    let params = store.read().unwrap().unwrap();
    assert_eq!(params.level, RegionLevel::SubCounty);
    assert_eq!(params.parent.as_deref(), Some("CJ"));

    // A reload over the same store reconstructs the sub-county view.
    let mut restored = dashboard(fixture_source(), store);
    restored.select_round(RoundState::preloaded("tur1", true)).await.unwrap();
    assert_eq!(restored.view().level, RegionLevel::SubCounty);
    assert!(restored.render_svg().unwrap().contains("CJ-APA"));
}

#[tokio::test]
async fn no_data_round_grays_the_map_for_every_known_region() {
    let mut dash = dashboard(fixture_source(), MemStore::new());
    dash.select_round(RoundState::preloaded("tur2", false)).await.unwrap();

    let svg = dash.render_svg().unwrap();
    assert!(svg.contains("No data for this round"));

    let tooltip = dash.hover(72.0, 240.0).expect("AB still hoverable");
    assert_eq!(tooltip.stats.total_voters, 0);
    assert_eq!(tooltip.stats.turnout, "0.00");

    // Drill-down from County level is refused with the notice.
    dash.drill_into("CJ").await.unwrap();
    assert_eq!(dash.drill_into("CJ").await.unwrap(), NavOutcome::NoDataForRound);
}

#[tokio::test]
async fn switching_rounds_back_restores_fresh_statistics() {
    let mut dash = dashboard(fixture_source(), MemStore::new());

    dash.select_round(RoundState::preloaded("tur1", true)).await.unwrap();
    let first = dash.render_svg().unwrap();

    dash.select_round(RoundState::preloaded("tur2", false)).await.unwrap();
    assert!(dash.render_svg().unwrap().contains("No data for this round"));

    dash.select_round(RoundState::preloaded("tur1", true)).await.unwrap();
    assert_eq!(dash.render_svg().unwrap(), first);
}

#[tokio::test]
async fn live_round_last_completed_tick_wins() {
    let source = fixture_source();
    source.insert(
        "live/tur2/county.json",
        br#"{"AB":{"registeredVoters":1000,"permanentListVoters":100},
            "CJ":{"registeredVoters":3000,"permanentListVoters":600},
            "B":{"registeredVoters":9000,"permanentListVoters":2000}}"#
            .to_vec(),
    );

    let mut dash = dashboard(Arc::clone(&source), MemStore::new());
    dash.select_round(RoundState::live("tur2")).await.unwrap();
    assert!(dash.is_polling());
    assert_eq!(dash.hover(72.0, 240.0).unwrap().stats.total_voters, 100);

    // A failing tick keeps the previous payload on screen.
    source.remove("live/tur2/county.json");
    dash.refresh().await.unwrap();
    assert_eq!(dash.hover(72.0, 240.0).unwrap().stats.total_voters, 100);

    // The next successful tick replaces the frame wholesale.
    source.insert(
        "live/tur2/county.json",
        br#"{"AB":{"registeredVoters":1000,"permanentListVoters":450}}"#.to_vec(),
    );
    dash.refresh().await.unwrap();
    assert_eq!(dash.hover(72.0, 240.0).unwrap().stats.total_voters, 450);

    dash.teardown();
    assert!(!dash.is_polling());
}

#[tokio::test]
async fn metric_switch_recomputes_colors_without_fetching() {
    let source = fixture_source();
    let mut dash = dashboard(Arc::clone(&source), MemStore::new());
    dash.select_round(RoundState::preloaded("tur1", true)).await.unwrap();

    // Remove every statistics resource: a recolor must not miss them.
    source.remove("stats/tur1/county.tsv");
    source.remove("api/tur1/summary.json");

    let turnout_svg = dash.render_svg().unwrap();
    dash.set_metric(Metric::Stations);
    let stations_svg = dash.render_svg().unwrap();

    assert_ne!(turnout_svg, stations_svg);
    // Threshold reset to the minimum observed station count (AB has 1).
    assert_eq!(dash.view().filter_threshold, 1.0);
}

#[tokio::test]
async fn empty_tabular_feed_falls_back_to_the_reference_dataset() {
    let source = Arc::new(MemSource::new());
    source.insert("geo/county.json", COUNTIES.as_bytes().to_vec());
    source.insert(
        "stats/tur1/county.tsv",
        b"Region\tStationNo\tRegistered\tLP\tLS\tLSC\tUM\n".to_vec(),
    );

    let mut dash = dashboard(source, MemStore::new());
    dash.select_round(RoundState::preloaded("tur1", true)).await.unwrap();

    // Reference values flow through: AB renders with nonzero turnout.
    let tooltip = dash.hover(72.0, 240.0).expect("AB under pointer");
    assert!(tooltip.stats.registered_voters > 0);
    assert_ne!(tooltip.stats.turnout, "0.00");
}

#[tokio::test]
async fn missing_geometry_shows_the_fallback_document() {
    let source = Arc::new(MemSource::new());
    source.insert("stats/tur1/county.tsv", TSV.as_bytes().to_vec());

    let mut dash = dashboard(source, MemStore::new());
    dash.select_round(RoundState::preloaded("tur1", true)).await.unwrap();

    let svg = dash.render_svg().unwrap();
    assert!(svg.contains("geometry unavailable"));
    assert!(!svg.contains("data-code"));

    // Nothing is hoverable or clickable without geometry.
    assert!(dash.hover(320.0, 240.0).is_none());
    assert_eq!(dash.click(320.0, 240.0).await.unwrap(), NavOutcome::Ignored);
}
