//! Tests for fg-sim: wire format, coordinator event flow, and the driver.

use fg_core::{FleetConfig, ManualClock, Position, Timestamp};
use fg_fleet::FleetManager;
use fg_spatial::{AStarPathFinder, Grid};

use crate::{Command, Coordinator, EventBus, EventReceiver, FleetEvent};

// ── Helpers ───────────────────────────────────────────────────────────────────

const T0: Timestamp = Timestamp(1_000);

fn p(x: i32, y: i32) -> Position {
    Position::new(x, y)
}

fn coordinator(width: u32, height: u32) -> (Coordinator<AStarPathFinder, ManualClock>, ManualClock) {
    let clock = ManualClock::new(T0);
    let grid = Grid::with_timestamp(width, height, T0).into_shared();
    let fleet = FleetManager::new(grid, AStarPathFinder, clock.clone());
    (Coordinator::new(fleet, EventBus::new(64)), clock)
}

fn create(id: &str, from: Position, to: Position) -> Command {
    Command::CreateRobot {
        id:       id.into(),
        name:     id.to_uppercase(),
        position: from,
        target:   Some(to),
        speed:    None,
    }
}

/// Everything published so far.
fn drain(rx: &mut EventReceiver) -> Vec<FleetEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn kinds(events: &[FleetEvent]) -> Vec<&'static str> {
    events.iter().map(FleetEvent::kind).collect()
}

// ── Command decoding and validation ───────────────────────────────────────────

#[cfg(test)]
mod command {
    use super::*;
    use crate::SimError;
    use serde_json::json;

    #[test]
    fn create_robot_optional_fields() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"create-robot","id":"r1","name":"Atlas","position":{"x":2,"y":3}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::CreateRobot {
                id:       "r1".into(),
                name:     "Atlas".into(),
                position: p(2, 3),
                target:   None,
                speed:    None,
            }
        );
    }

    #[test]
    fn every_kind_decodes() {
        let cases = [
            (json!({"type": "remove-robot", "id": "r1"}), "remove-robot"),
            (json!({"type": "set-obstacle", "x": 1, "y": 2, "obstacle": true}), "set-obstacle"),
            (json!({"type": "toggle-obstacle", "x": 1, "y": 2}), "toggle-obstacle"),
            (json!({"type": "set-robot-target", "id": "r1", "target": {"x": 4, "y": 4}}), "set-robot-target"),
            (json!({"type": "set-robot-speed", "id": "r1", "speed": 2.5}), "set-robot-speed"),
        ];
        for (value, kind) in cases {
            let cmd: Command = serde_json::from_value(value).unwrap();
            assert_eq!(cmd.kind(), kind);
        }
    }

    #[test]
    fn encodes_with_type_tag() {
        let value = serde_json::to_value(Command::ToggleObstacle { x: 1, y: 2 }).unwrap();
        assert_eq!(value, json!({"type": "toggle-obstacle", "x": 1, "y": 2}));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"type":"teleport","id":"r1"}"#).is_err());
    }

    #[test]
    fn validation() {
        let bad_speed = |speed| Command::SetRobotSpeed { id: "r1".into(), speed };
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(bad_speed(speed).validate(), Err(SimError::InvalidCommand(_))));
        }
        assert!(bad_speed(0.25).validate().is_ok());

        let mut create = create("", p(0, 0), p(1, 1));
        assert!(matches!(create.validate(), Err(SimError::InvalidCommand(_))));
        if let Command::CreateRobot { id, speed, .. } = &mut create {
            *id = "r1".into();
            *speed = Some(-2.0);
        }
        assert!(matches!(create.validate(), Err(SimError::InvalidCommand(_))));

        assert!(Command::SetObstacle { x: -5, y: 99, obstacle: true }.validate().is_ok());
    }
}

// ── Event wire format and bus ─────────────────────────────────────────────────

#[cfg(test)]
mod event {
    use super::*;
    use crate::EventBusError;
    use fg_spatial::Cell;
    use serde_json::json;

    #[test]
    fn cell_event_json() {
        let event = FleetEvent::Cell {
            x:    1,
            y:    2,
            cell: Cell { obstacle: true, updated_at: T0 },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "cell", "x": 1, "y": 2, "cell": {"obstacle": true, "updatedAt": 1000}})
        );
    }

    #[tokio::test]
    async fn fleet_event_uses_camel_case() {
        let (coord, _) = coordinator(3, 1);
        coord.apply(create("r1", p(0, 0), p(2, 0))).await.unwrap();
        let FleetEvent::State { robots, metrics, .. } = coord.state().await.unwrap() else {
            panic!("expected a state event");
        };
        let value = serde_json::to_value(FleetEvent::Fleet { robots, metrics }).unwrap();
        assert_eq!(value["type"], "fleet");
        let robot = &value["robots"][0];
        assert_eq!(robot["id"], "r1");
        assert_eq!(robot["pathIndex"], 1);
        assert_eq!(robot["taskStartedAt"], 1000);
        assert_eq!(robot["path"][2], json!({"x": 2, "y": 0}));
        assert_eq!(value["metrics"]["completedTasks"], 0);
        assert!(value["metrics"]["lastCompletionMs"].is_null());
    }

    #[tokio::test]
    async fn bus_fans_out_and_reports_lag() {
        let bus = EventBus::new(2);
        let cell = || FleetEvent::Cell { x: 0, y: 0, cell: Cell { obstacle: false, updated_at: T0 } };
        assert_eq!(bus.publish(cell()), 0);

        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(bus.publish(cell()), 2);
        assert_eq!(a.recv().await.unwrap().kind(), "cell");
        assert_eq!(a.try_recv(), Err(EventBusError::Empty));

        bus.publish(cell());
        bus.publish(cell());
        assert_eq!(b.try_recv(), Err(EventBusError::Lagged(1)));
        assert!(b.try_recv().is_ok());
    }
}

// ── Config files ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use std::io::Write;

    use fg_core::FgError;

    use crate::{SimError, load_config};

    fn file(text: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f
    }

    #[test]
    fn missing_fields_take_defaults() {
        let f = file(r#"{"grid_width": 20, "churn_interval_ms": 1500}"#);
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.grid_width, 20);
        assert_eq!(config.grid_height, 10);
        assert_eq!(config.churn_interval_ms, Some(1500));
        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let f = file("{ not json");
        assert!(matches!(load_config(f.path()), Err(SimError::Config(FgError::Parse(_)))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let f = file(r#"{"tick_delta_secs": -1.0}"#);
        assert!(matches!(load_config(f.path()), Err(SimError::Config(FgError::Config(_)))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load_config(path), Err(SimError::Config(FgError::Io(_)))));
    }
}

// ── Coordinator ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod coordinator {
    use super::*;
    use crate::SimError;
    use fg_core::SimRng;

    #[tokio::test]
    async fn create_publishes_fleet() {
        let (coord, _) = coordinator(4, 4);
        let mut rx = coord.subscribe();
        coord.apply(create("r1", p(0, 0), p(3, 0))).await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(kinds(&events), ["fleet"]);
        let FleetEvent::Fleet { robots, .. } = &events[0] else { unreachable!() };
        assert_eq!(robots.len(), 1);
        assert_eq!(robots[0].path.len(), 4);
    }

    #[tokio::test]
    async fn rejected_commands_change_nothing() {
        let (coord, _) = coordinator(4, 4);
        coord.apply(create("r1", p(0, 0), p(3, 0))).await.unwrap();
        let mut rx = coord.subscribe();

        let err = coord.apply_json(r#"{"type":"set-robot-speed","id":"r1","speed":0}"#).await;
        assert!(matches!(err, Err(SimError::InvalidCommand(_))));
        let err = coord.apply_json("{\"type\":\"set-obstacle\"").await;
        assert!(matches!(err, Err(SimError::Decode(_))));

        assert!(drain(&mut rx).is_empty());
        assert_eq!(coord.fleet().robot("r1").await.unwrap().unwrap().speed, 1.0);
    }

    #[tokio::test]
    async fn obstacle_on_route_publishes_cell_then_fleet() {
        let (coord, clock) = coordinator(4, 4);
        coord.apply(create("robot-1", p(0, 0), p(3, 0))).await.unwrap();
        let mut rx = coord.subscribe();
        clock.advance(250);

        coord
            .apply_json(r#"{"type":"set-obstacle","x":1,"y":0,"obstacle":true}"#)
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(kinds(&events), ["cell", "fleet"]);
        let FleetEvent::Cell { x, y, cell } = &events[0] else { unreachable!() };
        assert_eq!((*x, *y), (1, 0));
        assert!(cell.obstacle);
        assert_eq!(cell.updated_at, Timestamp(1_250));
        let FleetEvent::Fleet { robots, .. } = &events[1] else { unreachable!() };
        assert_eq!(
            robots[0].path,
            [p(0, 0), p(0, 1), p(1, 1), p(2, 1), p(3, 1), p(3, 0)]
        );
    }

    #[tokio::test]
    async fn obstacle_off_route_publishes_cell_only() {
        let (coord, _) = coordinator(4, 4);
        coord.apply(create("r1", p(0, 0), p(3, 0))).await.unwrap();
        let mut rx = coord.subscribe();

        coord.apply(Command::ToggleObstacle { x: 2, y: 3 }).await.unwrap();
        assert_eq!(kinds(&drain(&mut rx)), ["cell"]);

        coord.apply(Command::SetObstacle { x: 9, y: 9, obstacle: true }).await.unwrap();
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn unknown_robot_commands_are_silent() {
        let (coord, _) = coordinator(4, 4);
        let mut rx = coord.subscribe();
        coord.apply(Command::RemoveRobot { id: "ghost".into() }).await.unwrap();
        coord
            .apply(Command::SetRobotTarget { id: "ghost".into(), target: p(1, 1) })
            .await
            .unwrap();
        coord
            .apply(Command::SetRobotSpeed { id: "ghost".into(), speed: 2.0 })
            .await
            .unwrap();
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn robot_updates() {
        let (coord, _) = coordinator(4, 4);
        coord.apply(create("r1", p(0, 0), p(3, 0))).await.unwrap();
        let mut rx = coord.subscribe();

        coord
            .apply(Command::SetRobotSpeed { id: "r1".into(), speed: 3.0 })
            .await
            .unwrap();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(coord.fleet().robot("r1").await.unwrap().unwrap().speed, 3.0);

        coord
            .apply(Command::SetRobotTarget { id: "r1".into(), target: p(0, 3) })
            .await
            .unwrap();
        let events = drain(&mut rx);
        let [FleetEvent::Fleet { robots, .. }] = events.as_slice() else {
            panic!("expected one fleet event, got {:?}", kinds(&events));
        };
        assert_eq!(robots[0].target, p(0, 3));

        coord.apply(Command::RemoveRobot { id: "r1".into() }).await.unwrap();
        let events = drain(&mut rx);
        let [FleetEvent::Fleet { robots, .. }] = events.as_slice() else {
            panic!("expected one fleet event, got {:?}", kinds(&events));
        };
        assert!(robots.is_empty());
    }

    #[tokio::test]
    async fn blocked_robot_recovers_and_completes() {
        let (coord, _) = coordinator(3, 3);
        coord.apply(Command::SetObstacle { x: 1, y: 0, obstacle: true }).await.unwrap();
        coord.apply(create("robot-2", p(0, 0), p(1, 0))).await.unwrap();
        assert!(coord.fleet().robot("robot-2").await.unwrap().unwrap().path.is_empty());

        let mut rx = coord.subscribe();
        coord.apply(Command::SetObstacle { x: 1, y: 0, obstacle: false }).await.unwrap();
        assert_eq!(kinds(&drain(&mut rx)), ["cell", "fleet"]);

        let outcome = coord.tick(1.0).await.unwrap();
        assert!(outcome.moved);
        assert_eq!(outcome.metrics.completed_tasks, 1);
        assert!(outcome.metrics.last_completion_ms.is_some());

        let events = drain(&mut rx);
        let [FleetEvent::Fleet { robots, metrics }] = events.as_slice() else {
            panic!("expected one fleet event, got {:?}", kinds(&events));
        };
        assert_eq!(robots[0].position, p(1, 0));
        assert_eq!(metrics.completed_tasks, 1);
    }

    #[tokio::test]
    async fn idle_tick_publishes_nothing() {
        let (coord, _) = coordinator(3, 3);
        coord.apply(create("r1", p(1, 1), p(1, 1))).await.unwrap();
        let mut rx = coord.subscribe();
        let outcome = coord.tick(1.0).await.unwrap();
        assert!(!outcome.moved && !outcome.metrics_changed);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn state_event_is_complete() {
        let (coord, _) = coordinator(3, 2);
        coord.apply(Command::SetObstacle { x: 2, y: 1, obstacle: true }).await.unwrap();
        coord.apply(create("r1", p(0, 0), p(2, 0))).await.unwrap();

        let mut rx = coord.subscribe();
        coord.publish_state().await.unwrap();
        let events = drain(&mut rx);
        let [FleetEvent::State { grid, robots, metrics }] = events.as_slice() else {
            panic!("expected one state event, got {:?}", kinds(&events));
        };
        assert_eq!((grid.len(), grid[0].len()), (2, 3));
        assert!(grid[1][2].obstacle);
        assert_eq!(robots.len(), 1);
        assert_eq!(metrics.started_at, T0);
    }

    #[tokio::test]
    async fn churn_is_reproducible() {
        async fn churned_cells(seed: u64) -> Vec<(i32, i32)> {
            let (coord, _) = coordinator(5, 5);
            let mut rx = coord.subscribe();
            let mut rng = SimRng::new(seed);
            for _ in 0..8 {
                coord.churn(&mut rng).await.unwrap();
            }
            drain(&mut rx)
                .into_iter()
                .filter_map(|e| match e {
                    FleetEvent::Cell { x, y, .. } => Some((x, y)),
                    _ => None,
                })
                .collect()
        }

        let first = churned_cells(7).await;
        assert_eq!(first.len(), 8);
        assert!(first.iter().all(|&(x, y)| (0..5).contains(&x) && (0..5).contains(&y)));
        assert_eq!(first, churned_cells(7).await);
    }
}

// ── TickDriver ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod driver {
    use std::time::Duration;

    use super::*;
    use crate::{SimError, TickDriver};

    fn config(tick_interval_ms: u64, churn_interval_ms: Option<u64>) -> FleetConfig {
        FleetConfig {
            tick_interval_ms,
            tick_delta_secs: 1.0,
            churn_interval_ms,
            ..FleetConfig::default()
        }
    }

    #[tokio::test]
    async fn run_ticks_steps_the_fleet() {
        let (coord, _) = coordinator(6, 1);
        coord.apply(create("r1", p(0, 0), p(5, 0))).await.unwrap();
        let mut driver = TickDriver::new(coord.clone(), &config(100, None)).unwrap();
        driver.run_ticks(3).await.unwrap();
        assert_eq!(coord.fleet().robot("r1").await.unwrap().unwrap().position, p(3, 0));
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let (coord, _) = coordinator(2, 2);
        let result = TickDriver::new(coord, &config(0, None));
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_cadence_until_cancelled() {
        let (coord, _) = coordinator(6, 1);
        coord.apply(create("r1", p(0, 0), p(5, 0))).await.unwrap();
        let mut rx = coord.subscribe();

        let driver = TickDriver::new(coord.clone(), &config(100, None)).unwrap();
        let stop = driver.shutdown_token();
        let handle = tokio::spawn(driver.run());

        // Ticks fire at 0, 100 and 200 ms.
        tokio::time::sleep(Duration::from_millis(250)).await;
        stop.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(coord.fleet().robot("r1").await.unwrap().unwrap().position, p(3, 0));
        assert_eq!(kinds(&drain(&mut rx)), ["fleet", "fleet", "fleet"]);
    }

    #[tokio::test(start_paused = true)]
    async fn churn_runs_on_its_own_interval() {
        let (coord, _) = coordinator(5, 5);
        let mut rx = coord.subscribe();

        let driver = TickDriver::new(coord.clone(), &config(60_000, Some(100))).unwrap();
        let stop = driver.shutdown_token();
        let handle = tokio::spawn(driver.run());

        tokio::time::sleep(Duration::from_millis(250)).await;
        stop.cancel();
        handle.await.unwrap().unwrap();

        let events = drain(&mut rx);
        assert_eq!(kinds(&events), ["cell", "cell", "cell"]);
    }
}
