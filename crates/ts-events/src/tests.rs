//! Unit tests for ts-events.

use ts_core::{AgentId, BlockId, SimTime};

use crate::{Event, EventQueue, EventType, Plan, PlanQueue, PlanType};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ev(t: f64, kind: EventType, agent: u32) -> Event {
    Event::new(SimTime(t), kind, AgentId(agent))
}

fn plan(t: f64, kind: PlanType) -> Plan {
    Plan::new(SimTime(t), BlockId(0), kind)
}

// ── EventQueue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod event_queue {
    use super::*;

    #[test]
    fn time_then_rank() {
        let mut q = EventQueue::new();
        q.push(ev(5.0, EventType::AtGoal, 0));
        q.push(ev(5.0, EventType::BusStop, 1));
        q.push(ev(3.0, EventType::ImpossiblePlan, 2));

        let order: Vec<(f64, EventType)> =
            std::iter::from_fn(|| q.pop()).map(|e| (e.time.0, e.kind)).collect();
        assert_eq!(
            order,
            vec![(3.0, EventType::ImpossiblePlan), (5.0, EventType::BusStop), (5.0, EventType::AtGoal)]
        );
    }

    #[test]
    fn equal_keys_pop_fifo() {
        let mut q = EventQueue::new();
        for agent in 0..5 {
            q.push(ev(1.0, EventType::Departure, agent));
        }
        let agents: Vec<u32> = std::iter::from_fn(|| q.pop()).map(|e| e.agent.0).collect();
        assert_eq!(agents, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn alighting_precedes_bus_stop() {
        let mut q = EventQueue::new();
        q.push(ev(2.0, EventType::BusStop, 0));
        q.push(ev(2.0, EventType::FuelSpent, 0));
        q.push(ev(2.0, EventType::GetOffVehicle, 1));
        q.push(ev(2.0, EventType::BoardVehicle, 2));
        let kinds: Vec<EventType> = std::iter::from_fn(|| q.pop()).map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventType::GetOffVehicle, EventType::BoardVehicle, EventType::BusStop, EventType::FuelSpent]
        );
    }

    #[test]
    fn ranks_are_strictly_increasing() {
        let ranks: Vec<u8> = EventType::ALL.iter().map(|t| t.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn peek_len_extend() {
        let mut q = EventQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.next_time(), None);
        q.extend([ev(9.0, EventType::Continue, 0), ev(4.0, EventType::Continue, 0)]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.next_time(), Some(SimTime(4.0)));
        q.clear();
        assert!(q.is_empty());
    }

    #[test]
    fn only_fuel_and_signals_are_passive() {
        let passive: Vec<EventType> = EventType::ALL.into_iter().filter(|t| t.is_passive()).collect();
        assert_eq!(passive, vec![EventType::ObeySignal, EventType::FuelSpent]);
        assert_eq!(EventType::RouteEndedAbruptly.to_string(), "ROUTE_ENDED_ABRUPTLY");
    }
}

// ── PlanQueue ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod plan_queue {
    use super::*;

    #[test]
    fn higher_plan_type_first() {
        let mut q: PlanQueue = [
            plan(100.0, PlanType::ReturnHome),
            plan(900.0, PlanType::GoToWork),
            plan(50.0, PlanType::RandomTravel),
        ]
        .into_iter()
        .collect();
        let kinds: Vec<PlanType> = std::iter::from_fn(|| q.pop()).map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PlanType::GoToWork, PlanType::RandomTravel, PlanType::ReturnHome]);
    }

    #[test]
    fn equal_types_pop_earliest_first() {
        let mut q = PlanQueue::new();
        q.push(plan(600.0, PlanType::ReturnHome));
        q.push(plan(300.0, PlanType::ReturnHome));
        assert_eq!(q.peek().map(|p| p.time), Some(SimTime(300.0)));
        assert_eq!(q.pop().map(|p| p.time), Some(SimTime(300.0)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn discriminants_match_priority() {
        assert_eq!(PlanType::ReturnHome.priority(), 1);
        assert_eq!(PlanType::RandomTravel.priority(), 2);
        assert_eq!(PlanType::GoToWork.priority(), 3);
    }
}

// ── Population ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod population {
    use std::io::Cursor;

    use ts_core::{SimRng, SimTime};

    use crate::{load_population_reader, Employment, EventError, PlanType, TimeWindow};

    const CSV: &str = "\
employment_status,work_schedule,school_schedule,max_waiting_time,walk_speed,municipality,workplace_location,student_type,bachelor_type,money
occupied,07:30-16:00,,20,4.5,playa,cerro,,,1500
student,,08:00-12:30,15,5,cerro,cerro,bachelor,medicine,300
unemployed,,,30,4,playa,,,,
";

    #[test]
    fn loads_all_rows() {
        let profiles = load_population_reader(Cursor::new(CSV), None).unwrap();
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].employment(), Employment::Occupied);
        assert_eq!(profiles[0].workplace_location.as_deref(), Some("cerro"));
        assert_eq!(profiles[1].bachelor_type.as_deref(), Some("medicine"));
        assert_eq!(profiles[2].workplace_location, None);
        assert_eq!(profiles[2].money, None);
        assert_eq!(profiles[2].employment().outbound_plan(), PlanType::RandomTravel);
    }

    #[test]
    fn limit_truncates() {
        let profiles = load_population_reader(Cursor::new(CSV), Some(2)).unwrap();
        assert_eq!(profiles.len(), 2);
    }

    #[test]
    fn missing_columns_take_defaults() {
        let profiles = load_population_reader(Cursor::new("municipality\nplaya\n"), None).unwrap();
        assert_eq!(profiles[0].max_waiting_time, 30.0);
        assert_eq!(profiles[0].walk_speed, 5.0);
        assert_eq!(profiles[0].employment(), Employment::Other);
    }

    #[test]
    fn bad_number_is_a_parse_error() {
        let bad = "municipality,max_waiting_time\nplaya,soon\n";
        assert!(matches!(load_population_reader(Cursor::new(bad), None), Err(EventError::Parse(_))));
    }

    #[test]
    fn fixed_schedules_are_parsed() {
        let profiles = load_population_reader(Cursor::new(CSV), None).unwrap();
        let mut rng = SimRng::new(1);
        let work = profiles[0].time_window(SimTime::ZERO, &mut rng).unwrap();
        assert_eq!(work, TimeWindow { start: SimTime(450.0), end: SimTime(960.0) });
        let school = profiles[1].time_window(SimTime::ZERO, &mut rng).unwrap();
        assert_eq!(school.end, SimTime(750.0));
    }

    #[test]
    fn malformed_schedule_is_rejected() {
        assert!(matches!(TimeWindow::parse("7:30"), Err(EventError::Schedule(_))));
        assert!(matches!(TimeWindow::parse("25:00-26:00"), Err(EventError::Schedule(_))));
    }

    #[test]
    fn random_window_lies_after_now() {
        let mut rng = SimRng::new(3);
        for _ in 0..200 {
            let w = TimeWindow::random_after(SimTime(601.0), &mut rng);
            assert!(w.start >= SimTime(660.0), "{w:?}");
            assert!(w.end > w.start);
            assert!(w.end < SimTime(1440.0));
        }
        // Late in the day the start hour is clamped to 22.
        let late = TimeWindow::random_after(SimTime(1430.0), &mut rng);
        assert!(late.start >= SimTime(1320.0) && late.end > late.start);
    }
}
