//! Unit tests for ts-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, BlockId, BlockKey, RouteId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AgentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn route_id_rejects_oversized_index() {
        assert!(RouteId::try_from(70_000usize).is_err());
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert_eq!(BlockId::INVALID.0, u32::MAX);
        assert_eq!(RouteId::INVALID.0, u16::MAX);
        assert_eq!(BlockId::default(), BlockId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
    }

    #[test]
    fn block_key_reversed_swaps_nodes() {
        let k = BlockKey::new(10, 1, 2);
        assert_eq!(k.reversed(), BlockKey::new(10, 2, 1));
        assert_eq!(k.reversed().reversed(), k);
    }

    #[test]
    fn block_key_display_and_parse() {
        let k = BlockKey::new(-5, 100, 200);
        assert_eq!(k.to_string(), "-5:100:200");
        assert_eq!("-5:100:200".parse::<BlockKey>().unwrap(), k);
        assert!("1:2".parse::<BlockKey>().is_err());
        assert!("1:2:3:4".parse::<BlockKey>().is_err());
        assert!("a:2:3".parse::<BlockKey>().is_err());
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(53.9, 27.56);
        assert!(p.distance_km(p) < 1e-6);
    }

    #[test]
    fn one_degree_latitude() {
        // ~1 degree of latitude ≈ 111 km
        let a = GeoPoint::new(53.0, 27.5);
        let b = GeoPoint::new(54.0, 27.5);
        let d = a.distance_km(b);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, SimTime};

    #[test]
    fn from_hm_and_parse() {
        assert_eq!(SimTime::from_hm(7, 30), SimTime(450.0));
        assert_eq!(SimTime::parse_hhmm("07:30").unwrap(), SimTime(450.0));
        assert_eq!(SimTime::parse_hhmm(" 23:59 ").unwrap(), SimTime(1439.0));
        assert!(SimTime::parse_hhmm("24:00").is_err());
        assert!(SimTime::parse_hhmm("7h30").is_err());
    }

    #[test]
    fn total_order() {
        let mut v = vec![SimTime(5.0), SimTime(-1.0), SimTime(3.5)];
        v.sort();
        assert_eq!(v, vec![SimTime(-1.0), SimTime(3.5), SimTime(5.0)]);
        assert_eq!(SimTime(2.0).max(SimTime(3.0)), SimTime(3.0));
    }

    #[test]
    fn arithmetic() {
        let t = SimTime(10.0) + 2.5;
        assert_eq!(t, SimTime(12.5));
        assert_eq!(t - SimTime(10.0), 2.5);
        assert_eq!(t.since(SimTime(2.5)), 10.0);
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut clock = SimClock::new(SimTime(100.0), SimTime(1440.0));
        clock.advance_to(SimTime(120.0));
        clock.advance_to(SimTime(110.0));
        assert_eq!(clock.now, SimTime(120.0));
        assert!(clock.is_past_horizon(SimTime(1440.5)));
        assert!(!clock.is_past_horizon(SimTime(1440.0)));
    }

    #[test]
    fn clock_display() {
        let clock = SimClock::new(SimTime(452.3), SimTime(1440.0));
        assert_eq!(clock.to_string(), "t=452.30 (07:32)");
    }

    #[test]
    fn config_defaults() {
        let c = SimConfig::default();
        assert_eq!(c.horizon_minute, 1440.0);
        assert_eq!(c.walk_radius_km, 0.5);
        assert_eq!(c.time_between_departures, 30.0);
        assert_eq!(c.driver_wait_time, 5.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn config_rejects_inverted_horizon() {
        let c = SimConfig { start_minute: 600.0, horizon_minute: 500.0, ..SimConfig::default() };
        assert!(c.validate().is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng, SimRng};

    #[test]
    fn deterministic_per_agent() {
        let mut a = AgentRng::new(7, AgentId(3));
        let mut b = AgentRng::new(7, AgentId(3));
        for _ in 0..10 {
            assert_eq!(a.uniform(0.0, 5.0), b.uniform(0.0, 5.0));
        }
    }

    #[test]
    fn agents_get_distinct_streams() {
        let mut a = AgentRng::new(7, AgentId(1));
        let mut b = AgentRng::new(7, AgentId(2));
        let xs: Vec<f64> = (0..5).map(|_| a.uniform(0.0, 1.0)).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.uniform(0.0, 1.0)).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn uniform_stays_in_range_and_degenerate_is_lo() {
        let mut r = AgentRng::new(1, AgentId(0));
        for _ in 0..100 {
            let x = r.uniform(2.0, 5.0);
            assert!((2.0..=5.0).contains(&x));
        }
        assert_eq!(r.uniform(3.0, 3.0), 3.0);
    }

    #[test]
    fn sim_rng_choice_is_reproducible() {
        let items = [10, 20, 30, 40, 50];
        let mut a = SimRng::new(99);
        let mut b = SimRng::new(99);
        for _ in 0..5 {
            assert_eq!(a.choose(&items), b.choose(&items));
        }
        assert!(a.choose::<u8>(&[]).is_none());
    }
}

#[cfg(test)]
mod transport {
    use crate::{RouteId, TransportMode};

    #[test]
    fn walk_has_no_route() {
        assert!(TransportMode::Walk.is_walk());
        assert_eq!(TransportMode::Walk.route(), None);
        assert_eq!(TransportMode::Transit(RouteId(4)).route(), Some(RouteId(4)));
        assert_eq!(TransportMode::Transit(RouteId(4)).to_string(), "transit:4");
    }
}
