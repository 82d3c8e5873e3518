//! Vehicles and their models.
//!
//! | Model      | Max fuel | Consumption (per km) | Seats | Used on                 |
//! |------------|----------|----------------------|-------|-------------------------|
//! | `MAZ-105`  | 300      | 0.4                  | 160   | lines whose name has `P` |
//! | `MAZ-103T` | 160      | 0.3                  | 80    | every other line        |

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BusModel {
    pub name:             &'static str,
    pub max_fuel:         f64,
    pub consumption_rate: f64,
    pub capacity:         u32,
}

pub const MAZ_105: BusModel = BusModel {
    name:             "MAZ-105",
    max_fuel:         300.0,
    consumption_rate: 0.4,
    capacity:         160,
};

pub const MAZ_103T: BusModel = BusModel {
    name:             "MAZ-103T",
    max_fuel:         160.0,
    consumption_rate: 0.3,
    capacity:         80,
};

impl BusModel {
    /// Articulated buses run the `P` lines.
    pub fn for_route(route_name: &str) -> BusModel {
        if route_name.contains('P') { MAZ_105 } else { MAZ_103T }
    }
}

/// A bus in service.  `0 ≤ fuel ≤ max_fuel` and `occupancy ≤ capacity`
/// hold after every method.
#[derive(Clone, Debug)]
pub struct Bus {
    pub model:            &'static str,
    pub fuel:             f64,
    pub max_fuel:         f64,
    pub min_fuel:         f64,
    pub consumption_rate: f64,
    pub capacity:         u32,
    pub occupancy:        u32,
}

impl Bus {
    /// A full, empty bus of `model`.
    pub fn new(model: BusModel, min_fuel: f64) -> Self {
        Self {
            model:            model.name,
            fuel:             model.max_fuel,
            max_fuel:         model.max_fuel,
            min_fuel:         min_fuel.clamp(0.0, model.max_fuel),
            consumption_rate: model.consumption_rate,
            capacity:         model.capacity,
            occupancy:        0,
        }
    }

    /// Burn fuel for `length_km`, saturating at zero.  Returns the amount
    /// burnt.
    pub fn spend(&mut self, length_km: f64) -> f64 {
        let burnt = (self.consumption_rate * length_km.max(0.0)).min(self.fuel);
        self.fuel -= burnt;
        burnt
    }

    pub fn refuel(&mut self) {
        self.fuel = self.max_fuel;
    }

    #[inline]
    pub fn is_fuel_low(&self) -> bool {
        self.fuel <= self.min_fuel
    }

    #[inline]
    pub fn has_seat(&self) -> bool {
        self.occupancy < self.capacity
    }

    /// Take a seat; `false` when the bus is full.
    pub fn board(&mut self) -> bool {
        if !self.has_seat() {
            return false;
        }
        self.occupancy += 1;
        true
    }

    pub fn alight(&mut self) {
        self.occupancy = self.occupancy.saturating_sub(1);
    }
}
