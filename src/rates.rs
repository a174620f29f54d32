use serde::Deserialize;

use crate::error::SimError;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RateConstants {
    pub rabbit_birth: f64,
    pub rabbit_predation: f64,
    pub fox_birth: f64,
    pub fox_death: f64,
}

impl Default for RateConstants {
    fn default() -> Self {
        Self {
            rabbit_birth: 0.015,
            rabbit_predation: 0.00004,
            fox_birth: 0.0004,
            fox_death: 0.04,
        }
    }
}

impl RateConstants {
    pub fn new(
        rabbit_birth: f64,
        rabbit_predation: f64,
        fox_birth: f64,
        fox_death: f64,
    ) -> Result<Self, SimError> {
        let rates = Self {
            rabbit_birth,
            rabbit_predation,
            fox_birth,
            fox_death,
        };
        rates.validate()?;
        Ok(rates)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let named = [
            ("rabbit_birth", self.rabbit_birth),
            ("rabbit_predation", self.rabbit_predation),
            ("fox_birth", self.fox_birth),
            ("fox_death", self.fox_death),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "rate constant {name} must be a non-negative finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PopulationState {
    pub rabbits: i32,
    pub foxes: i32,
}

impl Default for PopulationState {
    fn default() -> Self {
        Self::reference()
    }
}

impl PopulationState {
    pub fn new(rabbits: i32, foxes: i32) -> Self {
        Self { rabbits, foxes }
    }

    pub fn reference() -> Self {
        Self::new(400, 200)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.rabbits < 0 || self.foxes < 0 {
            return Err(SimError::InvalidConfig(format!(
                "populations must be non-negative, got {} rabbits and {} foxes",
                self.rabbits, self.foxes
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn apply(&mut self, event: Event) {
        let (rabbits, foxes) = event.delta();
        self.rabbits += rabbits;
        self.foxes += foxes;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    RabbitBirth,
    RabbitDeath,
    FoxBirth,
    FoxDeath,
}

impl Event {
    // partition order for `Propensities::select`
    pub const ALL: [Event; 4] = [
        Event::RabbitBirth,
        Event::RabbitDeath,
        Event::FoxBirth,
        Event::FoxDeath,
    ];

    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Event::RabbitBirth => (1, 0),
            Event::RabbitDeath => (-1, 0),
            Event::FoxBirth => (0, 1),
            Event::FoxDeath => (0, -1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Propensities {
    pub rabbit_birth: f64,
    pub rabbit_death: f64,
    pub fox_birth: f64,
    pub fox_death: f64,
}

impl Propensities {
    #[inline]
    pub fn pairs(&self) -> [(Event, f64); 4] {
        let rates = [
            self.rabbit_birth,
            self.rabbit_death,
            self.fox_birth,
            self.fox_death,
        ];
        std::array::from_fn(|idx| (Event::ALL[idx], rates[idx]))
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.rabbit_birth + self.rabbit_death + self.fox_birth + self.fox_death
    }

    /// Picks the event whose half-open sub-interval of `[0, total)` holds
    /// `target`. A target sitting on a boundary belongs to the later event.
    pub fn select(&self, target: f64) -> Event {
        let pairs = self.pairs();
        let mut cumulative = 0.0;
        for (event, rate) in pairs {
            cumulative += rate;
            if target < cumulative {
                return event;
            }
        }
        // target rounded up onto the total: fall back to the last non-empty interval
        pairs
            .iter()
            .rev()
            .find(|(_, rate)| *rate > 0.0)
            .map_or(Event::FoxDeath, |(event, _)| *event)
    }
}

// Rb = k1*R, Rd = k2*R*F, Fb = k3*R*F, Fd = k4*F
pub fn propensities(
    state: PopulationState,
    rates: &RateConstants,
) -> Result<Propensities, SimError> {
    rates.validate()?;
    state.validate()?;
    let rabbits = f64::from(state.rabbits);
    let foxes = f64::from(state.foxes);
    let encounters = rabbits * foxes;
    Ok(Propensities {
        rabbit_birth: rates.rabbit_birth * rabbits,
        rabbit_death: rates.rabbit_predation * encounters,
        fox_birth: rates.fox_birth * encounters,
        fox_death: rates.fox_death * foxes,
    })
}
