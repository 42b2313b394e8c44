//! Intersection approach flows, links between intersections and stored
//! signal-timing outputs.
//!
//! Values are only range-checked here. Timing outputs are stored as given.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Side of the intersection a traffic flow arrives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Approach {
    North,
    South,
    East,
    West,
}

impl Approach {
    /// Single-letter code stored in `flows_input_data.approach`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "N",
            Self::South => "S",
            Self::East => "E",
            Self::West => "W",
        }
    }

    pub fn all() -> &'static [Approach] {
        &[Self::North, Self::South, Self::East, Self::West]
    }
}

impl FromStr for Approach {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" => Ok(Self::North),
            "S" => Ok(Self::South),
            "E" => Ok(Self::East),
            "W" => Ok(Self::West),
            _ => Err(ValidationError::InvalidVariant {
                field: "approach",
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for Approach {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Approach> for String {
    fn from(approach: Approach) -> Self {
        approach.as_str().to_owned()
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field,
            reason: "must not be negative",
        });
    }
    Ok(())
}

/// Measured traffic for one approach of an intersection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInput {
    pub approach: Approach,
    pub intensity_veh_per_hr: i64,
    /// Fraction of buses in the flow, 0.0 to 1.0.
    pub bus_share: f64,
    pub len_between_intersections: i64,
    pub avg_speed: i64,
}

impl FlowInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("intensity_veh_per_hr", self.intensity_veh_per_hr)?;
        if !(0.0..=1.0).contains(&self.bus_share) {
            return Err(ValidationError::OutOfRange {
                field: "bus_share",
                reason: "must be between 0 and 1",
            });
        }
        non_negative("len_between_intersections", self.len_between_intersections)?;
        non_negative("avg_speed", self.avg_speed)?;
        Ok(())
    }
}

/// Directed link between two intersections of the same project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationInput {
    pub from_intersection_id: i64,
    pub to_intersection_id: i64,
    pub distance: i64,
    pub avg_speed: i64,
}

impl RelationInput {
    /// Checks that do not need the database. Same-project membership is
    /// checked by the repository.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.from_intersection_id == self.to_intersection_id {
            return Err(ValidationError::InvalidFormat {
                field: "to_intersection_id",
                reason: "an intersection cannot be linked to itself",
            });
        }
        non_negative("distance", self.distance)?;
        non_negative("avg_speed", self.avg_speed)?;
        Ok(())
    }
}

/// Signal timing for one intersection, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingOutput {
    pub cycle_north_south: i64,
    pub green_main_north_south: i64,
    pub lost_time_north_south: i64,
    pub cycle_east_west: i64,
    pub green_main_east_west: i64,
    pub lost_time_east_west: i64,
}

impl TimingOutput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("cycle_north_south", self.cycle_north_south)?;
        non_negative("green_main_north_south", self.green_main_north_south)?;
        non_negative("lost_time_north_south", self.lost_time_north_south)?;
        non_negative("cycle_east_west", self.cycle_east_west)?;
        non_negative("green_main_east_west", self.green_main_east_west)?;
        non_negative("lost_time_east_west", self.lost_time_east_west)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> FlowInput {
        FlowInput {
            approach: Approach::North,
            intensity_veh_per_hr: 900,
            bus_share: 0.12,
            len_between_intersections: 350,
            avg_speed: 40,
        }
    }

    #[test]
    fn approach_codes() {
        for approach in Approach::all() {
            assert_eq!(approach.as_str().parse::<Approach>().unwrap(), *approach);
        }
        assert_eq!("w".parse::<Approach>().unwrap(), Approach::West);
        assert!(matches!(
            "X".parse::<Approach>(),
            Err(ValidationError::InvalidVariant { field: "approach", .. })
        ));
    }

    #[test]
    fn approach_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Approach::East).unwrap(), r#""E""#);
        assert!(serde_json::from_str::<Approach>(r#""NE""#).is_err());
    }

    #[test]
    fn flow_bounds() {
        assert!(flow().validate().is_ok());

        let mut bad = flow();
        bad.bus_share = 1.5;
        assert_eq!(bad.validate().unwrap_err().field(), "bus_share");

        let mut bad = flow();
        bad.bus_share = f64::NAN;
        assert!(bad.validate().is_err());

        let mut bad = flow();
        bad.avg_speed = -1;
        assert_eq!(bad.validate().unwrap_err().field(), "avg_speed");
    }

    #[test]
    fn relation_rejects_self_link() {
        let relation = RelationInput {
            from_intersection_id: 3,
            to_intersection_id: 3,
            distance: 100,
            avg_speed: 30,
        };
        assert!(relation.validate().is_err());
    }

    #[test]
    fn timing_output_rejects_negative_values() {
        let output = TimingOutput {
            cycle_north_south: 90,
            green_main_north_south: 40,
            lost_time_north_south: 6,
            cycle_east_west: 90,
            green_main_east_west: -1,
            lost_time_east_west: 6,
        };
        assert_eq!(output.validate().unwrap_err().field(), "green_main_east_west");
    }
}
