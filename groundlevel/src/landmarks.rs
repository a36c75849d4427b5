//! Landmark comparisons.
//!
//! A small catalogue of well-known places with their elevations, used to put
//! a resolved elevation into perspective ("You are 120m higher than ...").
//! The built-in catalogue can be extended from a JSON file of the form:
//!
//! ```json
//! [{ "name": "Home Hill", "type": "hill", "elevation_meters": 212 }]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::{format_with_separators, Unit};

/// Default tolerance for [`LandmarkCatalog::find_closest`], in meters.
pub const DEFAULT_CLOSEST_TOLERANCE_M: f64 = 200.0;

/// Default result count for [`LandmarkCatalog::find_nearby`].
pub const DEFAULT_NEARBY_COUNT: usize = 3;

/// Default tolerance for [`LandmarkCatalog::find_nearby`], in meters.
pub const DEFAULT_NEARBY_TOLERANCE_M: f64 = 500.0;

/// Below this difference two heights are reported as "about the same".
const SAME_HEIGHT_M: f64 = 10.0;

const BUILTIN: &[(&str, &str, f64)] = &[
    ("Dead Sea Shore", "depression", -430.0),
    ("Badwater Basin", "depression", -86.0),
    ("Sea Level", "reference", 0.0),
    ("Statue of Liberty", "monument", 93.0),
    ("Eiffel Tower", "building", 330.0),
    ("Empire State Building", "building", 381.0),
    ("Burj Khalifa", "building", 828.0),
    ("London", "city", 11.0),
    ("Chicago", "city", 181.0),
    ("Atlanta", "city", 320.0),
    ("Denver", "city", 1609.0),
    ("Johannesburg", "city", 1753.0),
    ("Mexico City", "city", 2240.0),
    ("Bogotá", "city", 2640.0),
    ("Quito", "city", 2850.0),
    ("La Paz", "city", 3640.0),
    ("Ben Nevis", "mountain", 1345.0),
    ("Mount Washington", "mountain", 1917.0),
    ("Mount Kosciuszko", "mountain", 2228.0),
    ("Mount Fuji", "mountain", 3776.0),
    ("Pikes Peak", "mountain", 4302.0),
    ("Mount Rainier", "mountain", 4392.0),
    ("Mont Blanc", "mountain", 4806.0),
    ("Kilimanjaro", "mountain", 5895.0),
    ("Denali", "mountain", 6190.0),
    ("Aconcagua", "mountain", 6961.0),
    ("Mount Everest", "mountain", 8849.0),
    ("Lake Tahoe", "lake", 1897.0),
    ("Lake Titicaca", "lake", 3812.0),
];

/// Errors loading landmark data.
#[derive(Debug, Error)]
pub enum LandmarkError {
    #[error("Failed to read landmark file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid landmark data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A place with a known elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub elevation_meters: f64,
}

impl Landmark {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, elevation_meters: f64) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            elevation_meters,
        }
    }

    fn diff(&self, elevation: f64) -> f64 {
        (elevation - self.elevation_meters).abs()
    }
}

/// A searchable set of landmarks.
#[derive(Debug, Clone, Default)]
pub struct LandmarkCatalog {
    landmarks: Vec<Landmark>,
}

impl LandmarkCatalog {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// The catalogue shipped with the library.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(name, kind, elevation)| Landmark::new(*name, *kind, *elevation))
                .collect(),
        )
    }

    /// Parses a JSON array of landmarks.
    pub fn from_json(json: &str) -> Result<Self, LandmarkError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Appends landmarks from a JSON file. Returns how many were added.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, LandmarkError> {
        let json = std::fs::read_to_string(path)?;
        let extra = Self::from_json(&json)?.landmarks;
        let added = extra.len();
        self.landmarks.extend(extra);
        Ok(added)
    }

    pub fn all(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// The landmark nearest in height, if within `tolerance` meters.
    ///
    /// On equal differences the earlier catalogue entry wins.
    pub fn find_closest(&self, elevation: f64, tolerance: f64) -> Option<&Landmark> {
        let mut closest: Option<(&Landmark, f64)> = None;
        for landmark in &self.landmarks {
            let diff = landmark.diff(elevation);
            if closest.map_or(true, |(_, best)| diff < best) {
                closest = Some((landmark, diff));
            }
        }
        closest
            .filter(|(_, diff)| *diff <= tolerance)
            .map(|(landmark, _)| landmark)
    }

    /// Up to `count` landmarks within `tolerance` meters, nearest first.
    pub fn find_nearby(&self, elevation: f64, count: usize, tolerance: f64) -> Vec<&Landmark> {
        let mut nearby: Vec<(&Landmark, f64)> = self
            .landmarks
            .iter()
            .map(|landmark| (landmark, landmark.diff(elevation)))
            .filter(|(_, diff)| *diff <= tolerance)
            .collect();
        nearby.sort_by(|a, b| a.1.total_cmp(&b.1));
        nearby.into_iter().take(count).map(|(l, _)| l).collect()
    }

    pub fn by_kind(&self, kind: &str) -> Vec<&Landmark> {
        self.landmarks.iter().filter(|l| l.kind == kind).collect()
    }

    /// Landmarks with `min <= elevation <= max`.
    pub fn in_range(&self, min: f64, max: f64) -> Vec<&Landmark> {
        self.landmarks
            .iter()
            .filter(|l| l.elevation_meters >= min && l.elevation_meters <= max)
            .collect()
    }

    /// Case-insensitive lookup by name.
    pub fn by_name(&self, name: &str) -> Option<&Landmark> {
        let name = name.to_lowercase();
        self.landmarks.iter().find(|l| l.name.to_lowercase() == name)
    }

    /// Distinct landmark kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        self.landmarks
            .iter()
            .map(|l| l.kind.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Describes `elevation` relative to `landmark`, e.g.
/// `"You are 328ft higher than Denver"`.
pub fn comparison_message(elevation: f64, landmark: &Landmark, unit: Unit) -> String {
    let diff = elevation - landmark.elevation_meters;
    let shown = format_with_separators(unit.convert(diff.abs()).round(), 0);

    if diff.abs() < SAME_HEIGHT_M {
        format!("You are at about the same height as {}", landmark.name)
    } else if diff > 0.0 {
        format!("You are {}{} higher than {}", shown, unit.label(), landmark.name)
    } else {
        format!("You are {}{} lower than {}", shown, unit.label(), landmark.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LandmarkCatalog {
        LandmarkCatalog::new(vec![
            Landmark::new("Low Point", "depression", -50.0),
            Landmark::new("Harbor", "city", 5.0),
            Landmark::new("Mesa", "city", 1600.0),
            Landmark::new("Ridge", "mountain", 1750.0),
            Landmark::new("Summit", "mountain", 4000.0),
        ])
    }

    #[test]
    fn test_find_closest_within_tolerance() {
        let catalog = catalog();
        assert_eq!(
            catalog
                .find_closest(1650.0, DEFAULT_CLOSEST_TOLERANCE_M)
                .map(|l| l.name.as_str()),
            Some("Mesa")
        );
        assert!(catalog.find_closest(3000.0, DEFAULT_CLOSEST_TOLERANCE_M).is_none());
        assert!(LandmarkCatalog::default().find_closest(0.0, 1e9).is_none());
    }

    #[test]
    fn test_find_nearby_sorted_and_limited() {
        let catalog = catalog();
        let names: Vec<_> = catalog
            .find_nearby(1700.0, DEFAULT_NEARBY_COUNT, DEFAULT_NEARBY_TOLERANCE_M)
            .into_iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ridge", "Mesa"]);

        assert_eq!(catalog.find_nearby(0.0, 1, 100.0)[0].name, "Harbor");
    }

    #[test]
    fn test_filters() {
        let catalog = catalog();
        assert_eq!(catalog.by_kind("mountain").len(), 2);
        assert_eq!(catalog.in_range(0.0, 1750.0).len(), 3);
        assert_eq!(catalog.by_name("sUmMiT").unwrap().elevation_meters, 4000.0);
        assert!(catalog.by_name("Nowhere").is_none());
        assert_eq!(catalog.kinds(), vec!["city", "depression", "mountain"]);
    }

    #[test]
    fn test_comparison_message() {
        let mesa = Landmark::new("Mesa", "city", 1600.0);
        assert_eq!(
            comparison_message(1605.0, &mesa, Unit::Meters),
            "You are at about the same height as Mesa"
        );
        assert_eq!(
            comparison_message(1700.0, &mesa, Unit::Meters),
            "You are 100m higher than Mesa"
        );
        assert_eq!(
            comparison_message(1500.0, &mesa, Unit::Feet),
            "You are 328ft lower than Mesa"
        );
        assert_eq!(
            comparison_message(3000.0, &mesa, Unit::Feet),
            "You are 4,593ft higher than Mesa"
        );
    }

    #[test]
    fn test_json_extension() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("extra.json");
        std::fs::write(
            &path,
            r#"[{"name":"Home Hill","type":"hill","elevation_meters":212}]"#,
        )
        .unwrap();

        let mut catalog = LandmarkCatalog::builtin();
        let before = catalog.len();
        assert_eq!(catalog.extend_from_file(&path).unwrap(), 1);
        assert_eq!(catalog.len(), before + 1);
        assert_eq!(catalog.by_name("home hill").unwrap().kind, "hill");

        assert!(matches!(
            LandmarkCatalog::from_json("{"),
            Err(LandmarkError::Parse(_))
        ));
    }

    #[test]
    fn test_builtin_is_plausible() {
        let catalog = LandmarkCatalog::builtin();
        assert!(!catalog.is_empty());
        assert!(catalog
            .all()
            .iter()
            .all(|l| crate::sample::is_plausible(l.elevation_meters, 0.0, 0.0)));
    }
}
