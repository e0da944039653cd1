//! Projection parameter model.
//!
//! A [Projection] is a projection code plus a closed table of typed
//! parameter slots. Every slot carries a default; a slot only counts
//! as _set_ after an explicit [Projection::set_parameter], and only set
//! slots take part in the textual forms ([Projection::to_wkt],
//! [Projection::to_proj4]) and therefore in [Projection::is_equal].

use crate::CoordSysError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Recognized projection codes.
pub const CODES: [&str; 5] = ["latlon", "utm", "tmerc", "merc", "unknown"];

/// Parameter kinds, in serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProjectionParam {
    FalseEasting,
    FalseNorthing,
    CentralMeridian,
    LatitudeOfOrigin,
    ScaleFactor,
    StandardParallel1,
    StandardParallel2,
    Zone,
    North,
    Height,
    Tilted,
    AzimuthYAxis,
    AzimuthCentralLine,
    NorthOriented,
}

impl ProjectionParam {
    pub const ALL: [Self; 14] = [
        Self::FalseEasting,
        Self::FalseNorthing,
        Self::CentralMeridian,
        Self::LatitudeOfOrigin,
        Self::ScaleFactor,
        Self::StandardParallel1,
        Self::StandardParallel2,
        Self::Zone,
        Self::North,
        Self::Height,
        Self::Tilted,
        Self::AzimuthYAxis,
        Self::AzimuthCentralLine,
        Self::NorthOriented,
    ];

    /// External (WKT) name.
    pub fn name(self) -> &'static str {
        match self {
            Self::FalseEasting => "false_easting",
            Self::FalseNorthing => "false_northing",
            Self::CentralMeridian => "central_meridian",
            Self::LatitudeOfOrigin => "latitude_of_origin",
            Self::ScaleFactor => "scale_factor",
            Self::StandardParallel1 => "standard_parallel_1",
            Self::StandardParallel2 => "standard_parallel_2",
            Self::Zone => "zone",
            Self::North => "north",
            Self::Height => "height",
            Self::Tilted => "tilted",
            Self::AzimuthYAxis => "azimuth_y_axis",
            Self::AzimuthCentralLine => "azimuth",
            Self::NorthOriented => "north_oriented",
        }
    }

    fn proj4_key(self) -> &'static str {
        match self {
            Self::FalseEasting => "x_0",
            Self::FalseNorthing => "y_0",
            Self::CentralMeridian => "lon_0",
            Self::LatitudeOfOrigin => "lat_0",
            Self::ScaleFactor => "k_0",
            Self::StandardParallel1 => "lat_1",
            Self::StandardParallel2 => "lat_2",
            Self::Zone => "zone",
            Self::North => "north",
            Self::Height => "h",
            Self::Tilted => "tilted",
            Self::AzimuthYAxis => "alpha",
            Self::AzimuthCentralLine => "gamma",
            Self::NorthOriented => "no_rot",
        }
    }

    /// Parses an external name.
    pub fn from_name(name: &str) -> Result<Self, CoordSysError> {
        Self::ALL
            .into_iter()
            .find(|param| param.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CoordSysError::UnknownParameter(name.to_owned()))
    }

    fn default_value(self) -> ParamValue {
        match self {
            Self::ScaleFactor => ParamValue::Number(1.0),
            Self::Zone => ParamValue::Number(1.0),
            Self::North | Self::NorthOriented => ParamValue::Flag(true),
            Self::Tilted => ParamValue::Flag(false),
            _ => ParamValue::Number(0.0),
        }
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Flag(bool),
}

impl ParamValue {
    fn type_name(self) -> &'static str {
        match self {
            Self::Number(_) => "numeric",
            Self::Flag(_) => "boolean",
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Flag(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    value: ParamValue,
    is_set: bool,
}

#[derive(Debug, Clone)]
pub struct Projection {
    code: String,
    parameters: BTreeMap<ProjectionParam, Slot>,
}

impl Projection {
    /// Returns a projection of type `code` with every parameter at its
    /// default and unset.
    pub fn new(code: &str) -> Result<Self, CoordSysError> {
        let code = code.to_lowercase();
        if !CODES.contains(&code.as_str()) {
            return Err(CoordSysError::UnknownProjection(code));
        }
        Ok(Self::with_defaults(code))
    }

    /// A projection for one of the known [CODES].
    pub(crate) fn builtin(code: &'static str) -> Self {
        debug_assert!(CODES.contains(&code));
        Self::with_defaults(code.to_owned())
    }

    fn with_defaults(code: String) -> Self {
        let parameters = ProjectionParam::ALL
            .into_iter()
            .map(|param| {
                let slot = Slot {
                    value: param.default_value(),
                    is_set: false,
                };
                (param, slot)
            })
            .collect();
        Self { code, parameters }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the stored value, set or default.
    pub fn parameter(&self, param: ProjectionParam) -> Option<ParamValue> {
        self.parameters.get(&param).map(|slot| slot.value)
    }

    pub fn number(&self, param: ProjectionParam) -> Option<f64> {
        match self.parameter(param)? {
            ParamValue::Number(v) => Some(v),
            ParamValue::Flag(_) => None,
        }
    }

    pub fn flag(&self, param: ProjectionParam) -> Option<bool> {
        match self.parameter(param)? {
            ParamValue::Flag(v) => Some(v),
            ParamValue::Number(_) => None,
        }
    }

    /// Stores `value` and marks the slot set.
    ///
    /// The value must have the same type as the slot's default.
    pub fn set_parameter(
        &mut self,
        param: ProjectionParam,
        value: impl Into<ParamValue>,
    ) -> Result<(), CoordSysError> {
        let value = value.into();
        let expected = param.default_value().type_name();
        if value.type_name() != expected {
            return Err(CoordSysError::ParameterType {
                name: param.name(),
                expected,
            });
        }
        if let (ProjectionParam::Zone, ParamValue::Number(zone)) = (param, value) {
            #[allow(clippy::cast_possible_truncation)]
            if zone.fract() != 0.0 || !(1.0..=60.0).contains(&zone) {
                return Err(CoordSysError::UtmZone(zone as i64));
            }
        }
        self.parameters.insert(
            param,
            Slot {
                value,
                is_set: true,
            },
        );
        Ok(())
    }

    pub fn is_set(&self, param: ProjectionParam) -> bool {
        self.parameters.get(&param).map_or(false, |slot| slot.is_set)
    }

    /// Returns true if both projections serialize identically.
    pub fn is_equal(&self, other: &Self) -> bool {
        self.to_proj4() == other.to_proj4()
    }

    /// WKT style `PARAMETER[...]` list of the set parameters.
    ///
    /// Entries are indented by `spaces` and, when `spaces` is not zero,
    /// each one ends its own line. For UTM the zone is replaced by the
    /// fixed UTM constants and the zone's central meridian.
    pub fn to_wkt(&self, spaces: usize) -> String {
        let indent = " ".repeat(spaces);
        let ending = if spaces == 0 { "" } else { "\n" };
        let is_utm = self.code == "utm";

        let mut entries = Vec::new();
        for (param, slot) in self.set_slots() {
            match (param, slot.value) {
                (ProjectionParam::Zone, ParamValue::Number(zone)) if is_utm => {
                    entries.extend([
                        wkt_entry("scale_factor", 0.9996),
                        wkt_entry("false_easting", 500_000),
                        wkt_entry("false_northing", 0),
                        wkt_entry("scale", 0.9996),
                        wkt_entry("latitude_of_origin", 0),
                        wkt_entry("central_meridian", utm_central_meridian(zone)),
                    ]);
                }
                (param, value) => entries.push(wkt_entry(param.name(), value)),
            }
        }

        let mut wkt = entries
            .iter()
            .map(|entry| format!("{indent}{entry}"))
            .collect::<Vec<_>>()
            .join(&format!(",{ending}"));
        if !wkt.is_empty() {
            wkt.push_str(ending);
        }
        wkt
    }

    /// proj4 style definition of the set parameters.
    pub fn to_proj4(&self) -> String {
        let mut proj4 = format!("+proj={}", self.code);
        for (param, slot) in self.set_slots() {
            match slot.value {
                ParamValue::Flag(true) => proj4.push_str(&format!(" +{}", param.proj4_key())),
                ParamValue::Flag(false) => proj4.push_str(&format!(" +{}=false", param.proj4_key())),
                ParamValue::Number(v) => proj4.push_str(&format!(" +{}={v}", param.proj4_key())),
            }
        }
        proj4
    }
}

/// Private API
impl Projection {
    fn set_slots(&self) -> impl Iterator<Item = (ProjectionParam, &Slot)> + '_ {
        self.parameters
            .iter()
            .filter(|(_, slot)| slot.is_set)
            .map(|(param, slot)| (*param, slot))
    }

    /// proj4rs definition of the projection alone, `None` for systems
    /// without earth relation.
    pub(crate) fn proj_definition(&self) -> Option<String> {
        use ProjectionParam as P;
        let number = |param| self.number(param).unwrap_or(0.0);
        let definition = match self.code.as_str() {
            "latlon" => "+proj=longlat".to_owned(),
            "utm" => {
                let south = if self.flag(P::North).unwrap_or(true) {
                    ""
                } else {
                    " +south"
                };
                format!("+proj=utm +zone={}{south}", number(P::Zone))
            }
            "tmerc" => format!(
                "+proj=tmerc +lat_0={} +lon_0={} +k_0={} +x_0={} +y_0={}",
                number(P::LatitudeOfOrigin),
                number(P::CentralMeridian),
                number(P::ScaleFactor),
                number(P::FalseEasting),
                number(P::FalseNorthing),
            ),
            "merc" => format!(
                "+proj=merc +lon_0={} +k_0={} +x_0={} +y_0={}",
                number(P::CentralMeridian),
                number(P::ScaleFactor),
                number(P::FalseEasting),
                number(P::FalseNorthing),
            ),
            _ => return None,
        };
        Some(definition)
    }
}

impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_proj4())
    }
}

fn wkt_entry(name: &str, value: impl fmt::Display) -> String {
    format!("PARAMETER[\"{name}\",{value}]")
}

/// Central meridian (degrees) of UTM `zone`.
pub fn utm_central_meridian(zone: f64) -> f64 {
    zone * 6.0 - 183.0
}

#[cfg(test)]
mod tests {
    use super::{ParamValue, Projection, ProjectionParam as P};
    use crate::CoordSysError;

    #[test]
    fn test_defaults_are_unset() {
        let proj = Projection::new("tmerc").unwrap();
        assert!(!P::ALL.iter().any(|param| proj.is_set(*param)));
        assert_eq!(proj.number(P::ScaleFactor), Some(1.0));
        assert_eq!(proj.flag(P::North), Some(true));
        assert_eq!(proj.to_wkt(0), "");
        assert_eq!(proj.to_proj4(), "+proj=tmerc");
    }

    #[test]
    fn test_set_parameter_marks_set() {
        let mut proj = Projection::new("tmerc").unwrap();
        proj.set_parameter(P::ScaleFactor, 1.0).unwrap();
        assert!(proj.is_set(P::ScaleFactor));
        assert_eq!(proj.parameter(P::ScaleFactor), Some(ParamValue::Number(1.0)));
        assert!(!proj.is_set(P::FalseEasting));
    }

    #[test]
    fn test_set_parameter_type_checked() {
        let mut proj = Projection::new("tmerc").unwrap();
        assert_eq!(
            proj.set_parameter(P::North, 1.0),
            Err(CoordSysError::ParameterType {
                name: "north",
                expected: "boolean"
            })
        );
        assert!(!proj.is_set(P::North));
        assert_eq!(proj.set_parameter(P::Zone, 61.0), Err(CoordSysError::UtmZone(61)));
    }

    #[test]
    fn test_wkt_emits_only_set_parameters_in_order() {
        let mut proj = Projection::new("tmerc").unwrap();
        proj.set_parameter(P::ScaleFactor, 0.9999).unwrap();
        proj.set_parameter(P::FalseEasting, 150_000.0).unwrap();
        proj.set_parameter(P::CentralMeridian, 5.5).unwrap();
        assert_eq!(
            proj.to_wkt(0),
            "PARAMETER[\"false_easting\",150000],\
             PARAMETER[\"central_meridian\",5.5],\
             PARAMETER[\"scale_factor\",0.9999]"
        );
    }

    #[test]
    fn test_wkt_indentation() {
        let mut proj = Projection::new("merc").unwrap();
        proj.set_parameter(P::FalseEasting, 1.0).unwrap();
        proj.set_parameter(P::FalseNorthing, 2.0).unwrap();
        assert_eq!(
            proj.to_wkt(2),
            "  PARAMETER[\"false_easting\",1],\n  PARAMETER[\"false_northing\",2]\n"
        );
    }

    #[test]
    fn test_wkt_utm_zone_substitution() {
        let mut proj = Projection::new("utm").unwrap();
        proj.set_parameter(P::Zone, 31.0).unwrap();
        assert_eq!(
            proj.to_wkt(0),
            "PARAMETER[\"scale_factor\",0.9996],\
             PARAMETER[\"false_easting\",500000],\
             PARAMETER[\"false_northing\",0],\
             PARAMETER[\"scale\",0.9996],\
             PARAMETER[\"latitude_of_origin\",0],\
             PARAMETER[\"central_meridian\",3]"
        );

        // Zone only substitutes for utm.
        let mut proj = Projection::new("tmerc").unwrap();
        proj.set_parameter(P::Zone, 31.0).unwrap();
        assert_eq!(proj.to_wkt(0), "PARAMETER[\"zone\",31]");

        // Unset zone on utm emits nothing.
        assert_eq!(Projection::new("utm").unwrap().to_wkt(0), "");
    }

    #[test]
    fn test_wkt_utm_block_separated_like_any_entry() {
        let mut proj = Projection::new("utm").unwrap();
        proj.set_parameter(P::Zone, 32.0).unwrap();
        proj.set_parameter(P::North, false).unwrap();
        assert_eq!(
            proj.to_wkt(1),
            " PARAMETER[\"scale_factor\",0.9996],\n \
             PARAMETER[\"false_easting\",500000],\n \
             PARAMETER[\"false_northing\",0],\n \
             PARAMETER[\"scale\",0.9996],\n \
             PARAMETER[\"latitude_of_origin\",0],\n \
             PARAMETER[\"central_meridian\",9],\n \
             PARAMETER[\"north\",false]\n"
        );
    }

    #[test]
    fn test_proj_definition() {
        let mut utm = Projection::new("utm").unwrap();
        utm.set_parameter(P::Zone, 33.0).unwrap();
        assert_eq!(utm.proj_definition().unwrap(), "+proj=utm +zone=33");
        utm.set_parameter(P::North, false).unwrap();
        assert_eq!(utm.proj_definition().unwrap(), "+proj=utm +zone=33 +south");

        assert_eq!(
            Projection::new("tmerc").unwrap().proj_definition().unwrap(),
            "+proj=tmerc +lat_0=0 +lon_0=0 +k_0=1 +x_0=0 +y_0=0"
        );
        assert_eq!(
            Projection::new("latlon").unwrap().proj_definition().unwrap(),
            "+proj=longlat"
        );
        assert_eq!(Projection::new("unknown").unwrap().proj_definition(), None);
    }

    #[test]
    fn test_equality_is_textual() {
        let mut a = Projection::new("utm").unwrap();
        a.set_parameter(P::Zone, 32.0).unwrap();
        let mut b = Projection::new("UTM").unwrap();
        b.set_parameter(P::Zone, 32.0).unwrap();
        assert_eq!(a, b);

        b.set_parameter(P::North, false).unwrap();
        assert_ne!(a, b);
        assert_eq!(b.to_proj4(), "+proj=utm +zone=32 +north=false");
    }

    #[test]
    fn test_unknown_code_and_parameter() {
        assert_eq!(
            Projection::new("robinson").unwrap_err(),
            CoordSysError::UnknownProjection("robinson".into())
        );
        assert_eq!(P::from_name("Central_Meridian").unwrap(), P::CentralMeridian);
        assert!(P::from_name("bogus").is_err());
    }
}
