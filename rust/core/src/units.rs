// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit extraction
//!
//! Geometry is converted to meters on load; this module finds the factor.

use crate::decoder::EntityDecoder;
use crate::error::Result;
use crate::schema::IfcType;

/// SI prefix multipliers (IfcSIPrefix)
#[inline]
pub fn get_si_prefix_multiplier(prefix: &str) -> f64 {
    match prefix {
        "ATTO" => 1e-18,
        "FEMTO" => 1e-15,
        "PICO" => 1e-12,
        "NANO" => 1e-9,
        "MICRO" => 1e-6,
        "MILLI" => 1e-3,
        "CENTI" => 1e-2,
        "DECI" => 1e-1,
        "DECA" => 1e1,
        "HECTO" => 1e2,
        "KILO" => 1e3,
        "MEGA" => 1e6,
        "GIGA" => 1e9,
        "TERA" => 1e12,
        "PETA" => 1e15,
        "EXA" => 1e18,
        _ => 1.0,
    }
}

/// Length unit scale of the project (multiplier to meters)
///
/// Follows IFCPROJECT → IFCUNITASSIGNMENT → IFCSIUNIT / IFCCONVERSIONBASEDUNIT.
/// Returns 1.0 when nothing usable is declared.
pub fn extract_length_unit_scale(decoder: &mut EntityDecoder, project_id: u32) -> Result<f64> {
    let project = decoder.decode_by_id(project_id)?;
    if project.ifc_type != IfcType::IfcProject {
        return Ok(1.0);
    }

    // IfcProject: [8]=UnitsInContext
    let Some(assignment_id) = project.get_ref(8) else {
        return Ok(1.0);
    };
    let assignment = decoder.decode_by_id(assignment_id)?;
    if assignment.ifc_type != IfcType::IfcUnitAssignment {
        return Ok(1.0);
    }

    for unit_id in assignment.get_refs(0) {
        let Ok(unit) = decoder.decode_by_id(unit_id) else {
            continue;
        };

        match unit.ifc_type {
            // IfcSIUnit: [0]=Dimensions, [1]=UnitType, [2]=Prefix, [3]=Name
            IfcType::IfcSIUnit => {
                if unit.get_enum(1) != Some("LENGTHUNIT") {
                    continue;
                }
                return Ok(unit.get_enum(2).map(get_si_prefix_multiplier).unwrap_or(1.0));
            }
            // IfcConversionBasedUnit: [0]=Dimensions, [1]=UnitType, [2]=Name, [3]=ConversionFactor
            IfcType::IfcConversionBasedUnit => {
                if unit.get_enum(1) != Some("LENGTHUNIT") {
                    continue;
                }
                if let Some(scale) = conversion_factor(decoder, unit.get_ref(3))? {
                    return Ok(scale);
                }
                let name = unit.get_string(2).unwrap_or_default().to_ascii_uppercase();
                return Ok(match name.as_str() {
                    "FOOT" | "FEET" => 0.3048,
                    "INCH" => 0.0254,
                    _ => 1.0,
                });
            }
            _ => {}
        }
    }

    Ok(1.0)
}

/// IfcMeasureWithUnit: [0]=ValueComponent, [1]=UnitComponent (an SI unit)
fn conversion_factor(decoder: &mut EntityDecoder, measure_id: Option<u32>) -> Result<Option<f64>> {
    let Some(measure_id) = measure_id else {
        return Ok(None);
    };
    let measure = decoder.decode_by_id(measure_id)?;
    let Some(value) = measure.get_float(0) else {
        return Ok(None);
    };

    let base = match measure.get_ref(1) {
        Some(si_id) => {
            let si = decoder.decode_by_id(si_id)?;
            si.get_enum(2).map(get_si_prefix_multiplier).unwrap_or(1.0)
        }
        None => 1.0,
    };

    Ok(Some(value * base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_si_prefix_multipliers() {
        assert_eq!(get_si_prefix_multiplier("MILLI"), 0.001);
        assert_eq!(get_si_prefix_multiplier("CENTI"), 0.01);
        assert_eq!(get_si_prefix_multiplier("KILO"), 1000.0);
        assert_eq!(get_si_prefix_multiplier("UNKNOWN"), 1.0);
    }

    #[test]
    fn test_millimetre_project() {
        let content = "DATA;\n#1=IFCPROJECT('p',$,'P',$,$,$,$,$,#2);\n#2=IFCUNITASSIGNMENT((#3,#4));\n#3=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);\n#4=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);\nENDSEC;";
        let mut decoder = EntityDecoder::new(content);
        assert_eq!(extract_length_unit_scale(&mut decoder, 1).unwrap(), 0.001);
    }

    #[test]
    fn test_foot_project() {
        let content = "DATA;\n#1=IFCPROJECT('p',$,'P',$,$,$,$,$,#2);\n#2=IFCUNITASSIGNMENT((#5));\n#4=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);\n#5=IFCCONVERSIONBASEDUNIT(#6,.LENGTHUNIT.,'FOOT',#7);\n#6=IFCDIMENSIONALEXPONENTS(1,0,0,0,0,0,0);\n#7=IFCMEASUREWITHUNIT(IFCLENGTHMEASURE(0.3048),#4);\nENDSEC;";
        let mut decoder = EntityDecoder::new(content);
        let scale = extract_length_unit_scale(&mut decoder, 1).unwrap();
        assert!((scale - 0.3048).abs() < 1e-12);
    }

    #[test]
    fn test_no_units() {
        let content = "DATA;\n#1=IFCPROJECT('p',$,'P',$,$,$,$,$,$);\nENDSEC;";
        let mut decoder = EntityDecoder::new(content);
        assert_eq!(extract_length_unit_scale(&mut decoder, 1).unwrap(), 1.0);
    }
}
