// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Schema Types
//!
//! Fast type checking using an enum instead of string comparison. Only the
//! entities the reader interprets are listed; everything else decodes as
//! [`IfcType::Unknown`] and keeps its STEP name on the entity.

use std::fmt;

macro_rules! ifc_types {
    ($($variant:ident => $step:literal),* $(,)?) => {
        /// IFC Entity Types
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum IfcType {
            $($variant,)*
            /// Any type not listed above
            Unknown,
        }

        impl IfcType {
            /// Parse from a STEP type name (case-insensitive)
            pub fn from_str(s: &str) -> Self {
                let upper = s.to_ascii_uppercase();
                match upper.as_str() {
                    $($step => Self::$variant,)*
                    _ => Self::Unknown,
                }
            }

            /// STEP type name, e.g. "IFCWALL"
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $step,)*
                    Self::Unknown => "UNKNOWN",
                }
            }

            /// Readable schema name, e.g. "IfcWall"
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                    Self::Unknown => "Unknown",
                }
            }
        }
    };
}

ifc_types! {
    // Spatial structure
    IfcProject => "IFCPROJECT",
    IfcSite => "IFCSITE",
    IfcBuilding => "IFCBUILDING",
    IfcBuildingStorey => "IFCBUILDINGSTOREY",
    IfcSpace => "IFCSPACE",

    // Building elements
    IfcWall => "IFCWALL",
    IfcWallStandardCase => "IFCWALLSTANDARDCASE",
    IfcWallElementedCase => "IFCWALLELEMENTEDCASE",
    IfcSlab => "IFCSLAB",
    IfcSlabStandardCase => "IFCSLABSTANDARDCASE",
    IfcBeam => "IFCBEAM",
    IfcColumn => "IFCCOLUMN",
    IfcRoof => "IFCROOF",
    IfcStair => "IFCSTAIR",
    IfcStairFlight => "IFCSTAIRFLIGHT",
    IfcRamp => "IFCRAMP",
    IfcRampFlight => "IFCRAMPFLIGHT",
    IfcRailing => "IFCRAILING",
    IfcCurtainWall => "IFCCURTAINWALL",
    IfcPlate => "IFCPLATE",
    IfcMember => "IFCMEMBER",
    IfcCovering => "IFCCOVERING",
    IfcFooting => "IFCFOOTING",
    IfcPile => "IFCPILE",
    IfcChimney => "IFCCHIMNEY",
    IfcShadingDevice => "IFCSHADINGDEVICE",
    IfcBuildingElementProxy => "IFCBUILDINGELEMENTPROXY",
    IfcBuildingElementPart => "IFCBUILDINGELEMENTPART",
    IfcElementAssembly => "IFCELEMENTASSEMBLY",
    IfcReinforcingBar => "IFCREINFORCINGBAR",
    IfcReinforcingMesh => "IFCREINFORCINGMESH",

    // Openings
    IfcDoor => "IFCDOOR",
    IfcWindow => "IFCWINDOW",
    IfcOpeningElement => "IFCOPENINGELEMENT",

    // Furnishing and distribution
    IfcFurnishingElement => "IFCFURNISHINGELEMENT",
    IfcFurniture => "IFCFURNITURE",
    IfcDistributionElement => "IFCDISTRIBUTIONELEMENT",
    IfcFlowSegment => "IFCFLOWSEGMENT",
    IfcFlowFitting => "IFCFLOWFITTING",
    IfcFlowTerminal => "IFCFLOWTERMINAL",
    IfcDuctSegment => "IFCDUCTSEGMENT",
    IfcPipeSegment => "IFCPIPESEGMENT",

    // Relationships
    IfcRelAggregates => "IFCRELAGGREGATES",
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    IfcRelDefinesByProperties => "IFCRELDEFINESBYPROPERTIES",
    IfcRelDefinesByType => "IFCRELDEFINESBYTYPE",
    IfcRelAssociatesMaterial => "IFCRELASSOCIATESMATERIAL",
    IfcRelVoidsElement => "IFCRELVOIDSELEMENT",
    IfcRelFillsElement => "IFCRELFILLSELEMENT",

    // Properties and quantities
    IfcPropertySet => "IFCPROPERTYSET",
    IfcPropertySingleValue => "IFCPROPERTYSINGLEVALUE",
    IfcPropertyEnumeratedValue => "IFCPROPERTYENUMERATEDVALUE",
    IfcPropertyListValue => "IFCPROPERTYLISTVALUE",
    IfcPropertyBoundedValue => "IFCPROPERTYBOUNDEDVALUE",
    IfcElementQuantity => "IFCELEMENTQUANTITY",
    IfcQuantityLength => "IFCQUANTITYLENGTH",
    IfcQuantityArea => "IFCQUANTITYAREA",
    IfcQuantityVolume => "IFCQUANTITYVOLUME",
    IfcQuantityCount => "IFCQUANTITYCOUNT",
    IfcQuantityWeight => "IFCQUANTITYWEIGHT",
    IfcQuantityTime => "IFCQUANTITYTIME",

    // Representation
    IfcProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE",
    IfcShapeRepresentation => "IFCSHAPEREPRESENTATION",
    IfcMappedItem => "IFCMAPPEDITEM",
    IfcRepresentationMap => "IFCREPRESENTATIONMAP",
    IfcCartesianTransformationOperator3D => "IFCCARTESIANTRANSFORMATIONOPERATOR3D",
    IfcCartesianTransformationOperator3DnonUniform => "IFCCARTESIANTRANSFORMATIONOPERATOR3DNONUNIFORM",

    // Placement
    IfcLocalPlacement => "IFCLOCALPLACEMENT",
    IfcAxis2Placement3D => "IFCAXIS2PLACEMENT3D",
    IfcAxis2Placement2D => "IFCAXIS2PLACEMENT2D",
    IfcCartesianPoint => "IFCCARTESIANPOINT",
    IfcDirection => "IFCDIRECTION",

    // Solids and meshes
    IfcExtrudedAreaSolid => "IFCEXTRUDEDAREASOLID",
    IfcTriangulatedFaceSet => "IFCTRIANGULATEDFACESET",
    IfcPolygonalFaceSet => "IFCPOLYGONALFACESET",
    IfcIndexedPolygonalFace => "IFCINDEXEDPOLYGONALFACE",
    IfcIndexedPolygonalFaceWithVoids => "IFCINDEXEDPOLYGONALFACEWITHVOIDS",
    IfcCartesianPointList2D => "IFCCARTESIANPOINTLIST2D",
    IfcCartesianPointList3D => "IFCCARTESIANPOINTLIST3D",
    IfcFacetedBrep => "IFCFACETEDBREP",
    IfcFacetedBrepWithVoids => "IFCFACETEDBREPWITHVOIDS",
    IfcClosedShell => "IFCCLOSEDSHELL",
    IfcOpenShell => "IFCOPENSHELL",
    IfcFace => "IFCFACE",
    IfcFaceOuterBound => "IFCFACEOUTERBOUND",
    IfcFaceBound => "IFCFACEBOUND",
    IfcPolyLoop => "IFCPOLYLOOP",
    IfcShellBasedSurfaceModel => "IFCSHELLBASEDSURFACEMODEL",
    IfcBooleanResult => "IFCBOOLEANRESULT",
    IfcBooleanClippingResult => "IFCBOOLEANCLIPPINGRESULT",

    // Curves and profiles
    IfcPolyline => "IFCPOLYLINE",
    IfcIndexedPolyCurve => "IFCINDEXEDPOLYCURVE",
    IfcRectangleProfileDef => "IFCRECTANGLEPROFILEDEF",
    IfcCircleProfileDef => "IFCCIRCLEPROFILEDEF",
    IfcArbitraryClosedProfileDef => "IFCARBITRARYCLOSEDPROFILEDEF",
    IfcArbitraryProfileDefWithVoids => "IFCARBITRARYPROFILEDEFWITHVOIDS",

    // Presentation
    IfcStyledItem => "IFCSTYLEDITEM",
    IfcPresentationStyleAssignment => "IFCPRESENTATIONSTYLEASSIGNMENT",
    IfcSurfaceStyle => "IFCSURFACESTYLE",
    IfcSurfaceStyleRendering => "IFCSURFACESTYLERENDERING",
    IfcSurfaceStyleShading => "IFCSURFACESTYLESHADING",
    IfcColourRgb => "IFCCOLOURRGB",

    // Units
    IfcUnitAssignment => "IFCUNITASSIGNMENT",
    IfcSIUnit => "IFCSIUNIT",
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
    IfcMeasureWithUnit => "IFCMEASUREWITHUNIT",
}

impl IfcType {
    /// Check if type is a spatial structure element
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            Self::IfcProject | Self::IfcSite | Self::IfcBuilding | Self::IfcBuildingStorey | Self::IfcSpace
        )
    }

    /// Check if type is a physical building element
    pub fn is_building_element(&self) -> bool {
        matches!(
            self,
            Self::IfcWall
                | Self::IfcWallStandardCase
                | Self::IfcWallElementedCase
                | Self::IfcSlab
                | Self::IfcSlabStandardCase
                | Self::IfcBeam
                | Self::IfcColumn
                | Self::IfcRoof
                | Self::IfcStair
                | Self::IfcStairFlight
                | Self::IfcRamp
                | Self::IfcRampFlight
                | Self::IfcRailing
                | Self::IfcCurtainWall
                | Self::IfcPlate
                | Self::IfcMember
                | Self::IfcCovering
                | Self::IfcFooting
                | Self::IfcPile
                | Self::IfcChimney
                | Self::IfcShadingDevice
                | Self::IfcBuildingElementProxy
                | Self::IfcBuildingElementPart
                | Self::IfcElementAssembly
                | Self::IfcReinforcingBar
                | Self::IfcReinforcingMesh
                | Self::IfcDoor
                | Self::IfcWindow
        )
    }

    /// Check if type is an objectified relationship
    pub fn is_relationship(&self) -> bool {
        self.as_str().starts_with("IFCREL")
    }

    /// Check if instances of this type are rendered by the viewer
    ///
    /// Openings and spaces carry geometry but are not drawn.
    pub fn has_geometry(&self) -> bool {
        self.is_building_element()
            || matches!(
                self,
                Self::IfcFurnishingElement
                    | Self::IfcFurniture
                    | Self::IfcDistributionElement
                    | Self::IfcFlowSegment
                    | Self::IfcFlowFitting
                    | Self::IfcFlowTerminal
                    | Self::IfcDuctSegment
                    | Self::IfcPipeSegment
                    | Self::IfcSite
            )
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fast geometry filter on a raw STEP type name
pub fn has_geometry_by_name(type_name: &str) -> bool {
    IfcType::from_str(type_name).has_geometry()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(IfcType::from_str("IFCWALL"), IfcType::IfcWall);
        assert_eq!(IfcType::from_str("IfcWallStandardCase"), IfcType::IfcWallStandardCase);
        assert_eq!(IfcType::from_str("IFCSIUNIT"), IfcType::IfcSIUnit);
        assert_eq!(IfcType::from_str("IFCNOTATYPE"), IfcType::Unknown);
    }

    #[test]
    fn test_names() {
        assert_eq!(IfcType::IfcBuildingStorey.as_str(), "IFCBUILDINGSTOREY");
        assert_eq!(IfcType::IfcBuildingStorey.name(), "IfcBuildingStorey");
        assert_eq!(IfcType::IfcDoor.to_string(), "IfcDoor");
    }

    #[test]
    fn test_classification() {
        assert!(IfcType::IfcBuildingStorey.is_spatial());
        assert!(!IfcType::IfcWall.is_spatial());
        assert!(IfcType::IfcRelAggregates.is_relationship());
        assert!(IfcType::IfcWall.has_geometry());
        assert!(!IfcType::IfcOpeningElement.has_geometry());
        assert!(!IfcType::IfcSpace.has_geometry());
        assert!(has_geometry_by_name("IFCSLAB"));
        assert!(!has_geometry_by_name("IFCPROPERTYSET"));
    }
}
