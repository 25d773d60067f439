//! Study table schema.

use std::fmt;

/// Iteration assigned to new simulations.
pub const DEFAULT_ITERATION: i64 = 0;
/// Priority assigned to new simulations. Lower values run first.
pub const DEFAULT_PRIORITY: i64 = 1;
/// Study file format version written by this crate.
pub const FORMAT_VERSION: u32 = 3;

macro_rules! columns {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A column of the study table.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Column {
            $($variant),+
        }

        impl Column {
            /// Every column, in table order.
            pub const ALL: &'static [Column] = &[$(Column::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Column::$variant => $name),+
                }
            }

            pub fn from_name(name: &str) -> Option<Column> {
                match name {
                    $($name => Some(Column::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

columns! {
    Iteration => "Iteration",
    Priority => "Priority",
    Type => "Type",
    Id => "ID",
    Status => "Status",
    Material => "Material",
    HeaterTemperature => "Heater Temp (C)",
    LayerThickness => "Layer Thickness (m)",
    BeamDiameter => "Beam Diameter (m)",
    LaserPower => "Laser Power (W)",
    ScanSpeed => "Scan Speed (m/s)",
    PvRatio => "Laser Power/Scan Speed (J/m)",
    StartAngle => "Start Angle (degrees)",
    RotationAngle => "Rotation Angle (degrees)",
    HatchSpacing => "Hatch Spacing (m)",
    StripeWidth => "Stripe Width (m)",
    EnergyDensity => "Energy Density (J/m^3)",
    SingleBeadLength => "Single Bead Length (m)",
    BuildRate => "Build Rate (m^3/s)",
    MeltPoolWidth => "Melt Pool Width (m)",
    MeltPoolDepth => "Melt Pool Depth (m)",
    MeltPoolLength => "Melt Pool Length (m)",
    MeltPoolLengthOverWidth => "Melt Pool Length/Width",
    MeltPoolReferenceWidth => "Melt Pool Ref Width (m)",
    MeltPoolReferenceDepth => "Melt Pool Ref Depth (m)",
    MeltPoolReferenceDepthOverWidth => "Melt Pool Ref Depth/Width",
    PorositySizeX => "Porosity Size X (m)",
    PorositySizeY => "Porosity Size Y (m)",
    PorositySizeZ => "Porosity Size Z (m)",
    RelativeDensity => "Relative Density",
    MicroMinX => "Micro Min X (m)",
    MicroMinY => "Micro Min Y (m)",
    MicroMinZ => "Micro Min Z (m)",
    MicroSizeX => "Micro Size X (m)",
    MicroSizeY => "Micro Size Y (m)",
    MicroSizeZ => "Micro Size Z (m)",
    MicroSensorDim => "Micro Sensor Dim (m)",
    CoolingRate => "Cooling Rate (K/s)",
    ThermalGradient => "Thermal Gradient (K/m)",
    MicroMeltPoolWidth => "Micro Melt Pool Width (m)",
    MicroMeltPoolDepth => "Micro Melt Pool Depth (m)",
    RandomSeed => "Random Seed",
    XyAverageGrainSize => "XY Average Grain Size (microns)",
    XzAverageGrainSize => "XZ Average Grain Size (microns)",
    YzAverageGrainSize => "YZ Average Grain Size (microns)",
    ErrorMessage => "Error Message",
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column names in table order.
pub fn column_names() -> Vec<&'static str> {
    Column::ALL.iter().map(|c| c.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        assert_eq!(Column::ALL.len(), 46);
        for column in Column::ALL {
            assert_eq!(Column::from_name(column.name()), Some(*column));
        }
        assert_eq!(Column::from_name("Heater Temp (°C)"), None);
        assert_eq!(Column::HeaterTemperature.to_string(), "Heater Temp (C)");
    }
}
