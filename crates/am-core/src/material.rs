//! Material definitions: scalar parameters plus two lookup tables.
//!
//! A material on disk is three files: a JSON parameter file with camelCase
//! keys, a thermal properties CSV and a characteristic width CSV.

use crate::numeric::ensure_finite;
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Names of materials shipped with the service. User materials may not reuse them.
pub const RESERVED_MATERIAL_NAMES: [&str; 8] = [
    "17-4PH", "316L", "Al357", "AlSi10Mg", "CoCr", "IN625", "IN718", "Ti64",
];

/// One row of the characteristic width lookup table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicWidthDataPoint {
    laser_power: f64,
    scan_speed: f64,
    characteristic_width: f64,
}

impl CharacteristicWidthDataPoint {
    pub fn new(laser_power: f64, scan_speed: f64, characteristic_width: f64) -> CoreResult<Self> {
        let mut point = Self::default();
        point.set_laser_power(laser_power)?;
        point.set_scan_speed(scan_speed)?;
        point.set_characteristic_width(characteristic_width)?;
        Ok(point)
    }

    pub fn laser_power(&self) -> f64 {
        self.laser_power
    }

    pub fn set_laser_power(&mut self, value: f64) -> CoreResult<()> {
        self.laser_power = non_negative(value, "Power must not be negative.")?;
        Ok(())
    }

    pub fn scan_speed(&self) -> f64 {
        self.scan_speed
    }

    pub fn set_scan_speed(&mut self, value: f64) -> CoreResult<()> {
        self.scan_speed = non_negative(value, "Speed must not be negative.")?;
        Ok(())
    }

    /// Melt pool width (m) for this power and speed.
    pub fn characteristic_width(&self) -> f64 {
        self.characteristic_width
    }

    pub fn set_characteristic_width(&mut self, value: f64) -> CoreResult<()> {
        self.characteristic_width =
            non_negative(value, "Characteristic width must not be negative.")?;
        Ok(())
    }
}

/// One row of the thermal properties lookup table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalPropertiesDataPoint {
    density: f64,
    density_ratio: f64,
    pub specific_heat: f64,
    pub specific_heat_ratio: f64,
    temperature: f64,
    pub thermal_conductivity: f64,
    pub thermal_conductivity_ratio: f64,
}

impl ThermalPropertiesDataPoint {
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn set_density(&mut self, value: f64) -> CoreResult<()> {
        self.density = non_negative(value, "Density must not be negative.")?;
        Ok(())
    }

    pub fn density_ratio(&self) -> f64 {
        self.density_ratio
    }

    pub fn set_density_ratio(&mut self, value: f64) -> CoreResult<()> {
        self.density_ratio = non_negative(value, "Density ratio must not be negative.")?;
        Ok(())
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, value: f64) -> CoreResult<()> {
        self.temperature = non_negative(value, "Temperature must not be negative.")?;
        Ok(())
    }
}

fn non_negative(value: f64, message: &str) -> CoreResult<f64> {
    if value < 0.0 {
        Err(CoreError::validation(message))
    } else {
        Ok(value)
    }
}

macro_rules! material_properties {
    ($($field:ident),+ $(,)?) => {
        /// Additive material parameters. Units are SI (m, kg, s, K).
        #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct AdditiveMaterial {
            pub name: String,
            pub description: String,
            $(pub $field: f64,)+
            pub characteristic_width_data: Vec<CharacteristicWidthDataPoint>,
            pub thermal_properties_data: Vec<ThermalPropertiesDataPoint>,
        }

        impl AdditiveMaterial {
            /// Names of all scalar properties, in declaration order.
            pub const PROPERTY_NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Look up a scalar property by its snake_case name.
            pub fn property(&self, name: &str) -> Option<f64> {
                match name {
                    $(stringify!($field) => Some(self.$field),)+
                    _ => None,
                }
            }

            /// Set a scalar property by its snake_case name.
            pub fn set_property(&mut self, name: &str, value: f64) -> CoreResult<()> {
                match name {
                    $(stringify!($field) => {
                        self.$field = value;
                        Ok(())
                    })+
                    other => Err(CoreError::InvalidArg {
                        what: format!("unknown material property '{other}'"),
                    }),
                }
            }
        }
    };
}

material_properties!(
    absorptivity_maximum,
    absorptivity_minimum,
    absorptivity_powder_coefficient_a,
    absorptivity_powder_coefficient_b,
    absorptivity_solid_coefficient_a,
    absorptivity_solid_coefficient_b,
    anisotropic_strain_coefficient_parallel,
    anisotropic_strain_coefficient_perpendicular,
    anisotropic_strain_coefficient_z,
    elastic_modulus,
    hardening_factor,
    liquidus_temperature,
    material_yield_strength,
    nucleation_constant_bulk,
    nucleation_constant_interface,
    penetration_depth_maximum,
    penetration_depth_minimum,
    penetration_depth_powder_coefficient_a,
    penetration_depth_powder_coefficient_b,
    penetration_depth_solid_coefficient_a,
    penetration_depth_solid_coefficient_b,
    poisson_ratio,
    powder_packing_density,
    purging_gas_convection_coefficient,
    solid_density_at_room_temperature,
    solid_specific_heat_at_room_temperature,
    solid_thermal_conductivity_at_room_temperature,
    solidus_temperature,
    strain_scaling_factor,
    support_yield_strength_ratio,
    thermal_expansion_coefficient,
    vaporization_temperature,
);

impl AdditiveMaterial {
    /// True when nothing has been assigned, i.e. the material equals the default.
    pub fn is_unassigned(&self) -> bool {
        *self == AdditiveMaterial::default()
    }

    pub fn is_reserved_name(&self) -> bool {
        RESERVED_MATERIAL_NAMES.contains(&self.name.as_str())
    }

    /// Load a material from its parameter file and lookup tables.
    pub fn load(
        parameters_file: &Path,
        thermal_lookup_file: &Path,
        characteristic_width_lookup_file: &Path,
    ) -> CoreResult<Self> {
        let mut material = AdditiveMaterial::default();
        material.load_parameters(&fs::read_to_string(parameters_file)?)?;
        material.thermal_properties_data =
            read_thermal_properties(fs::File::open(thermal_lookup_file)?)?;
        material.characteristic_width_data =
            read_characteristic_width(fs::File::open(characteristic_width_lookup_file)?)?;
        debug!(
            name = %material.name,
            thermal_rows = material.thermal_properties_data.len(),
            cw_rows = material.characteristic_width_data.len(),
            "Loaded material"
        );
        Ok(material)
    }

    /// Apply a JSON parameter document of the form
    /// `{"name": .., "description": .., "configuration": {camelCaseKey: value}}`.
    pub fn load_parameters(&mut self, json: &str) -> CoreResult<()> {
        let doc: ParametersFile = serde_json::from_str(json)?;
        self.name = doc.name;
        self.description = doc.description;
        for (key, value) in doc.configuration {
            if key == "materialName" || key == "elasticModulusOfBase" {
                continue;
            }
            let name = camel_to_snake(&key).replace("_coeff_", "_coefficient_");
            let Some(value) = value.as_f64() else {
                warn!(key = %key, "Skipping non-numeric material parameter");
                continue;
            };
            if self.set_property(&name, value).is_err() {
                warn!(key = %key, "Ignoring unknown material parameter");
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ParametersFile {
    name: String,
    #[serde(default)]
    description: String,
    configuration: serde_json::Map<String, serde_json::Value>,
}

/// `absorptivityPowderCoeffA` -> `absorptivity_powder_coeff_a`
fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 8);
    for (i, c) in key.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn field(record: &csv::StringRecord, index: usize, what: &'static str) -> CoreResult<f64> {
    let raw = record.get(index).ok_or_else(|| CoreError::InvalidArg {
        what: format!("missing {what} column"),
    })?;
    let value = raw.parse::<f64>().map_err(|_| CoreError::InvalidArg {
        what: format!("invalid {what} value '{raw}'"),
    })?;
    ensure_finite(value, what)
}

/// Thermal properties lookup table. Columns after the header row are
/// temperature, thermal conductivity, specific heat, density,
/// thermal conductivity ratio, density ratio, specific heat ratio.
pub fn read_thermal_properties<R: Read>(reader: R) -> CoreResult<Vec<ThermalPropertiesDataPoint>> {
    let mut rdr = csv_reader(reader);
    let mut points = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut point = ThermalPropertiesDataPoint::default();
        point.set_temperature(field(&record, 0, "temperature")?)?;
        point.thermal_conductivity = field(&record, 1, "thermal_conductivity")?;
        point.specific_heat = field(&record, 2, "specific_heat")?;
        point.set_density(field(&record, 3, "density")?)?;
        point.thermal_conductivity_ratio = field(&record, 4, "thermal_conductivity_ratio")?;
        point.set_density_ratio(field(&record, 5, "density_ratio")?)?;
        point.specific_heat_ratio = field(&record, 6, "specific_heat_ratio")?;
        points.push(point);
    }
    Ok(points)
}

/// Characteristic width lookup table: scan speed, laser power, width.
pub fn read_characteristic_width<R: Read>(
    reader: R,
) -> CoreResult<Vec<CharacteristicWidthDataPoint>> {
    let mut rdr = csv_reader(reader);
    let mut points = Vec::new();
    for record in rdr.records() {
        let record = record?;
        points.push(CharacteristicWidthDataPoint::new(
            field(&record, 1, "laser_power")?,
            field(&record, 0, "scan_speed")?,
            field(&record, 2, "characteristic_width")?,
        )?);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_keys_convert() {
        assert_eq!(
            camel_to_snake("absorptivityPowderCoeffA"),
            "absorptivity_powder_coeff_a"
        );
        assert_eq!(camel_to_snake("poissonRatio"), "poisson_ratio");
    }

    #[test]
    fn load_parameters_maps_keys() {
        let json = r#"{
            "name": "MyAlloy",
            "description": "test alloy",
            "configuration": {
                "materialName": "ignored",
                "elasticModulusOfBase": 1.0,
                "absorptivityPowderCoeffA": 0.5,
                "poissonRatio": 0.3,
                "liquidusTemperature": 1600
            }
        }"#;
        let mut material = AdditiveMaterial::default();
        material.load_parameters(json).unwrap();
        assert_eq!(material.name, "MyAlloy");
        assert_eq!(material.absorptivity_powder_coefficient_a, 0.5);
        assert_eq!(material.poisson_ratio, 0.3);
        assert_eq!(material.liquidus_temperature, 1600.0);
        assert!(!material.is_unassigned());
    }

    #[test]
    fn property_lookup_by_name() {
        let mut material = AdditiveMaterial::default();
        assert_eq!(AdditiveMaterial::PROPERTY_NAMES.len(), 32);
        material.set_property("solidus_temperature", 1500.0).unwrap();
        assert_eq!(material.property("solidus_temperature"), Some(1500.0));
        assert!(material.set_property("color", 1.0).is_err());
        assert_eq!(material.property("color"), None);
    }

    #[test]
    fn thermal_table_column_order() {
        let csv = "T,k,cp,rho,k_ratio,rho_ratio,cp_ratio\n300,10,500,8000,1,0.6,1\n";
        let points = read_thermal_properties(csv.as_bytes()).unwrap();
        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_eq!(p.temperature(), 300.0);
        assert_eq!(p.thermal_conductivity, 10.0);
        assert_eq!(p.specific_heat, 500.0);
        assert_eq!(p.density(), 8000.0);
        assert_eq!(p.density_ratio(), 0.6);
    }

    #[test]
    fn characteristic_width_column_order() {
        let csv = "speed,power,width\n0.5,200,1.2e-4\n1.0,300,1.5e-4\n";
        let points = read_characteristic_width(csv.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].scan_speed(), 1.0);
        assert_eq!(points[1].laser_power(), 300.0);
        assert_eq!(points[1].characteristic_width(), 1.5e-4);
    }

    #[test]
    fn non_finite_table_values_are_rejected() {
        let csv = "speed,power,width\n0.5,NaN,1.2e-4\n";
        let err = read_characteristic_width(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CoreError::NonFinite { what: "laser_power", .. }));

        let csv = "T,k,cp,rho,k_ratio,rho_ratio,cp_ratio\n300,inf,500,8000,1,0.6,1\n";
        let err = read_thermal_properties(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CoreError::NonFinite { what: "thermal_conductivity", .. }));
    }

    #[test]
    fn negative_values_are_rejected() {
        let err = CharacteristicWidthDataPoint::new(-1.0, 1.0, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "Power must not be negative.");

        let csv = "T,k,cp,rho,k_ratio,rho_ratio,cp_ratio\n300,10,500,-1,1,0.6,1\n";
        let err = read_thermal_properties(csv.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Density must not be negative.");
    }

    #[test]
    fn default_material_is_unassigned() {
        assert!(AdditiveMaterial::default().is_unassigned());
        let named = AdditiveMaterial {
            name: "316L".into(),
            ..Default::default()
        };
        assert!(named.is_reserved_name());
    }
}
