// am-core/src/units.rs

use uom::si::f64::{
    Angle as UomAngle, Length as UomLength, Power as UomPower,
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
    TemperatureGradient as UomTemperatureGradient, Velocity as UomVelocity,
};
use uom::si::{ISQ, Quantity, SI};
use uom::typenum::{N1, P1, Z0};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
pub type Length = UomLength;
pub type Power = UomPower;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;
pub type Velocity = UomVelocity;
pub type TemperatureGradient = UomTemperatureGradient;
/// Temperature change per unit time (K/s). `uom` has no named quantity for it.
pub type TemperatureRate = Quantity<ISQ<Z0, Z0, N1, Z0, P1, Z0, Z0>, SI<f64>, f64>;

pub const METER_TO_MM: f64 = 1000.0;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn w(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn kelvin(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kpm(v: f64) -> TemperatureGradient {
    use uom::si::temperature_gradient::kelvin_per_meter;
    TemperatureGradient::new::<kelvin_per_meter>(v)
}

/// Cooling rates in kelvin per second.
#[inline]
pub fn kps(v: f64) -> TemperatureRate {
    TemperatureRate {
        dimension: std::marker::PhantomData,
        units: std::marker::PhantomData,
        value: v,
    }
}

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

/// Heater temperatures are entered in Celsius but the service expects kelvin.
pub fn celsius_to_kelvin(c: f64) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    degc(c).get::<kelvin>()
}

pub fn kelvin_to_celsius(k: f64) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    kelvin(k).get::<degree_celsius>()
}

pub fn degrees_to_radians(d: f64) -> f64 {
    use uom::si::angle::radian;
    deg(d).get::<radian>()
}

pub fn radians_to_degrees(r: f64) -> f64 {
    use uom::si::angle::degree;
    rad(r).get::<degree>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    #[test]
    fn constructors_smoke() {
        let _l = m(5e-5);
        let _p = w(195.0);
        let _v = mps(1.0);
        let _t = degc(80.0);
        let _a = deg(57.0);
        let _dt = s(0.1);
        let _g = kpm(1e7);
    }

    #[test]
    fn cooling_rate_is_temperature_over_time() {
        use uom::si::temperature_interval::kelvin as dk;
        let rate = kps(1e6);
        let dt = s(2e-6);
        let rise = rate * dt;
        let expected = uom::si::f64::TemperatureInterval::new::<dk>(2.0);
        assert!(nearly_equal(rise.value, expected.value, Tolerances::default()));
        assert!(nearly_equal(kpm(1e7).value, 1e7, Tolerances::default()));
    }

    #[test]
    fn temperature_conversions() {
        let tol = Tolerances::default();
        assert!(nearly_equal(celsius_to_kelvin(80.0), 353.15, tol));
        assert!(nearly_equal(kelvin_to_celsius(353.15), 80.0, tol));
    }

    #[test]
    fn angle_conversions() {
        let tol = Tolerances::default();
        assert!(nearly_equal(degrees_to_radians(180.0), std::f64::consts::PI, tol));
        assert!(nearly_equal(radians_to_degrees(std::f64::consts::FRAC_PI_2), 90.0, tol));
    }
}
