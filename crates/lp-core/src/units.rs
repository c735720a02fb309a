// lp-core/src/units.rs

use uom::si::f64::{
    Angle as UomAngle, AngularVelocity as UomAngularVelocity, Frequency as UomFrequency,
    Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
pub type AngularVelocity = UomAngularVelocity;
pub type Frequency = UomFrequency;
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn us(v: f64) -> Time {
    use uom::si::time::microsecond;
    Time::new::<microsecond>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn rad_per_s(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::radian_per_second;
    AngularVelocity::new::<radian_per_second>(v)
}

/// Log timestamps are integer microseconds; analysis runs in seconds.
#[inline]
pub fn micros_to_seconds(v: f64) -> f64 {
    use uom::si::time::second;
    us(v).get::<second>()
}

#[inline]
pub fn seconds_to_micros(v: f64) -> f64 {
    use uom::si::time::microsecond;
    s(v).get::<microsecond>()
}

#[inline]
pub fn radians_to_degrees(v: f64) -> f64 {
    use uom::si::angle::degree;
    rad(v).get::<degree>()
}

#[inline]
pub fn degrees_to_radians(v: f64) -> f64 {
    use uom::si::angle::radian;
    deg(v).get::<radian>()
}

/// Cyclic frequency (Hz) to angular frequency (rad/s).
#[inline]
pub fn hz_to_rad_per_s(f: Frequency) -> AngularVelocity {
    use uom::si::frequency::hertz;
    rad_per_s(core::f64::consts::TAU * f.get::<hertz>())
}

/// Angular frequency (rad/s) to cyclic frequency (Hz).
#[inline]
pub fn rad_per_s_to_hz(w: AngularVelocity) -> Frequency {
    use uom::si::angular_velocity::radian_per_second;
    hz(w.get::<radian_per_second>() / core::f64::consts::TAU)
}
